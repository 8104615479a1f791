//! Puppet Skin - binds a vector illustration to a skeleton
//!
//! Every anchor and handle of every drawable path is weighted against the
//! bones near it once, at bind time. Each frame, the points are rebuilt by
//! linear blend skinning: every influencing bone proposes a position from its
//! own motion and the proposals are mixed by the bind-time weights.
//!
//! # Bind
//!
//! - Keypoint rest positions come from the asset's `skeleton` group
//! - Paths under `illustration` bind to their nearest bone group
//! - Paths under an `aux` sub-group bind to that group's secondary bones
//! - Collinear handle pairs reuse their anchor's weights

pub mod asset;
pub mod config;
pub mod illustration;
pub mod path;
pub mod skinning;

pub use asset::*;
pub use config::*;
pub use illustration::*;
pub use path::*;
pub use skinning::*;
