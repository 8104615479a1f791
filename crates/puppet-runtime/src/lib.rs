//! Puppet Runtime - frame driver and peer puppets
//!
//! Each frame runs one cycle:
//! 1. Estimate pose
//! 2. Estimate face
//! 3. Keep the top-ranked estimates
//! 4. Undo the camera mirror
//! 5. Update skeleton and skin
//! 6. Publish the skeleton diff to peers
//!
//! A frame that fails any stage is frozen: the last rendered frame stays
//! on screen and peers are told once.

pub mod config;
pub mod driver;
pub mod logging;
pub mod oracle;
pub mod remote;
pub mod session;

pub use config::*;
pub use driver::*;
pub use logging::*;
pub use oracle::*;
pub use remote::*;
pub use session::*;
