//! Puppet Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout the puppet rig:
//! - 2D geometry (Vec2, segment projection, local frames, collinearity)
//! - Keypoint name tables for the pose and face estimators
//! - Estimator output types (pose and face estimates)
//! - Diagnostic colors and the shared error type

pub mod color;
pub mod error;
pub mod estimate;
pub mod geometry;
pub mod parts;

pub use color::*;
pub use error::*;
pub use estimate::*;
pub use geometry::*;
pub use parts::*;
