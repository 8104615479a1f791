//! Puppet Wire - what peers send each other
//!
//! This crate implements the peer payloads and their framing:
//! - Points as tagged `["Point", x, y]` arrays
//! - Versioned, sequenced messages carrying skeleton diffs
//! - A length-prefixed frame around the JSON body
//!
//! The rig never does network I/O itself; transports move these frames.

pub mod codec;
pub mod message;
pub mod point;

pub use codec::*;
pub use message::*;
pub use point::*;
