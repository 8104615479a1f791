//! Puppet Test Harness - fixtures and peer link simulation
//!
//! This crate provides:
//! - A complete character asset bound to the reference figure
//! - Scripted pose sequences as a mirrored camera reports them
//! - A lossy, reordering peer link for the wire protocol
//!
//! Integration and property tests live in `tests/`, benchmarks in `benches/`.

pub mod fixtures;
pub mod link;

pub use fixtures::*;
pub use link::*;
