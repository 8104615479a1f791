//! Error types for the puppet rig

use thiserror::Error;

/// Core puppet errors
#[derive(Error, Debug)]
pub enum PuppetError {
    // Bind errors
    #[error("Bone {bone} is missing keypoint {part}")]
    MissingKeypoint { bone: String, part: String },

    #[error("Unknown bone: {0}")]
    UnknownBone(String),

    #[error("Duplicate bone: {0}")]
    DuplicateBone(String),

    // Asset errors
    #[error("Asset has no group named with prefix '{0}'")]
    MissingGroup(String),

    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    // Wire errors
    #[error("Invalid wire format: {0}")]
    InvalidWireFormat(String),

    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("JSON error: {0}")]
    Json(String),

    // Oracle errors
    #[error("Estimator failed: {0}")]
    Oracle(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for puppet operations
pub type PuppetResult<T> = Result<T, PuppetError>;
