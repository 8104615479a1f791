//! Diagnostic colors

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// RGB color, used only for bone diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Deterministic color for a name (first three bytes of its SHA-256)
    pub fn from_name(name: &str) -> Self {
        let hash = Sha256::digest(name.as_bytes());
        Color::new(hash[0], hash[1], hash[2])
    }

    /// `#rrggbb` form
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
