//! Points on the wire
//!
//! Peers have historically sent points as a tagged 3-element array
//! `["Point", x, y]`. That is what we write. On read we also accept a bare
//! `[x, y]` pair and an `{ "x": .., "y": .. }` object.

use puppet_core::Vec2;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Type tag of the array form
pub const POINT_TAG: &str = "Point";

/// A [`Vec2`] with the peer array encoding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WirePoint(pub Vec2);

impl From<Vec2> for WirePoint {
    fn from(v: Vec2) -> Self {
        WirePoint(v)
    }
}

impl From<WirePoint> for Vec2 {
    fn from(p: WirePoint) -> Self {
        p.0
    }
}

impl Serialize for WirePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (POINT_TAG, self.0.x, self.0.y).serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Tagged(String, f64, f64),
    Pair(f64, f64),
    Object { x: f64, y: f64 },
}

impl<'de> Deserialize<'de> for WirePoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (x, y) = match PointRepr::deserialize(deserializer)? {
            PointRepr::Tagged(tag, x, y) if tag == POINT_TAG => (x, y),
            PointRepr::Tagged(tag, _, _) => {
                return Err(D::Error::custom(format!("unknown point tag {tag:?}")));
            }
            PointRepr::Pair(x, y) => (x, y),
            PointRepr::Object { x, y } => (x, y),
        };
        Ok(WirePoint(Vec2::new(x, y)))
    }
}
