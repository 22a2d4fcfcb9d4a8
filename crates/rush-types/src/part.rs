use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Number of slots on every car: one per [`PartType`].
pub const SLOT_COUNT: usize = 3;

/// The kind of a part. Each kind owns exactly one car slot.
///
/// Deserializes from either the variant name (`"Engine"`) or the slot index
/// (`0`), since the off-chain generator emits numeric part types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PartTypeRepr")]
pub enum PartType {
    Engine,
    Transmission,
    Wheels,
}

impl PartType {
    /// All part types in slot order.
    pub const ALL: [PartType; SLOT_COUNT] =
        [PartType::Engine, PartType::Transmission, PartType::Wheels];

    /// The slot this part type occupies on a car.
    pub fn slot_index(self) -> usize {
        match self {
            Self::Engine => 0,
            Self::Transmission => 1,
            Self::Wheels => 2,
        }
    }

    /// The part type bound to a slot index.
    pub fn from_slot(slot: usize) -> Result<Self, TypeError> {
        Self::ALL.get(slot).copied().ok_or(TypeError::InvalidSlot(slot))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Engine => "Engine",
            Self::Transmission => "Transmission",
            Self::Wheels => "Wheels",
        }
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PartType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "engine" => Ok(Self::Engine),
            "transmission" => Ok(Self::Transmission),
            "wheels" => Ok(Self::Wheels),
            other => other
                .parse::<usize>()
                .ok()
                .and_then(|slot| Self::from_slot(slot).ok())
                .ok_or_else(|| TypeError::UnknownPartType(s.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PartTypeRepr {
    Index(u64),
    Name(String),
}

impl TryFrom<PartTypeRepr> for PartType {
    type Error = TypeError;

    fn try_from(repr: PartTypeRepr) -> Result<Self, Self::Error> {
        match repr {
            PartTypeRepr::Index(index) => usize::try_from(index)
                .ok()
                .and_then(|slot| Self::from_slot(slot).ok())
                .ok_or_else(|| TypeError::UnknownPartType(index.to_string())),
            PartTypeRepr::Name(name) => name.parse(),
        }
    }
}

/// Parameters for minting a single part.
///
/// The three stats are type-scoped: their meaning depends on `part_type`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSpec {
    #[serde(rename = "partType", alias = "part_type")]
    pub part_type: PartType,
    pub stat1: u8,
    pub stat2: u8,
    pub stat3: u8,
    #[serde(rename = "imageURI", alias = "imageUri", alias = "image_uri")]
    pub image_uri: String,
}

impl PartSpec {
    pub fn new(part_type: PartType, stats: [u8; 3], image_uri: impl Into<String>) -> Self {
        Self {
            part_type,
            stat1: stats[0],
            stat2: stats[1],
            stat3: stats[2],
            image_uri: image_uri.into(),
        }
    }

    pub fn stats(&self) -> [u8; 3] {
        [self.stat1, self.stat2, self.stat3]
    }
}

/// Input of a car mint: the car image plus one spec per part type, in any order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintCarRequest {
    #[serde(rename = "carImageURI", alias = "imageURI", alias = "image_uri")]
    pub image_uri: String,
    pub parts: Vec<PartSpec>,
}
