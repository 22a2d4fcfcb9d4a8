use rush_types::{MintCarRequest, PartSpec, PartType};
use serde::{Deserialize, Serialize};

use crate::error::{GeneratorError, GeneratorResult};

/// Body posted to the generator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wheels_type: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// What the generator returns: a car image and its part descriptors.
///
/// Build one from a response body with [`CarDescriptor::from_json`]. The
/// game's stat ceiling is a ledger setting and is checked at mint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarDescriptor {
    #[serde(rename = "carImageURI")]
    pub car_image_uri: String,
    pub parts: Vec<PartSpec>,
}

impl CarDescriptor {
    /// Parse a generator response. Malformed JSON is [`GeneratorError::Decode`];
    /// a stat that cannot be stored in a byte is [`GeneratorError::InvalidStat`].
    pub fn from_json(body: &str) -> GeneratorResult<Self> {
        let wire: WireDescriptor =
            serde_json::from_str(body).map_err(|e| GeneratorError::Decode(e.to_string()))?;
        Self::try_from(wire)
    }
}

// Stats arrive wider than `PartSpec` holds so an oversized value is reported
// as a stat error instead of a JSON type error.
#[derive(Deserialize)]
struct WireDescriptor {
    #[serde(rename = "carImageURI")]
    car_image_uri: String,
    parts: Vec<WirePart>,
}

#[derive(Deserialize)]
struct WirePart {
    #[serde(rename = "partType")]
    part_type: PartType,
    stat1: u16,
    stat2: u16,
    stat3: u16,
    #[serde(rename = "imageURI")]
    image_uri: String,
}

impl TryFrom<WireDescriptor> for CarDescriptor {
    type Error = GeneratorError;

    fn try_from(wire: WireDescriptor) -> GeneratorResult<Self> {
        let parts = wire
            .parts
            .into_iter()
            .enumerate()
            .map(|(index, part)| {
                let narrow = |value: u16| {
                    u8::try_from(value).map_err(|_| GeneratorError::InvalidStat { part: index, value })
                };
                let stats = [narrow(part.stat1)?, narrow(part.stat2)?, narrow(part.stat3)?];
                Ok(PartSpec::new(part.part_type, stats, part.image_uri))
            })
            .collect::<GeneratorResult<Vec<_>>>()?;
        Ok(Self {
            car_image_uri: wire.car_image_uri,
            parts,
        })
    }
}

impl From<CarDescriptor> for MintCarRequest {
    fn from(descriptor: CarDescriptor) -> Self {
        MintCarRequest {
            image_uri: descriptor.car_image_uri,
            parts: descriptor.parts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_and_skips_unset_fields() {
        let request = GenerationRequest {
            transmission_type: Some("manual".into()),
            ..GenerationRequest::new("neon drifter").style("cyberpunk")
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["prompt"], "neon drifter");
        assert_eq!(json["transmissionType"], "manual");
        assert!(json.get("wheelsType").is_none());
    }

    #[test]
    fn descriptor_accepts_numeric_and_named_part_types() {
        let body = r#"{
            "carImageURI": "ipfs://car",
            "parts": [
                {"partType": 0, "stat1": 8, "stat2": 9, "stat3": 7, "imageURI": "ipfs://e"},
                {"partType": "Transmission", "stat1": 7, "stat2": 8, "stat3": 8, "imageURI": "ipfs://t"},
                {"partType": 2, "stat1": 8, "stat2": 7, "stat3": 8, "imageURI": "ipfs://w"}
            ]
        }"#;
        let descriptor = CarDescriptor::from_json(body).unwrap();
        let request = MintCarRequest::from(descriptor);
        assert_eq!(request.image_uri, "ipfs://car");
        let types: Vec<PartType> = request.parts.iter().map(|p| p.part_type).collect();
        assert_eq!(types, vec![PartType::Engine, PartType::Transmission, PartType::Wheels]);
    }

    #[test]
    fn descriptor_rejects_unknown_part_type() {
        let body = r#"{"carImageURI": "x", "parts": [{"partType": 7, "stat1": 1, "stat2": 1, "stat3": 1, "imageURI": "y"}]}"#;
        assert!(matches!(CarDescriptor::from_json(body), Err(GeneratorError::Decode(_))));
    }

    #[test]
    fn oversized_stat_is_a_stat_error() {
        let body = r#"{"carImageURI": "x", "parts": [
            {"partType": 0, "stat1": 1, "stat2": 1, "stat3": 1, "imageURI": "e"},
            {"partType": 1, "stat1": 4, "stat2": 300, "stat3": 1, "imageURI": "t"}
        ]}"#;
        let err = CarDescriptor::from_json(body).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidStat { part: 1, value: 300 }));
    }

    #[test]
    fn stat_above_game_ceiling_still_decodes() {
        let body = r#"{"carImageURI": "x", "parts": [{"partType": 2, "stat1": 255, "stat2": 11, "stat3": 0, "imageURI": "w"}]}"#;
        let descriptor = CarDescriptor::from_json(body).unwrap();
        assert_eq!(descriptor.parts[0].stat1, 255);
        assert_eq!(descriptor.parts[0].stat2, 11);
    }
}
