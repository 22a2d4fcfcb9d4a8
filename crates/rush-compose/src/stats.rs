use rush_parts::Part;
use rush_types::{PartType, SLOT_COUNT};
use serde::{Deserialize, Serialize};

/// Aggregated driving stats of a car, derived from its equipped parts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedStats {
    pub speed: u16,
    pub acceleration: u16,
    pub handling: u16,
    pub drift_factor: u16,
    pub turn_factor: u16,
    pub max_speed: u16,
}

/// Read-only stat view of a car, as served to the game client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactCarStats {
    #[serde(rename = "imageURI")]
    pub image_uri: String,
    #[serde(flatten)]
    pub stats: CombinedStats,
    pub condition: u8,
}

impl CombinedStats {
    /// Sum each part's contributions according to its type.
    ///
    /// Engine and transmission stats map to speed, max speed and
    /// acceleration; wheel stats map to handling, drift and turn. An empty
    /// slot contributes nothing.
    pub fn nominal(slots: [Option<&Part>; SLOT_COUNT]) -> Self {
        let mut stats = Self::default();
        for part in slots.into_iter().flatten() {
            let [s1, s2, s3] = part.stats().map(u16::from);
            match part.part_type {
                PartType::Engine | PartType::Transmission => {
                    stats.speed += s1;
                    stats.max_speed += s2;
                    stats.acceleration += s3;
                }
                PartType::Wheels => {
                    stats.handling += s1;
                    stats.drift_factor += s2;
                    stats.turn_factor += s3;
                }
            }
        }
        stats
    }

    /// Scale every stat by `condition / max_condition`, rounding down.
    pub fn scaled(self, condition: u8, max_condition: u8) -> Self {
        if max_condition == 0 {
            return Self::default();
        }
        let condition = condition.min(max_condition);
        let scale = |value: u16| -> u16 {
            let scaled = u32::from(value) * u32::from(condition) / u32::from(max_condition);
            // condition <= max_condition, so the result never exceeds `value`.
            scaled as u16
        };
        Self {
            speed: scale(self.speed),
            acceleration: scale(self.acceleration),
            handling: scale(self.handling),
            drift_factor: scale(self.drift_factor),
            turn_factor: scale(self.turn_factor),
            max_speed: scale(self.max_speed),
        }
    }

    /// Nominal stats scaled by the car's condition.
    pub fn compute(slots: [Option<&Part>; SLOT_COUNT], condition: u8, max_condition: u8) -> Self {
        Self::nominal(slots).scaled(condition, max_condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rush_types::{AccountId, PartId};

    fn part(id: u64, part_type: PartType, stats: [u8; 3]) -> Part {
        Part {
            id: PartId(id),
            owner: AccountId::from_label("alice"),
            part_type,
            stat1: stats[0],
            stat2: stats[1],
            stat3: stats[2],
            image_uri: String::new(),
            equipped_to: None,
        }
    }

    #[test]
    fn full_car_sums_by_type() {
        let engine = part(1, PartType::Engine, [8, 9, 7]);
        let transmission = part(2, PartType::Transmission, [7, 8, 8]);
        let wheels = part(3, PartType::Wheels, [8, 7, 8]);

        let stats = CombinedStats::nominal([Some(&engine), Some(&transmission), Some(&wheels)]);
        assert_eq!(
            stats,
            CombinedStats {
                speed: 15,
                acceleration: 15,
                handling: 8,
                drift_factor: 7,
                turn_factor: 8,
                max_speed: 17,
            }
        );
    }

    #[test]
    fn empty_slots_contribute_zero() {
        let wheels = part(3, PartType::Wheels, [8, 7, 8]);
        let stats = CombinedStats::nominal([None, None, Some(&wheels)]);
        assert_eq!(stats.speed, 0);
        assert_eq!(stats.max_speed, 0);
        assert_eq!(stats.handling, 8);
        assert_eq!(CombinedStats::nominal([None, None, None]), CombinedStats::default());
    }

    #[test]
    fn condition_scales_down_with_floor() {
        let engine = part(1, PartType::Engine, [9, 9, 9]);
        let stats = CombinedStats::compute([Some(&engine), None, None], 50, 100);
        assert_eq!(stats.speed, 4);
        assert_eq!(stats.max_speed, 4);

        let pristine = CombinedStats::compute([Some(&engine), None, None], 100, 100);
        assert_eq!(pristine.speed, 9);

        let wrecked = CombinedStats::compute([Some(&engine), None, None], 0, 100);
        assert_eq!(wrecked, CombinedStats::default());
    }

    #[test]
    fn compact_stats_use_client_field_names() {
        let compact = CompactCarStats {
            image_uri: "ipfs://car".into(),
            stats: CombinedStats {
                drift_factor: 3,
                ..CombinedStats::default()
            },
            condition: 90,
        };
        let json = serde_json::to_value(&compact).unwrap();
        assert_eq!(json["imageURI"], "ipfs://car");
        assert_eq!(json["driftFactor"], 3);
        assert_eq!(json["condition"], 90);
    }
}
