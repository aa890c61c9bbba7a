//! Tracker tuning, all plain data.

use serde::{Deserialize, Serialize};

use crate::{
    associate::MatchingStrategy,
    counting::CountingPolicy,
    direction::CountingDirection,
    error::{Error, Result},
};

/// TTL granted for each movement-consistency tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlTiers {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

/// How a track's motion feeds its consistency score and TTL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Fraction of the remaining gap to 1.0 gained on expected movement.
    pub consistency_rate_up: f32,
    /// Flat amount lost on unexpected movement.
    pub consistency_rate_down: f32,
    /// Largest sideways displacement still counted as expected movement.
    pub perpendicular_tolerance: f32,
    pub initial_consistency: f32,
    pub high_consistency: f32,
    pub medium_consistency: f32,
    /// Expected-movement frames needed before the high tier applies.
    pub high_min_frames: u32,
    pub update_ttl: TtlTiers,
    /// Tiers for tracks revived from `Lost`, shorter than `update_ttl`.
    pub reactivate_ttl: TtlTiers,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            consistency_rate_up: 0.1,
            consistency_rate_down: 0.2,
            perpendicular_tolerance: 0.05,
            initial_consistency: 0.5,
            high_consistency: 0.7,
            medium_consistency: 0.4,
            high_min_frames: 5,
            update_ttl: TtlTiers {
                high: 30,
                medium: 15,
                low: 5,
            },
            reactivate_ttl: TtlTiers {
                high: 20,
                medium: 10,
                low: 3,
            },
        }
    }
}

impl MotionTuning {
    pub fn ttl_for(&self, tiers: &TtlTiers, consistency: f32, expected_frames: u32) -> u32 {
        if consistency > self.high_consistency && expected_frames > self.high_min_frames {
            tiers.high
        } else if consistency > self.medium_consistency {
            tiers.medium
        } else {
            tiers.low
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub direction: CountingDirection,
    /// Normalized positions of the two counting lines along the direction's axis.
    pub thresholds: [f32; 2],
    pub policy: CountingPolicy,
    /// Euclidean gate between a track position and a detection centroid.
    pub max_distance: f32,
    pub matching: MatchingStrategy,
    /// Only match detections to tracks of the same class.
    pub match_class: bool,
    pub min_detection_score: f32,
    /// Frames a lost track is kept for possible reactivation.
    pub max_lost_frames: u32,
    /// Minimum movement consistency for a crossing to be counted. A crossing
    /// made below it is held until a later update reaches it.
    pub min_count_consistency: f32,
    pub motion: MotionTuning,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            direction: CountingDirection::default(),
            thresholds: [0.3, 0.7],
            policy: CountingPolicy::default(),
            max_distance: 0.1,
            matching: MatchingStrategy::default(),
            match_class: false,
            min_detection_score: 0.0,
            max_lost_frames: 30,
            min_count_consistency: 0.0,
            motion: MotionTuning::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_distance > 0.0) {
            return Err(invalid(format!(
                "max_distance must be positive, got {}",
                self.max_distance
            )));
        }
        if let Some(threshold) = self
            .thresholds
            .iter()
            .find(|t| !(0.0..=1.0).contains(*t))
        {
            return Err(invalid(format!(
                "thresholds must lie in [0, 1], got {threshold}"
            )));
        }
        if !(0.0..=1.0).contains(&self.min_count_consistency) {
            return Err(invalid(
                "min_count_consistency must lie in [0, 1]".to_string(),
            ));
        }
        self.motion.validate()
    }
}

impl MotionTuning {
    fn validate(&self) -> Result<()> {
        let rates = [self.consistency_rate_up, self.consistency_rate_down];
        if rates.iter().any(|rate| !(*rate > 0.0 && *rate < 1.0)) {
            return Err(invalid(
                "consistency rates must lie in (0, 1)".to_string(),
            ));
        }
        if self.consistency_rate_down <= self.consistency_rate_up {
            return Err(invalid(
                "consistency_rate_down must exceed consistency_rate_up".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_consistency) {
            return Err(invalid(
                "initial_consistency must lie in [0, 1]".to_string(),
            ));
        }
        if self.medium_consistency > self.high_consistency {
            return Err(invalid(
                "medium_consistency must not exceed high_consistency".to_string(),
            ));
        }
        for (name, tiers) in [
            ("update_ttl", &self.update_ttl),
            ("reactivate_ttl", &self.reactivate_ttl),
        ] {
            if tiers.low == 0 || tiers.medium < tiers.low || tiers.high < tiers.medium {
                return Err(invalid(format!(
                    "{name} must be non-zero and ordered low <= medium <= high"
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(TrackerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_non_positive_gate_is_rejected() {
        let config = TrackerConfig {
            max_distance: 0.0,
            ..TrackerConfig::default()
        };

        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_threshold_outside_unit_range_is_rejected() {
        let config = TrackerConfig {
            thresholds: [0.2, 1.5],
            ..TrackerConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_symmetric_consistency_rates_are_rejected() {
        let mut config = TrackerConfig::default();
        config.motion.consistency_rate_down = config.motion.consistency_rate_up;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ttl_tiers() {
        let tuning = MotionTuning::default();
        let tiers = tuning.update_ttl;

        assert_eq!(tuning.ttl_for(&tiers, 0.8, 6), 30);
        assert_eq!(tuning.ttl_for(&tiers, 0.8, 5), 15);
        assert_eq!(tuning.ttl_for(&tiers, 0.5, 100), 15);
        assert_eq!(tuning.ttl_for(&tiers, 0.4, 100), 5);
        assert_eq!(tuning.ttl_for(&tuning.reactivate_ttl, 0.9, 10), 20);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: TrackerConfig = serde_json::from_str(
            r#"{ "direction": "LeftToRight", "thresholds": [0.4, 0.6], "policy": "AnyLine" }"#,
        )
        .unwrap();

        assert_eq!(config.direction, CountingDirection::LeftToRight);
        assert_eq!(config.policy, CountingPolicy::AnyLine);
        assert_eq!(config.max_distance, 0.1);
        assert_eq!(config.motion, MotionTuning::default());
    }
}
