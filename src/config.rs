//! Process-wide perception settings.

use serde::{Deserialize, Serialize};

/// Tunable constants shared by the whole perception pipeline.
///
/// One instance per SceneNode; the defaults reproduce the reference
/// behavior and every integration test runs against them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionConfig {
    /// Boundary between "active" and "inactive" percepts for label matching
    pub activation_threshold: f64,

    /// Default clustering distance for spatial groups (scene fraction)
    pub max_dist: f64,

    /// Number of example scene pairs a solution is checked against
    pub scene_pair_count: usize,

    /// Surface distance at or below which two bodies touch (physics units)
    pub touch_distance: f64,

    /// Lookahead for the `moves` / `is_supported` probes (seconds)
    pub motion_probe_dt: f64,

    /// Simulated time per stability push probe (seconds)
    pub stability_probe_dt: f64,

    /// Lift duration for the `can_move_up` probe (seconds)
    pub lift_probe_dt: f64,

    /// Upward force factor (multiplied by body mass) for `can_move_up`
    pub lift_force_factor: f64,

    /// Small stock impulse, as velocity change per unit mass
    pub impulse_small: f64,

    /// Medium stock impulse, as velocity change per unit mass
    pub impulse_medium: f64,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 0.5,
            max_dist: 0.06,
            scene_pair_count: 8,
            touch_distance: 0.5,
            motion_probe_dt: 0.1,
            stability_probe_dt: 0.3,
            lift_probe_dt: 2.5,
            lift_force_factor: 12.0,
            impulse_small: 0.6,
            impulse_medium: 1.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PerceptionConfig::default();
        assert_eq!(cfg.activation_threshold, 0.5);
        assert_eq!(cfg.max_dist, 0.06);
        assert_eq!(cfg.scene_pair_count, 8);
    }
}
