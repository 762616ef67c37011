//! Runtime configuration: the §6 enumerated parameters plus the RRT and
//! exploration tuning constants, loaded from an optional TOML file and
//! falling back to defaults otherwise.

use crate::error::{SlamError, SlamResult};
use crate::planner::{ExplorationConfig, RrtConfig};
use crate::sensor::SensorConfig;
use serde::Deserialize;
use std::path::Path;

/// All tunables for one run: robot/sensor parameters, the remote host to
/// dial for a `Lego` robot, and the planner's search knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlamConfig {
    pub robot_size: f64,
    pub scanning_precision: f64,
    pub view_angle: f64,
    pub world_number: u32,
    pub limited_view: Option<f64>,
    pub save: bool,
    pub save_folder: String,
    pub host: String,
    pub port: u16,

    pub max_step: f64,
    pub min_step: f64,
    pub tilt_towards_goal: f64,
    pub tolerance: f64,
    pub angle_tolerance: f64,
    pub distance_tolerance: f64,
    pub blur_sigma: f64,
}

impl Default for SlamConfig {
    fn default() -> Self {
        Self {
            robot_size: 10.0,
            scanning_precision: 2.0,
            view_angle: 360.0,
            world_number: 1,
            limited_view: None,
            save: false,
            save_folder: "saved_maps".to_string(),
            host: "localhost".to_string(),
            port: 1025,

            max_step: 10.0,
            min_step: 1.0,
            tilt_towards_goal: 0.5,
            tolerance: 5.0,
            angle_tolerance: 3.0,
            distance_tolerance: 10.0,
            blur_sigma: 1.0,
        }
    }
}

impl SlamConfig {
    /// Loads overrides from a TOML file, falling back to `Default::default()`
    /// field-by-field for anything the file omits.
    pub fn load(path: impl AsRef<Path>) -> SlamResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| SlamError::MalformedFrame(e.to_string()))
    }

    /// The RRT planner's tuning knobs, sliced out of this config.
    pub fn rrt_config(&self) -> RrtConfig {
        RrtConfig {
            max_step: self.max_step,
            min_step: self.min_step,
            tilt_towards_goal: self.tilt_towards_goal,
            tolerance: self.tolerance,
            robot_size: self.robot_size,
        }
    }

    /// The exploration planner's tuning knobs, sliced out of this config.
    pub fn exploration_config(&self) -> ExplorationConfig {
        ExplorationConfig {
            robot_size: self.robot_size,
            distance_tolerance: self.distance_tolerance,
            angle_tolerance: self.angle_tolerance,
            blur_sigma: self.blur_sigma,
        }
    }

    /// The sensor driver's scan parameters, sliced out of this config.
    pub fn sensor_config(&self) -> SensorConfig {
        SensorConfig {
            view_angle: self.view_angle,
            precision: self.scanning_precision,
            max_distance: self.limited_view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_constants() {
        let config = SlamConfig::default();
        assert_eq!(config.robot_size, 10.0);
        assert_eq!(config.view_angle, 360.0);
        assert!(config.limited_view.is_none());
    }

    #[test]
    fn partial_toml_overrides_fall_back_to_defaults() {
        let toml_str = "robot_size = 20.0\nhost = \"192.168.1.5\"\n";
        let config: SlamConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.robot_size, 20.0);
        assert_eq!(config.host, "192.168.1.5");
        assert_eq!(config.view_angle, 360.0);
    }

    #[test]
    fn rrt_config_is_sliced_from_the_matching_fields() {
        let config = SlamConfig {
            robot_size: 12.0,
            max_step: 8.0,
            min_step: 2.0,
            tilt_towards_goal: 0.7,
            tolerance: 3.0,
            ..SlamConfig::default()
        };
        let rrt = config.rrt_config();
        assert_eq!(rrt.robot_size, 12.0);
        assert_eq!(rrt.max_step, 8.0);
        assert_eq!(rrt.min_step, 2.0);
        assert_eq!(rrt.tilt_towards_goal, 0.7);
        assert_eq!(rrt.tolerance, 3.0);
    }

    #[test]
    fn exploration_config_carries_the_configured_blur_sigma() {
        let config = SlamConfig {
            blur_sigma: 2.5,
            distance_tolerance: 15.0,
            ..SlamConfig::default()
        };
        let exploration = config.exploration_config();
        assert_eq!(exploration.blur_sigma, 2.5);
        assert_eq!(exploration.distance_tolerance, 15.0);
    }

    #[test]
    fn sensor_config_maps_limited_view_to_max_distance() {
        let config = SlamConfig {
            view_angle: 180.0,
            scanning_precision: 1.5,
            limited_view: Some(50.0),
            ..SlamConfig::default()
        };
        let sensor = config.sensor_config();
        assert_eq!(sensor.view_angle, 180.0);
        assert_eq!(sensor.precision, 1.5);
        assert_eq!(sensor.max_distance, Some(50.0));
    }
}
