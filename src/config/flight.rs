use core::f32::consts::FRAC_PI_2;

use super::fcs::PIDs;

/// Completion tolerances and dwell times of the flight legs.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Legs {
    /// Seconds of sensor warm-up before the plan starts.
    pub warm_up: f32,
    pub takeoff_tolerance: f32,
    pub takeoff_dwell: f32,
    pub stabilize_duration: f32,
    /// Strafe speed to the right in m/s.
    pub strafe_speed: f32,
    /// Heading change at every corner, negative is yaw left.
    pub turn_delta: f32,
    pub turn_tolerance: f32,
    pub descent_rate: f32,
    pub land_altitude_tolerance: f32,
    pub land_speed_tolerance: f32,
    pub land_dwell: f32,
    pub images_per_side: u8,
}

impl Default for Legs {
    fn default() -> Self {
        Self {
            warm_up: 1.0,
            takeoff_tolerance: 0.3,
            takeoff_dwell: 1.0,
            stabilize_duration: 3.0,
            strafe_speed: 1.0,
            turn_delta: -FRAC_PI_2,
            turn_tolerance: 0.05,
            descent_rate: 0.5,
            land_altitude_tolerance: 0.15,
            land_speed_tolerance: 0.1,
            land_dwell: 0.5,
            images_per_side: 4,
        }
    }
}

/// Maximum dwell per leg before the plan gives up and lands.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Timeouts {
    pub takeoff: f32,
    pub turn: f32,
    pub land: f32,
    /// Strafe legs may take `factor` times their nominal duration plus `margin` seconds.
    pub strafe_factor: f32,
    pub strafe_margin: f32,
    /// Seconds without a valid sensor sample before descending blind.
    pub sensor: f32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            takeoff: 60.0,
            turn: 30.0,
            land: 120.0,
            strafe_factor: 3.0,
            strafe_margin: 30.0,
            sensor: 2.0,
        }
    }
}

/// Outer proportional loops turning velocity and heading setpoints into attitude targets.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Guidance {
    /// Radians of tilt per m/s of velocity error.
    pub velocity_gain: f32,
    pub max_tilt: f32,
    /// Yaw rate per radian of heading error.
    pub heading_gain: f32,
    pub max_yaw_rate: f32,
    /// Velocity command per meter of position error while holding.
    pub position_gain: f32,
    /// Forward velocity command per meter of drift while strafing.
    pub drift_gain: f32,
    pub max_correction_speed: f32,
    pub hover_throttle: f32,
    /// Level throttle commanded while no sensor data is available, below hover so the
    /// airframe sinks.
    pub blind_throttle: f32,
}

impl Default for Guidance {
    fn default() -> Self {
        Self {
            velocity_gain: 0.2,
            max_tilt: 0.35,
            heading_gain: 2.0,
            max_yaw_rate: 0.5,
            position_gain: 0.5,
            drift_gain: 3.0,
            max_correction_speed: 1.0,
            hover_throttle: 0.5,
            blind_throttle: 0.45,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Gimbal {
    pub roll_rate_gain: f32,
    pub pitch_rate_gain: f32,
    /// Downward camera tilt in radians.
    pub tilt: f32,
}

impl Default for Gimbal {
    fn default() -> Self {
        Self { roll_rate_gain: -0.115, pitch_rate_gain: -0.1, tilt: 0.3 }
    }
}

/// Tuning constants of the controller. Unlike [`super::InspectionConfig`] every field has
/// a default.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightParameters {
    pub legs: Legs,
    pub timeouts: Timeouts,
    pub guidance: Guidance,
    pub gimbal: Gimbal,
    pub pids: PIDs,
}

mod test {
    #[test]
    fn test_partial_parameters() {
        use super::FlightParameters;

        let json = r#"{"legs": {"warm-up": 0.0, "takeoff-tolerance": 0.3, "takeoff-dwell": 1.0,
            "stabilize-duration": 5.0, "strafe-speed": 2.0, "turn-delta": -1.5707964,
            "turn-tolerance": 0.05, "descent-rate": 0.5, "land-altitude-tolerance": 0.15,
            "land-speed-tolerance": 0.1, "land-dwell": 0.5, "images-per-side": 4}}"#;
        let params: FlightParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.legs.stabilize_duration, 5.0);
        assert_eq!(params.legs.strafe_speed, 2.0);
        assert_eq!(params.guidance, Default::default());
        assert_eq!(params.pids, Default::default());
    }

    #[test]
    fn test_sparse_sections() {
        use pretty_assertions::assert_eq;

        use super::{FlightParameters, Guidance, Legs};

        let json = r#"{"legs": {"strafe-speed": 2.0}, "timeouts": {"sensor": 1.0},
            "pids": {"altitude": {"kp": 0.3, "ki": 0.0, "kd": 0.1, "integral-limit": 1.0,
            "output-min": -0.2, "output-max": 0.2}}}"#;
        let params: FlightParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.legs, Legs { strafe_speed: 2.0, ..Default::default() });
        assert_eq!(params.timeouts.sensor, 1.0);
        assert_eq!(params.timeouts.takeoff, 60.0);
        assert_eq!(params.guidance, Guidance::default());
        assert_eq!(params.pids.altitude.kp, 0.3);
        assert_eq!(params.pids.roll, crate::config::PIDs::default().roll);
    }
}
