use crate::{
    config::flight::Guidance as Config,
    types::{
        measurement::{decompose, wrap},
        AttitudeTarget, SensorSample, Setpoint,
    },
};

/// Converts flight plan setpoints into targets for the stabilized axes.
pub struct Guidance {
    config: Config,
}

impl Guidance {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn attitude_target(&self, setpoint: &Setpoint, sample: &SensorSample) -> AttitudeTarget {
        let Config { velocity_gain, max_tilt, heading_gain, max_yaw_rate, .. } = self.config;
        let yaw = sample.attitude.yaw;
        let (forward, right) = decompose(sample.kinematics.velocity.xy(), yaw);

        let roll = velocity_gain * (setpoint.right_speed - right);
        // Nose up brakes forward motion
        let pitch = -velocity_gain * (setpoint.forward_speed - forward);
        let yaw_rate = heading_gain * wrap(setpoint.heading - yaw);
        AttitudeTarget {
            roll: roll.clamp(-max_tilt, max_tilt),
            pitch: pitch.clamp(-max_tilt, max_tilt),
            yaw_rate: yaw_rate.clamp(-max_yaw_rate, max_yaw_rate),
            altitude: setpoint.altitude,
        }
    }
}

mod test {
    #[test]
    fn test_attitude_target() {
        use core::f32::consts::FRAC_PI_2;

        use nalgebra::Vector3;

        use super::Guidance;
        use crate::types::{AttitudeState, KinematicState, SensorSample, Setpoint};

        let guidance = Guidance::new(Default::default());

        // Facing east at rest, asked to move right (south)
        let attitude = AttitudeState::new(0.0, 0.0, FRAC_PI_2);
        let sample = SensorSample::new(attitude, KinematicState::default());
        let setpoint = Setpoint { right_speed: 1.0, ..Setpoint::hover(4.0, FRAC_PI_2) };
        let target = guidance.attitude_target(&setpoint, &sample);
        assert!((target.roll - 0.2).abs() < 1e-6);
        assert!(target.pitch.abs() < 1e-6);
        assert!(target.yaw_rate.abs() < 1e-6);
        assert_eq!(target.altitude, 4.0);

        // Drifting forward (east) brakes with nose up
        let velocity = Vector3::new(0.0, 1.0, 0.0);
        let kinematics = KinematicState::new(Vector3::zeros(), velocity);
        let sample = SensorSample::new(attitude, kinematics);
        let target = guidance.attitude_target(&Setpoint::hover(4.0, FRAC_PI_2), &sample);
        assert!((target.pitch - 0.2).abs() < 1e-6);
        assert!(target.roll.abs() < 1e-6);
    }

    #[test]
    fn test_yaw_rate_limit() {
        use core::f32::consts::PI;

        use super::Guidance;
        use crate::types::{AttitudeState, SensorSample, Setpoint};

        let guidance = Guidance::new(Default::default());
        let sample = SensorSample::new(AttitudeState::new(0.0, 0.0, 0.0), Default::default());
        let target = guidance.attitude_target(&Setpoint::hover(0.0, -PI / 2.0), &sample);
        assert_eq!(target.yaw_rate, -0.5);
        let target = guidance.attitude_target(&Setpoint::hover(0.0, 0.1), &sample);
        assert!((target.yaw_rate - 0.2).abs() < 1e-6);
    }
}
