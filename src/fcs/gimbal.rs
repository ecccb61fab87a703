use crate::{
    config::flight::Gimbal,
    types::{AttitudeState, GimbalCommand},
};

/// Counteracts body rates so the camera stays steady, tilted down towards the structure.
pub fn stabilize(attitude: &AttitudeState, config: &Gimbal) -> GimbalCommand {
    GimbalCommand {
        roll: config.roll_rate_gain * attitude.roll_rate,
        pitch: config.pitch_rate_gain * attitude.pitch_rate + config.tilt,
    }
}

mod test {
    #[test]
    fn test_stabilize() {
        use super::stabilize;
        use crate::types::AttitudeState;

        let config = Default::default();
        let command = stabilize(&AttitudeState::default(), &config);
        assert_eq!(command.roll, 0.0);
        assert_eq!(command.pitch, 0.3);

        let attitude = AttitudeState::default().with_rates(1.0, 1.0, 0.0);
        let command = stabilize(&attitude, &config);
        assert!((command.roll + 0.115).abs() < 1e-6);
        assert!((command.pitch - 0.2).abs() < 1e-6);
    }
}
