use crate::types::{Axes, MotorCommand};

// roll, pitch, yaw per motor; front-left and rear-right spin counter-clockwise
const SIGNS: [[f32; 3]; 4] = [
    [1.0, 1.0, 1.0],   // front left
    [-1.0, 1.0, -1.0], // front right
    [1.0, -1.0, -1.0], // rear left
    [-1.0, -1.0, 1.0], // rear right
];

/// X-configuration quadrotor mixer. Positive roll banks right, positive pitch raises the
/// nose and positive yaw turns clockwise. Every motor is clamped to [0, 1].
pub fn mix(roll: f32, pitch: f32, yaw: f32, throttle: f32) -> MotorCommand {
    let mut motors = [0.0; 4];
    for (motor, &[r, p, y]) in motors.iter_mut().zip(SIGNS.iter()) {
        let value = throttle + r * roll + p * pitch + y * yaw;
        *motor = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    }
    MotorCommand(motors)
}

pub fn mix_axes(axes: &Axes) -> MotorCommand {
    mix(axes.roll, axes.pitch, axes.yaw, axes.throttle)
}

mod test {
    #[test]
    fn test_mix_hover() {
        use pretty_assertions::assert_eq;

        use super::mix;
        use crate::types::MotorCommand;

        for &throttle in [0.0, 0.25, 0.5, 1.0].iter() {
            assert_eq!(mix(0.0, 0.0, 0.0, throttle), MotorCommand([throttle; 4]));
        }
    }

    #[test]
    fn test_mix_axes() {
        use pretty_assertions::assert_eq;

        use super::mix;
        use crate::types::MotorCommand;

        assert_eq!(mix(0.1, 0.0, 0.0, 0.5), MotorCommand([0.6, 0.4, 0.6, 0.4]));
        assert_eq!(mix(0.0, 0.1, 0.0, 0.5), MotorCommand([0.6, 0.6, 0.4, 0.4]));
        assert_eq!(mix(0.0, 0.0, 0.1, 0.5), MotorCommand([0.6, 0.4, 0.4, 0.6]));
        // Yaw does not change total thrust
        assert!((mix(0.0, 0.0, 0.05, 0.5).total() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_mix_clamp() {
        use pretty_assertions::assert_eq;

        use super::mix;
        use crate::types::MotorCommand;

        assert_eq!(mix(0.5, 0.5, 0.0, 0.9), MotorCommand([1.0, 0.9, 0.9, 0.0]));
        assert_eq!(mix(0.0, 0.0, 0.0, 2.0), MotorCommand([1.0; 4]));
        assert_eq!(mix(f32::NAN, 0.0, 0.0, 0.5), MotorCommand([0.0; 4]));
    }

    #[test]
    fn test_mix_deterministic() {
        use super::mix;

        let first = mix(0.03, -0.07, 0.01, 0.55);
        for _ in 0..10 {
            assert_eq!(mix(0.03, -0.07, 0.01, 0.55), first);
        }
    }
}
