use core::f32::consts::PI;

pub const DEGREE_PER_RAD: f32 = 180.0 / PI;

/// Wraps an angle into [-π, π].
pub fn wrap(angle: f32) -> f32 {
    let mut angle = angle % (2.0 * PI);
    if angle > PI {
        angle -= 2.0 * PI;
    } else if angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Attitude in radians and body rates in radians per second.
///
/// Yaw is measured clockwise from north, so a left turn decreases it.
#[derive(Default, Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttitudeState {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll_rate: f32,
    pub pitch_rate: f32,
    pub yaw_rate: f32,
}

impl AttitudeState {
    pub fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw, ..Default::default() }
    }

    pub fn with_rates(mut self, roll_rate: f32, pitch_rate: f32, yaw_rate: f32) -> Self {
        self.roll_rate = roll_rate;
        self.pitch_rate = pitch_rate;
        self.yaw_rate = yaw_rate;
        self
    }

    pub fn is_finite(&self) -> bool {
        [self.roll, self.pitch, self.yaw, self.roll_rate, self.pitch_rate, self.yaw_rate]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn heading_error(&self, heading: f32) -> f32 {
        wrap(heading - self.yaw)
    }
}

mod test {
    #[test]
    fn test_wrap() {
        use core::f32::consts::PI;

        use super::wrap;

        assert!((wrap(0.5) - 0.5).abs() < 1e-6);
        assert!((wrap(PI + 0.5) - (-PI + 0.5)).abs() < 1e-5);
        assert!((wrap(-PI - 0.5) - (PI - 0.5)).abs() < 1e-5);
        assert!((wrap(3.5 * PI) + PI / 2.0).abs() < 1e-4);
        assert!(wrap(-2.0 * PI).abs() < 1e-5);
    }

    #[test]
    fn test_heading_error() {
        use core::f32::consts::PI;

        use super::{AttitudeState, DEGREE_PER_RAD};

        let attitude = AttitudeState::new(0.0, 0.0, 170.0 / DEGREE_PER_RAD);
        // Shortest way from 170° to -170° is 20° clockwise
        let error = attitude.heading_error(-170.0 / DEGREE_PER_RAD) * DEGREE_PER_RAD;
        assert!((error - 20.0).abs() < 1e-3);

        let attitude = AttitudeState::new(0.0, 0.0, PI / 2.0);
        assert!((attitude.heading_error(-PI / 2.0).abs() - PI).abs() < 1e-5);
    }
}
