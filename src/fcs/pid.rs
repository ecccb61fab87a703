use crate::{
    config::fcs::{PID, PIDs},
    types::{AttitudeTarget, Axes, SensorSample},
};

/// Classic PID loop with a clamped integral accumulator and clamped output.
///
/// A non-positive or non-finite `dt`, or a non-finite error, leaves the controller untouched
/// and returns the previous output.
#[derive(Copy, Clone, Debug)]
pub struct PIDController {
    config: PID,
    integral: f32,
    previous_error: Option<f32>,
    output: f32,
}

impl PIDController {
    pub fn new(config: PID) -> Self {
        Self { config, integral: 0.0, previous_error: None, output: 0.0 }
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn update(&mut self, setpoint: f32, measured: f32, dt: f32) -> f32 {
        let error = setpoint - measured;
        if !(dt > 0.0) || !dt.is_finite() || !error.is_finite() {
            return self.output;
        }

        let PID { kp, ki, kd, integral_limit, output_min, output_max } = self.config;
        let integral = (self.integral + error * dt).clamp(-integral_limit, integral_limit);
        let derivative = match self.previous_error {
            Some(previous) => (error - previous) / dt,
            None => 0.0,
        };
        let output = kp * error + ki * integral + kd * derivative;
        if !output.is_finite() {
            return self.output;
        }

        self.integral = integral;
        self.previous_error = Some(error);
        self.output = output.clamp(output_min, output_max);
        self.output
    }
}

/// Four independent loops: roll angle, pitch angle, yaw rate and altitude.
pub struct Stabilizer {
    roll: PIDController,
    pitch: PIDController,
    yaw_rate: PIDController,
    altitude: PIDController,
    hover_throttle: f32,
}

impl Stabilizer {
    pub fn new(config: &PIDs, hover_throttle: f32) -> Self {
        Self {
            roll: PIDController::new(config.roll),
            pitch: PIDController::new(config.pitch),
            yaw_rate: PIDController::new(config.yaw_rate),
            altitude: PIDController::new(config.altitude),
            hover_throttle,
        }
    }

    pub fn update(&mut self, target: &AttitudeTarget, sample: &SensorSample, dt: f32) -> Axes {
        let attitude = &sample.attitude;
        let altitude = sample.kinematics.altitude();
        let roll = self.roll.update(target.roll, attitude.roll, dt);
        let pitch = self.pitch.update(target.pitch, attitude.pitch, dt);
        let yaw = self.yaw_rate.update(target.yaw_rate, attitude.yaw_rate, dt);
        let throttle = self.hover_throttle + self.altitude.update(target.altitude, altitude, dt);
        trace!("Axes roll {:.3} pitch {:.3} yaw {:.3} throttle {:.3}", roll, pitch, yaw, throttle);
        Axes { throttle, roll, pitch, yaw }
    }

    pub fn integrals(&self) -> [f32; 4] {
        [
            self.roll.integral(),
            self.pitch.integral(),
            self.yaw_rate.integral(),
            self.altitude.integral(),
        ]
    }
}

mod test {
    #[test]
    fn test_proportional() {
        use super::PIDController;
        use crate::config::PID;

        let mut pid = PIDController::new(PID::new(0.5, 0.0, 0.0));
        assert_eq!(pid.update(1.0, 0.0, 0.01), 0.5);
        assert_eq!(pid.update(1.0, 3.0, 0.01), -1.0);
        assert_eq!(pid.update(-10.0, 0.0, 0.01), -1.0);
    }

    #[test]
    fn test_integral_windup() {
        use super::PIDController;
        use crate::config::PID;

        let pids = crate::config::PIDs::default();
        for config in [pids.roll, pids.pitch, pids.yaw_rate, pids.altitude] {
            let mut pid = PIDController::new(config);
            let mut measured = -100.0;
            for _ in 0..100_000 {
                pid.update(10.0, measured, 0.01);
                measured += (10.0 - measured) * 0.0001;
                assert!(pid.integral().abs() <= config.integral_limit);
            }
        }

        let mut pid = PIDController::new(PID::new(0.0, 1.0, 0.0).integral_limit(0.25));
        for _ in 0..1000 {
            pid.update(1.0, 0.0, 0.1);
        }
        assert_eq!(pid.integral(), 0.25);
        // Unwinds immediately once the error flips
        pid.update(0.0, 1.0, 0.1);
        assert!(pid.integral() < 0.25);
    }

    #[test]
    fn test_derivative() {
        use super::PIDController;
        use crate::config::PID;

        let mut pid = PIDController::new(PID::new(0.0, 0.0, 0.1).output_limit(-10.0, 10.0));
        // No derivative kick on the first sample
        assert_eq!(pid.update(1.0, 0.0, 0.1), 0.0);
        let output = pid.update(1.0, 0.5, 0.1);
        assert!((output - (-0.5)).abs() < 1e-5);
    }

    #[test]
    fn test_zero_dt() {
        use super::PIDController;
        use crate::config::PID;

        let mut pid = PIDController::new(PID::new(0.4, 0.3, 0.2));
        let output = pid.update(1.0, 0.2, 0.02);
        let integral = pid.integral();
        assert_eq!(pid.update(5.0, -3.0, 0.0), output);
        assert_eq!(pid.update(5.0, -3.0, -0.02), output);
        assert_eq!(pid.update(5.0, -3.0, f32::NAN), output);
        assert_eq!(pid.update(f32::INFINITY, 0.0, 0.02), output);
        assert_eq!(pid.integral(), integral);
        assert!(pid.update(5.0, -3.0, 0.02).is_finite());
    }

    #[test]
    fn test_stabilizer_axes_independent() {
        use super::Stabilizer;
        use crate::config::PIDs;
        use crate::types::{AttitudeState, AttitudeTarget, SensorSample};

        let mut stabilizer = Stabilizer::new(&PIDs::default(), 0.5);
        let target = AttitudeTarget { roll: 0.1, pitch: 0.0, yaw_rate: 0.0, altitude: 0.0 };
        let sample = SensorSample::new(AttitudeState::default(), Default::default());
        let axes = stabilizer.update(&target, &sample, 0.01);
        assert!(axes.roll > 0.0);
        assert_eq!(axes.pitch, 0.0);
        assert_eq!(axes.yaw, 0.0);
        assert_eq!(axes.throttle, 0.5);
        let [_, pitch, yaw, altitude] = stabilizer.integrals();
        assert_eq!((pitch, yaw, altitude), (0.0, 0.0, 0.0));
    }
}
