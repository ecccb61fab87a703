pub mod capture;
pub mod control;
pub mod measurement;

pub use capture::CaptureEvent;
pub use control::{AttitudeTarget, Axes, GimbalCommand, MotorCommand, Setpoint};
pub use measurement::{AttitudeState, KinematicState, SensorSample};
