pub mod attitude;
pub mod kinematic;

pub use attitude::{wrap, AttitudeState, DEGREE_PER_RAD};
pub use kinematic::{compose, decompose, forward_axis, right_axis, KinematicState};

/// Everything the host environment reports in one control tick.
#[derive(Default, Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub attitude: AttitudeState,
    pub kinematics: KinematicState,
}

impl SensorSample {
    pub fn new(attitude: AttitudeState, kinematics: KinematicState) -> Self {
        Self { attitude, kinematics }
    }

    pub fn is_finite(&self) -> bool {
        self.attitude.is_finite() && self.kinematics.is_finite()
    }
}
