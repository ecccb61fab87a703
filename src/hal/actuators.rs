use crate::types::{GimbalCommand, MotorCommand};

/// Delivers rotor thrust and gimbal angles to the host.
pub trait Actuators {
    type Error: core::fmt::Debug;

    fn write(&mut self, motors: &MotorCommand, gimbal: &GimbalCommand) -> Result<(), Self::Error>;
}
