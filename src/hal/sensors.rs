use crate::types::SensorSample;

/// Reads attitude, body rates, position and velocity from the host once per tick.
pub trait Sensors {
    type Error: core::fmt::Debug;

    fn read(&mut self) -> Result<SensorSample, Self::Error>;
}
