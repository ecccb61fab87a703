/// What the flight plan asks for in the current tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Setpoint {
    /// Altitude reference in meters.
    pub altitude: f32,
    /// Heading to hold, radians, clockwise from north.
    pub heading: f32,
    /// Body-frame forward velocity in m/s.
    pub forward_speed: f32,
    /// Body-frame right velocity in m/s.
    pub right_speed: f32,
}

impl Setpoint {
    pub fn hover(altitude: f32, heading: f32) -> Self {
        Self { altitude, heading, ..Default::default() }
    }
}

/// Setpoints of the four stabilized axes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttitudeTarget {
    pub roll: f32,
    pub pitch: f32,
    pub yaw_rate: f32,
    pub altitude: f32,
}

/// Normalized stabilizer outputs fed into the mixer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    pub throttle: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

pub const FRONT_LEFT: usize = 0;
pub const FRONT_RIGHT: usize = 1;
pub const REAR_LEFT: usize = 2;
pub const REAR_RIGHT: usize = 3;

/// Per-rotor thrust in [0, 1], indexed by [`FRONT_LEFT`], [`FRONT_RIGHT`], [`REAR_LEFT`]
/// and [`REAR_RIGHT`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorCommand(pub [f32; 4]);

impl MotorCommand {
    pub const IDLE: Self = Self([0.0; 4]);

    pub fn total(&self) -> f32 {
        self.0.iter().sum()
    }
}

/// Camera gimbal angles in radians.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GimbalCommand {
    pub roll: f32,
    pub pitch: f32,
}
