/// Gains and limits of one feedback loop.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PID {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Bound on the magnitude of the integral accumulator.
    pub integral_limit: f32,
    pub output_min: f32,
    pub output_max: f32,
}

impl PID {
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd, integral_limit: 1.0, output_min: -1.0, output_max: 1.0 }
    }

    pub const fn integral_limit(mut self, limit: f32) -> Self {
        self.integral_limit = limit;
        self
    }

    pub const fn output_limit(mut self, min: f32, max: f32) -> Self {
        self.output_min = min;
        self.output_max = max;
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PIDs {
    pub roll: PID,
    pub pitch: PID,
    pub yaw_rate: PID,
    pub altitude: PID,
}

impl Default for PIDs {
    fn default() -> Self {
        Self {
            roll: PID::new(0.6, 0.05, 0.15).integral_limit(0.5).output_limit(-0.2, 0.2),
            pitch: PID::new(0.6, 0.05, 0.15).integral_limit(0.5).output_limit(-0.2, 0.2),
            yaw_rate: PID::new(0.3, 0.05, 0.0).integral_limit(0.5).output_limit(-0.1, 0.1),
            altitude: PID::new(0.25, 0.05, 0.2).integral_limit(2.0).output_limit(-0.3, 0.3),
        }
    }
}
