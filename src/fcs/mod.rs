pub mod gimbal;
pub mod guidance;
pub mod mixer;
pub mod pid;

pub use guidance::Guidance;
pub use pid::{PIDController, Stabilizer};
