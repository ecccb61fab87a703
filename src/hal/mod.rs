pub mod actuators;
pub mod camera;
pub mod sensors;

pub use actuators::Actuators;
pub use camera::ImageSink;
pub use sensors::Sensors;
