pub mod fcs;
pub mod flight;
pub mod inspection;

pub use fcs::{PID, PIDs};
pub use flight::FlightParameters;
pub use inspection::{Dimension, Error, InspectionConfig};
