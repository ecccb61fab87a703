pub mod capture;
pub mod leg;
pub mod plan;

pub use capture::CaptureScheduler;
pub use leg::{derive_plan, FlightLeg, Plan};
pub use plan::{FlightEvent, FlightPlan, FlightPlanCursor};
