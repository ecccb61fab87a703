use core::fmt;

use heapless::Vec;

use crate::{
    config::{
        flight::{Legs, Timeouts},
        InspectionConfig,
    },
    types::measurement::DEGREE_PER_RAD,
};

pub const NUM_LEGS: usize = 10;
pub const NUM_SIDES: usize = 4;

/// One segment of the inspection flight.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "leg", rename_all = "kebab-case")]
pub enum FlightLeg {
    Takeoff { target_altitude: f32 },
    Stabilize { duration: f32 },
    /// Lateral translation to the right. `heading` is relative to the heading measured when
    /// the flight started.
    Strafe { distance: f32, heading: f32 },
    Turn { delta_yaw: f32 },
    Land,
}

impl FlightLeg {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Takeoff { .. } => "takeoff",
            Self::Stabilize { .. } => "stabilize",
            Self::Strafe { .. } => "strafe",
            Self::Turn { .. } => "turn",
            Self::Land => "land",
        }
    }

    /// Seconds this leg may last before the plan gives up on it.
    pub fn max_dwell(&self, timeouts: &Timeouts, strafe_speed: f32) -> Option<f32> {
        match *self {
            Self::Takeoff { .. } => Some(timeouts.takeoff),
            Self::Stabilize { .. } => None,
            Self::Strafe { distance, .. } if strafe_speed > 0.0 => {
                Some(distance / strafe_speed * timeouts.strafe_factor + timeouts.strafe_margin)
            }
            Self::Strafe { .. } => None,
            Self::Turn { .. } => Some(timeouts.turn),
            Self::Land => Some(timeouts.land),
        }
    }
}

impl fmt::Display for FlightLeg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Takeoff { target_altitude } => write!(f, "takeoff to {:.1}m", target_altitude),
            Self::Stabilize { duration } => write!(f, "stabilize for {:.1}s", duration),
            Self::Strafe { distance, .. } => write!(f, "strafe {:.1}m", distance),
            Self::Turn { delta_yaw } => write!(f, "turn {:.0}°", delta_yaw * DEGREE_PER_RAD),
            Self::Land => write!(f, "land"),
        }
    }
}

pub type Plan = Vec<FlightLeg, NUM_LEGS>;

/// Takeoff to half the building height, stabilize, then fly the rectangle length, breadth,
/// length, breadth with a turn at each of the three inner corners, then land.
pub fn derive_plan(config: &InspectionConfig, legs: &Legs) -> Plan {
    let mut plan = Plan::new();
    plan.push(FlightLeg::Takeoff { target_altitude: config.building_height / 2.0 }).ok();
    plan.push(FlightLeg::Stabilize { duration: legs.stabilize_duration }).ok();
    let (length, breadth) = (config.building_length, config.building_breadth);
    for (side, &distance) in [length, breadth, length, breadth].iter().enumerate() {
        let heading = side as f32 * legs.turn_delta;
        plan.push(FlightLeg::Strafe { distance, heading }).ok();
        if side + 1 < NUM_SIDES {
            plan.push(FlightLeg::Turn { delta_yaw: legs.turn_delta }).ok();
        }
    }
    plan.push(FlightLeg::Land).ok();
    plan
}

pub fn total_lateral_travel(plan: &[FlightLeg]) -> f32 {
    plan.iter()
        .map(|leg| match leg {
            FlightLeg::Strafe { distance, .. } => *distance,
            _ => 0.0,
        })
        .sum()
}

mod test {
    #[test]
    fn test_derive_plan() {
        use core::f32::consts::FRAC_PI_2;

        use pretty_assertions::assert_eq;

        use super::{derive_plan, total_lateral_travel, FlightLeg, NUM_LEGS};
        use crate::config::InspectionConfig;

        let config = InspectionConfig::new(20.0, 10.0, 8.0).unwrap();
        let plan = derive_plan(&config, &Default::default());
        assert_eq!(plan.len(), NUM_LEGS);
        assert_eq!(plan[0], FlightLeg::Takeoff { target_altitude: 4.0 });
        assert_eq!(plan[1], FlightLeg::Stabilize { duration: 3.0 });
        assert_eq!(plan[2], FlightLeg::Strafe { distance: 20.0, heading: 0.0 });
        assert_eq!(plan[3], FlightLeg::Turn { delta_yaw: -FRAC_PI_2 });
        assert_eq!(plan[4], FlightLeg::Strafe { distance: 10.0, heading: -FRAC_PI_2 });
        assert_eq!(plan[8], FlightLeg::Strafe { distance: 10.0, heading: -3.0 * FRAC_PI_2 });
        assert_eq!(plan[9], FlightLeg::Land);
        assert_eq!(total_lateral_travel(&plan), 60.0);

        let strafes = plan.iter().filter(|leg| matches!(leg, FlightLeg::Strafe { .. })).count();
        let turns = plan.iter().filter(|leg| matches!(leg, FlightLeg::Turn { .. })).count();
        assert_eq!((strafes, turns), (4, 3));
    }

    #[test]
    fn test_max_dwell() {
        use super::FlightLeg;
        use crate::config::flight::Timeouts;

        let timeouts = Timeouts::default();
        let strafe = FlightLeg::Strafe { distance: 20.0, heading: 0.0 };
        assert_eq!(strafe.max_dwell(&timeouts, 1.0), Some(90.0));
        assert_eq!(strafe.max_dwell(&timeouts, 0.0), None);
        assert_eq!(FlightLeg::Stabilize { duration: 3.0 }.max_dwell(&timeouts, 1.0), None);
        assert_eq!(FlightLeg::Land.max_dwell(&timeouts, 1.0), Some(120.0));
    }
}
