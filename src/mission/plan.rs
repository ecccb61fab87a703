use fugit::NanosDurationU64 as Duration;
use heapless::Vec;
#[cfg(not(any(test, feature = "std")))]
use micromath::F32Ext;
use nalgebra::Vector2;

use super::{
    capture::CaptureScheduler,
    leg::{derive_plan, FlightLeg, Plan},
};
use crate::{
    config::{
        flight::{Guidance, Legs, Timeouts},
        FlightParameters, InspectionConfig,
    },
    types::{
        measurement::{compose, decompose, wrap, DEGREE_PER_RAD},
        CaptureEvent, SensorSample, Setpoint,
    },
};

pub const MAX_EVENTS: usize = 16;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum FlightEvent {
    LegStarted { leg_index: usize, leg: FlightLeg },
    LegCompleted { leg_index: usize, leg: FlightLeg },
    Capture(CaptureEvent),
    LegTimeout { leg_index: usize, elapsed: f32 },
    Aborted { leg_index: usize },
    /// No valid sensor sample for `elapsed` seconds, raised by the controller.
    SensorTimeout { leg_index: usize, elapsed: f32 },
    FlightComplete,
}

pub type Events = Vec<FlightEvent, MAX_EVENTS>;

/// Progress through the plan. `progress` is meters travelled for strafe legs, radians turned
/// for turn legs and seconds otherwise.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct FlightPlanCursor {
    pub leg_index: usize,
    pub progress: f32,
    /// Seconds since the leg started.
    pub elapsed: f32,
    pub captures: u8,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum State {
    WarmingUp(f32),
    Flying,
    Complete,
}

pub struct Step {
    pub setpoint: Setpoint,
    pub events: Events,
}

/// Drives the fixed sequence of flight legs. Transitions only go forward; a leg that never
/// meets its completion condition is abandoned for the land leg once its max dwell expires.
pub struct FlightPlan {
    legs: Plan,
    config: Legs,
    timeouts: Timeouts,
    guidance: Guidance,
    state: State,
    cursor: FlightPlanCursor,
    clock: Duration,
    cruise_altitude: f32,
    reference_heading: f32,
    heading: f32,
    anchor: Vector2<f32>,
    turn_origin: f32,
    land_reference: f32,
    scheduler: Option<CaptureScheduler>,
    timed_out: bool,
    abort_requested: bool,
    setpoint: Option<Setpoint>,
}

fn limit(vector: Vector2<f32>, max: f32) -> Vector2<f32> {
    let norm = vector.norm();
    if norm > max && norm > 0.0 {
        vector * (max / norm)
    } else {
        vector
    }
}

impl FlightPlan {
    pub fn new(config: &InspectionConfig, params: &FlightParameters) -> Self {
        Self::from_legs(derive_plan(config, &params.legs), params)
    }

    /// The last leg of `legs` is expected to be [`FlightLeg::Land`]. An empty plan is
    /// complete from the start.
    pub fn from_legs(legs: Plan, params: &FlightParameters) -> Self {
        let cruise_altitude = legs
            .iter()
            .find_map(|leg| match leg {
                FlightLeg::Takeoff { target_altitude } => Some(*target_altitude),
                _ => None,
            })
            .unwrap_or_default();
        let state = if legs.is_empty() { State::Complete } else { State::WarmingUp(0.0) };
        Self {
            legs,
            config: params.legs,
            timeouts: params.timeouts,
            guidance: params.guidance,
            state,
            cursor: FlightPlanCursor::default(),
            clock: Duration::nanos(0),
            cruise_altitude,
            reference_heading: 0.0,
            heading: 0.0,
            anchor: Vector2::zeros(),
            turn_origin: 0.0,
            land_reference: 0.0,
            scheduler: None,
            timed_out: false,
            abort_requested: false,
            setpoint: None,
        }
    }

    pub fn legs(&self) -> &[FlightLeg] {
        &self.legs
    }

    pub fn cursor(&self) -> &FlightPlanCursor {
        &self.cursor
    }

    pub fn current_leg(&self) -> Option<FlightLeg> {
        match self.state {
            State::Complete => None,
            _ => self.legs.get(self.cursor.leg_index).copied(),
        }
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn is_warming_up(&self) -> bool {
        matches!(self.state, State::WarmingUp(_))
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    /// Requests an immediate transition to the land leg, taking effect on the next step.
    pub fn abort(&mut self) {
        self.abort_requested = true;
    }

    fn land_index(&self) -> usize {
        self.legs.len().saturating_sub(1)
    }

    fn enter(&mut self, index: usize, sample: &SensorSample, events: &mut Events) {
        self.cursor = FlightPlanCursor { leg_index: index, ..Default::default() };
        self.timed_out = false;
        self.anchor = sample.kinematics.horizontal_position();
        self.scheduler = None;
        let leg = match self.legs.get(index) {
            Some(&leg) => leg,
            None => return,
        };
        match leg {
            FlightLeg::Takeoff { .. } => self.heading = self.reference_heading,
            FlightLeg::Stabilize { .. } => (),
            FlightLeg::Strafe { distance, heading } => {
                self.heading = wrap(self.reference_heading + heading);
                let count = self.config.images_per_side;
                let scheduler = CaptureScheduler::new(index, distance, count);
                debug!("Capture points {:?}", scheduler.thresholds());
                self.scheduler = Some(scheduler);
            }
            FlightLeg::Turn { delta_yaw } => {
                self.turn_origin = sample.attitude.yaw;
                self.heading = wrap(self.heading + delta_yaw);
            }
            FlightLeg::Land => self.land_reference = sample.kinematics.altitude().max(0.0),
        }
        info!("Leg {} started: {}", index, leg);
        events.push(FlightEvent::LegStarted { leg_index: index, leg }).ok();
    }

    fn complete(&mut self, sample: &SensorSample, events: &mut Events) {
        let index = self.cursor.leg_index;
        let leg = self.legs[index];
        info!("Leg {} complete: {} after {:.1}s", index, leg, self.cursor.elapsed);
        events.push(FlightEvent::LegCompleted { leg_index: index, leg }).ok();
        if index + 1 < self.legs.len() {
            self.enter(index + 1, sample, events);
            return;
        }
        self.cursor = FlightPlanCursor { leg_index: self.legs.len(), ..Default::default() };
        self.scheduler = None;
        self.state = State::Complete;
        info!("Flight complete");
        events.push(FlightEvent::FlightComplete).ok();
    }

    fn hold(&self, sample: &SensorSample) -> Vector2<f32> {
        let error = self.anchor - sample.kinematics.horizontal_position();
        limit(error * self.guidance.position_gain, self.guidance.max_correction_speed)
    }

    fn setpoint(&self, altitude: f32, velocity: Vector2<f32>, sample: &SensorSample) -> Setpoint {
        let (forward_speed, right_speed) = decompose(velocity, sample.attitude.yaw);
        Setpoint { altitude, heading: self.heading, forward_speed, right_speed }
    }

    /// Advances the plan by `dt` seconds. A `dt` that is not positive and finite changes
    /// nothing and repeats the previous setpoint.
    pub fn step(&mut self, sample: &SensorSample, dt: f32) -> Step {
        let step = self.advance(sample, dt);
        self.setpoint = Some(step.setpoint);
        step
    }

    fn advance(&mut self, sample: &SensorSample, dt: f32) -> Step {
        let mut events = Events::new();
        if !(dt.is_finite() && dt > 0.0) {
            let hover = Setpoint::hover(sample.kinematics.altitude(), sample.attitude.yaw);
            return Step { setpoint: self.setpoint.unwrap_or(hover), events };
        }
        self.clock = self.clock + Duration::nanos((dt * 1e9 + 0.5) as u64);

        match self.state {
            State::WarmingUp(elapsed) => {
                let elapsed = elapsed + dt;
                if elapsed < self.config.warm_up && !self.abort_requested {
                    self.state = State::WarmingUp(elapsed);
                    let altitude = sample.kinematics.altitude();
                    let setpoint = Setpoint::hover(altitude, sample.attitude.yaw);
                    return Step { setpoint, events };
                }
                self.reference_heading = sample.attitude.yaw;
                self.heading = self.reference_heading;
                self.state = State::Flying;
                info!("Reference heading {:.1}°", self.reference_heading * DEGREE_PER_RAD);
                if !self.abort_requested {
                    self.enter(0, sample, &mut events);
                }
            }
            State::Complete => {
                self.abort_requested = false;
                return Step { setpoint: Setpoint::hover(0.0, self.heading), events };
            }
            State::Flying => self.cursor.elapsed += dt,
        }

        if self.abort_requested {
            self.abort_requested = false;
            let land = self.land_index();
            if !self.is_flying(land) {
                warn!("Abort requested during leg {}, landing", self.cursor.leg_index);
                events.push(FlightEvent::Aborted { leg_index: self.cursor.leg_index }).ok();
                self.enter(land, sample, &mut events);
            }
        }

        let index = self.cursor.leg_index;
        let leg = match self.legs.get(index) {
            Some(&leg) => leg,
            None => return Step { setpoint: Setpoint::hover(0.0, self.heading), events },
        };
        let (setpoint, done) = self.fly(leg, sample, dt, &mut events);

        if done {
            self.complete(sample, &mut events);
        } else if !self.timed_out {
            let strafe_speed = self.config.strafe_speed;
            if let Some(max_dwell) = leg.max_dwell(&self.timeouts, strafe_speed) {
                if self.cursor.elapsed > max_dwell {
                    self.timeout(leg, sample, &mut events);
                }
            }
        }
        Step { setpoint, events }
    }

    fn is_flying(&self, index: usize) -> bool {
        self.state == State::Flying && self.cursor.leg_index == index
    }

    fn timeout(&mut self, leg: FlightLeg, sample: &SensorSample, events: &mut Events) {
        let (index, elapsed) = (self.cursor.leg_index, self.cursor.elapsed);
        warn!("Leg {} ({}) not complete after {:.1}s", index, leg, elapsed);
        self.timed_out = true;
        events.push(FlightEvent::LegTimeout { leg_index: index, elapsed }).ok();
        if leg != FlightLeg::Land {
            self.enter(self.land_index(), sample, events);
        }
    }

    fn fly(
        &mut self,
        leg: FlightLeg,
        sample: &SensorSample,
        dt: f32,
        events: &mut Events,
    ) -> (Setpoint, bool) {
        let altitude = sample.kinematics.altitude();
        let config = self.config;
        match leg {
            FlightLeg::Takeoff { target_altitude } => {
                let in_band = (altitude - target_altitude).abs() <= config.takeoff_tolerance;
                self.cursor.progress = if in_band { self.cursor.progress + dt } else { 0.0 };
                let velocity = self.hold(sample);
                let done = in_band && self.cursor.progress >= config.takeoff_dwell;
                (self.setpoint(target_altitude, velocity, sample), done)
            }
            FlightLeg::Stabilize { duration } => {
                self.cursor.progress += dt;
                let velocity = self.hold(sample);
                let done = self.cursor.progress >= duration;
                (self.setpoint(self.cruise_altitude, velocity, sample), done)
            }
            FlightLeg::Strafe { distance, .. } => {
                let displacement = sample.kinematics.horizontal_position() - self.anchor;
                let (drift, travelled) = decompose(displacement, self.heading);
                self.cursor.progress = travelled;
                if let Some(scheduler) = self.scheduler.as_mut() {
                    let position = sample.kinematics.position;
                    for capture in scheduler.update(travelled, position, self.clock) {
                        let (index, number) = (capture.leg_index, capture.sequence_number);
                        info!("Leg {} capture {} at {:.1}m", index, number, travelled);
                        self.cursor.captures = capture.sequence_number;
                        events.push(FlightEvent::Capture(capture)).ok();
                    }
                }
                let max = self.guidance.max_correction_speed;
                let correction = (-self.guidance.drift_gain * drift).clamp(-max, max);
                let velocity = compose(correction, config.strafe_speed, self.heading);
                (self.setpoint(self.cruise_altitude, velocity, sample), travelled >= distance)
            }
            FlightLeg::Turn { .. } => {
                self.cursor.progress = wrap(sample.attitude.yaw - self.turn_origin).abs();
                let error = sample.attitude.heading_error(self.heading);
                let velocity = self.hold(sample);
                let done = error.abs() < config.turn_tolerance;
                (self.setpoint(self.cruise_altitude, velocity, sample), done)
            }
            FlightLeg::Land => {
                self.land_reference = (self.land_reference - config.descent_rate * dt).max(0.0);
                let settled = altitude <= config.land_altitude_tolerance
                    && sample.kinematics.vertical_speed().abs() <= config.land_speed_tolerance;
                self.cursor.progress = if settled { self.cursor.progress + dt } else { 0.0 };
                let velocity = self.hold(sample);
                let done = settled && self.cursor.progress >= config.land_dwell;
                (self.setpoint(self.land_reference, velocity, sample), done)
            }
        }
    }
}

mod test {
    #[cfg(test)]
    use std::vec;

    #[test]
    fn test_warm_up() {
        use pretty_assertions::assert_eq;

        use super::{FlightEvent, FlightPlan};
        use crate::config::InspectionConfig;
        use crate::types::SensorSample;

        let config = InspectionConfig::new(20.0, 10.0, 8.0).unwrap();
        let mut plan = FlightPlan::new(&config, &Default::default());
        let mut sample = SensorSample::default();
        sample.attitude.yaw = 0.3;

        let step = plan.step(&sample, 0.5);
        assert!(plan.is_warming_up());
        assert!(step.events.is_empty());
        assert_eq!(plan.current_leg(), Some(plan.legs()[0]));

        let step = plan.step(&sample, 0.6);
        assert!(!plan.is_warming_up());
        let leg = plan.legs()[0];
        assert_eq!(step.events.as_slice(), &[FlightEvent::LegStarted { leg_index: 0, leg }]);
        assert_eq!(step.setpoint.altitude, 4.0);
        assert_eq!(step.setpoint.heading, 0.3);
    }

    #[test]
    fn test_abort_during_warm_up() {
        use pretty_assertions::assert_eq;

        use super::{FlightEvent, FlightPlan};
        use crate::config::InspectionConfig;
        use crate::mission::leg::FlightLeg;
        use crate::types::SensorSample;

        let config = InspectionConfig::new(20.0, 10.0, 8.0).unwrap();
        let mut plan = FlightPlan::new(&config, &Default::default());
        plan.abort();
        let step = plan.step(&SensorSample::default(), 0.01);
        let expected = [
            FlightEvent::Aborted { leg_index: 0 },
            FlightEvent::LegStarted { leg_index: 9, leg: FlightLeg::Land },
        ];
        assert_eq!(step.events.as_slice(), &expected);
        assert_eq!(plan.current_leg(), Some(FlightLeg::Land));
    }

    #[test]
    fn test_strafe_captures() {
        use pretty_assertions::assert_eq;

        use super::FlightPlan;
        use crate::config::FlightParameters;
        use crate::mission::leg::{FlightLeg, Plan};
        use crate::types::SensorSample;

        let mut params = FlightParameters::default();
        params.legs.warm_up = 0.0;
        let legs = [FlightLeg::Strafe { distance: 4.0, heading: 0.0 }, FlightLeg::Land];
        let mut plan = FlightPlan::from_legs(Plan::from_slice(&legs).unwrap(), &params);
        let mut sample = SensorSample::default();
        plan.step(&sample, 1.0);

        let mut sequence = std::vec::Vec::new();
        for y in 1..=4 {
            sample.kinematics.position.y = y as f32;
            let step = plan.step(&sample, 1.0);
            for event in step.events.iter() {
                if let super::FlightEvent::Capture(capture) = event {
                    sequence.push((capture.sequence_number, capture.position.y));
                }
            }
            // Strafing right while facing north
            assert_eq!(step.setpoint.right_speed, 1.0);
        }
        assert_eq!(sequence, vec![(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]);
        assert_eq!(plan.cursor().leg_index, 1);
    }

    #[test]
    fn test_land_timeout() {
        use pretty_assertions::assert_eq;

        use super::{FlightEvent, FlightPlan};
        use crate::config::FlightParameters;
        use crate::mission::leg::{FlightLeg, Plan};
        use crate::types::SensorSample;

        let mut params = FlightParameters::default();
        params.legs.warm_up = 0.0;
        params.timeouts.land = 1.0;
        let legs = Plan::from_slice(&[FlightLeg::Land]).unwrap();
        let mut plan = FlightPlan::from_legs(legs, &params);
        let mut sample = SensorSample::default();
        sample.kinematics.position.z = 5.0;

        let mut timeouts = 0;
        let mut altitude = 5.0;
        for _ in 0..30 {
            let step = plan.step(&sample, 0.1);
            let count = step.events.iter().filter(|e| matches!(e, FlightEvent::LegTimeout { .. }));
            timeouts += count.count();
            assert!(step.setpoint.altitude <= altitude);
            altitude = step.setpoint.altitude;
        }
        assert_eq!(timeouts, 1);
        assert_eq!(plan.current_leg(), Some(FlightLeg::Land));
        assert!(!plan.is_complete());
        assert!(altitude < 3.6);
    }

    #[test]
    fn test_zero_dt_holds() {
        use pretty_assertions::assert_eq;

        use super::FlightPlan;
        use crate::config::FlightParameters;
        use crate::mission::leg::{FlightLeg, Plan};
        use crate::types::SensorSample;

        let mut params = FlightParameters::default();
        params.legs.warm_up = 0.0;
        let legs = [FlightLeg::Strafe { distance: 4.0, heading: 0.0 }, FlightLeg::Land];
        let mut plan = FlightPlan::from_legs(Plan::from_slice(&legs).unwrap(), &params);
        let mut sample = SensorSample::default();
        let first = plan.step(&sample, 0.1);

        // Past every threshold, but no time has passed
        sample.kinematics.position.y = 5.0;
        let cursor = *plan.cursor();
        for dt in [0.0, -0.1, f32::NAN, f32::INFINITY] {
            let step = plan.step(&sample, dt);
            assert!(step.events.is_empty());
            assert_eq!(step.setpoint, first.setpoint);
            assert_eq!(*plan.cursor(), cursor);
        }

        let step = plan.step(&sample, 0.1);
        assert_eq!(step.events.len(), 4 + 2);
        assert_eq!(plan.cursor().leg_index, 1);
    }

    #[test]
    fn test_empty_plan() {
        use super::FlightPlan;
        use crate::mission::leg::Plan;
        use crate::types::SensorSample;

        let mut plan = FlightPlan::from_legs(Plan::new(), &Default::default());
        assert!(plan.is_complete());
        plan.abort();
        let step = plan.step(&SensorSample::default(), 0.1);
        assert!(step.events.is_empty());
        assert_eq!(plan.current_leg(), None);
    }

    #[test]
    fn test_three_per_side() {
        use pretty_assertions::assert_eq;

        use super::{FlightEvent, FlightPlan};
        use crate::config::FlightParameters;
        use crate::mission::leg::{FlightLeg, Plan};
        use crate::types::SensorSample;

        let distance = 1.8769;
        let mut params = FlightParameters::default();
        params.legs.warm_up = 0.0;
        params.legs.images_per_side = 3;
        let legs = [FlightLeg::Strafe { distance, heading: 0.0 }, FlightLeg::Land];
        let mut plan = FlightPlan::from_legs(Plan::from_slice(&legs).unwrap(), &params);
        let mut sample = SensorSample::default();
        plan.step(&sample, 0.1);

        // Jump straight to the end of the leg
        sample.kinematics.position.y = distance;
        let step = plan.step(&sample, 0.1);
        let numbers: std::vec::Vec<u8> = step
            .events
            .iter()
            .filter_map(|event| match event {
                FlightEvent::Capture(capture) => Some(capture.sequence_number),
                _ => None,
            })
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(plan.cursor().leg_index, 1);
    }
}
