use drone_inspector::config::{FlightParameters, InspectionConfig};
use drone_inspector::hal::{Actuators, ImageSink, Sensors};
use drone_inspector::mission::{FlightEvent, FlightLeg};
use drone_inspector::sync::trigger::trigger;
use drone_inspector::types::measurement::{compose, wrap};
use drone_inspector::types::{CaptureEvent, GimbalCommand, MotorCommand, SensorSample};
use drone_inspector::{InspectionController, Output};

const DT: f32 = 0.02;
const MAX_TICKS: usize = 20_000;

/// Vehicle that realizes every setpoint exactly.
#[derive(Default)]
struct Ideal {
    sample: SensorSample,
    frozen: bool,
}

impl Ideal {
    fn advance(&mut self, output: &Output, dt: f32) {
        if self.frozen || dt <= 0.0 {
            return;
        }
        let setpoint = &output.setpoint;
        let attitude = &mut self.sample.attitude;
        let kinematics = &mut self.sample.kinematics;
        let velocity = compose(setpoint.forward_speed, setpoint.right_speed, attitude.yaw);
        let previous = kinematics.position.z;
        kinematics.position.x += velocity.x * dt;
        kinematics.position.y += velocity.y * dt;
        kinematics.position.z = setpoint.altitude;
        kinematics.velocity.x = velocity.x;
        kinematics.velocity.y = velocity.y;
        kinematics.velocity.z = (setpoint.altitude - previous) / dt;
        attitude.yaw = wrap(attitude.yaw + output.target.yaw_rate * dt);
        attitude.yaw_rate = output.target.yaw_rate;
    }
}

impl Sensors for Ideal {
    type Error = ();

    fn read(&mut self) -> Result<SensorSample, ()> {
        Ok(self.sample)
    }
}

#[derive(Default)]
struct Motors(Vec<MotorCommand>);

impl Actuators for Motors {
    type Error = ();

    fn write(&mut self, motors: &MotorCommand, _: &GimbalCommand) -> Result<(), ()> {
        self.0.push(*motors);
        Ok(())
    }
}

#[derive(Default)]
struct Recorder(Vec<CaptureEvent>);

impl ImageSink for Recorder {
    type Error = ();

    fn capture(&mut self, event: &CaptureEvent) -> Result<(), ()> {
        self.0.push(*event);
        Ok(())
    }
}

struct Flight {
    controller: InspectionController,
    vehicle: Ideal,
    motors: Motors,
    sink: Recorder,
    events: Vec<FlightEvent>,
}

impl Flight {
    fn new(controller: InspectionController) -> Self {
        Self {
            controller,
            vehicle: Ideal::default(),
            motors: Motors::default(),
            sink: Recorder::default(),
            events: vec![],
        }
    }

    fn with_params(params: FlightParameters) -> Self {
        let config = InspectionConfig::new(20.0, 10.0, 8.0).unwrap();
        Self::new(InspectionController::new(&config, &params).unwrap())
    }

    fn tick(&mut self, dt: f32) -> Output {
        let controller = &mut self.controller;
        let output = controller.step(&mut self.vehicle, &mut self.motors, &mut self.sink, dt);
        self.vehicle.advance(&output, dt);
        self.events.extend(output.events.iter().copied());
        output
    }

    fn run_until<F: Fn(&Self) -> bool>(&mut self, done: F) {
        for _ in 0..MAX_TICKS {
            if done(self) {
                return;
            }
            self.tick(DT);
        }
        panic!("Flight did not reach expected state, events: {:?}", self.events);
    }

    fn completed(&self) -> Vec<usize> {
        let completed = self.events.iter().filter_map(|event| match event {
            FlightEvent::LegCompleted { leg_index, .. } => Some(*leg_index),
            _ => None,
        });
        completed.collect()
    }

    fn timeouts(&self) -> Vec<(usize, f32)> {
        let timeouts = self.events.iter().filter_map(|event| match event {
            FlightEvent::LegTimeout { leg_index, elapsed } => Some((*leg_index, *elapsed)),
            _ => None,
        });
        timeouts.collect()
    }

    fn captures(&self) -> Vec<CaptureEvent> {
        let captures = self.events.iter().filter_map(|event| match event {
            FlightEvent::Capture(capture) => Some(*capture),
            _ => None,
        });
        captures.collect()
    }
}

#[test]
fn test_full_inspection() {
    use pretty_assertions::assert_eq;

    let mut flight = Flight::with_params(FlightParameters::default());
    flight.run_until(|flight| flight.controller.is_complete());

    assert_eq!(flight.completed(), (0..10).collect::<Vec<_>>());
    assert_eq!(flight.controller.plan().cursor().leg_index, 10);
    assert!(flight.events.iter().all(|e| !matches!(e, FlightEvent::LegTimeout { .. })));
    let complete = flight.events.iter().filter(|e| **e == FlightEvent::FlightComplete).count();
    assert_eq!(complete, 1);

    let captures = flight.captures();
    assert_eq!(captures.len(), 16);
    assert_eq!(flight.sink.0, captures);
    for (leg_index, distance) in [(2, 20.0), (4, 10.0), (6, 20.0), (8, 10.0)] {
        let side: Vec<_> = captures.iter().filter(|c| c.leg_index == leg_index).collect();
        let numbers: Vec<u8> = side.iter().map(|c| c.sequence_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        for pair in side.windows(2) {
            let spacing = (pair[1].position.xy() - pair[0].position.xy()).norm();
            assert!((spacing - distance / 4.0).abs() < 0.1, "spacing {}", spacing);
        }
        assert!(side.iter().all(|c| (c.position.z - 4.0).abs() < 1e-3));
    }
    assert!(captures.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));

    // Parked after landing
    let output = flight.tick(DT);
    assert_eq!(output.motors, MotorCommand::IDLE);
    assert!(output.events.is_empty());
    assert!(flight.vehicle.sample.kinematics.position.z.abs() < 0.15);
}

#[test]
fn test_rectangle_closes() {
    let mut flight = Flight::with_params(FlightParameters::default());
    flight.run_until(|flight| flight.controller.is_complete());

    // Length, breadth, length, breadth with left turns brings the vehicle back over the start
    let position = flight.vehicle.sample.kinematics.position.xy();
    assert!(position.norm() < 0.5, "ended at {:?}", position);
}

#[test]
fn test_abort() {
    use pretty_assertions::assert_eq;

    let (notifier, receiver) = trigger();
    let config = InspectionConfig::new(20.0, 10.0, 8.0).unwrap();
    let controller = InspectionController::new(&config, &Default::default()).unwrap();
    let mut flight = Flight::new(controller.with_abort(receiver));
    flight.run_until(|flight| flight.captures().len() == 2);
    notifier.set();
    let output = flight.tick(DT);
    let expected = FlightEvent::Aborted { leg_index: 2 };
    assert_eq!(output.events.first(), Some(&expected));
    let landing = FlightEvent::LegStarted { leg_index: 9, leg: FlightLeg::Land };
    assert!(output.events.contains(&landing));

    flight.run_until(|flight| flight.controller.is_complete());
    assert_eq!(flight.completed(), vec![0, 1, 9]);
    assert_eq!(flight.captures().len(), 2);

    // Nothing left to abort
    notifier.set();
    let output = flight.tick(DT);
    assert!(output.events.is_empty());
}

#[test]
fn test_takeoff_timeout() {
    use pretty_assertions::assert_eq;

    let mut params = FlightParameters::default();
    params.timeouts.takeoff = 5.0;
    let mut flight = Flight::with_params(params);
    flight.vehicle.frozen = true;
    flight.run_until(|flight| flight.controller.is_complete());

    let timeouts = flight.timeouts();
    assert_eq!(timeouts.len(), 1);
    assert_eq!(timeouts[0].0, 0);
    assert!(timeouts[0].1 > 5.0 && timeouts[0].1 < 5.1);
    assert_eq!(flight.completed(), vec![9]);
    assert!(flight.captures().is_empty());
}

#[test]
fn test_strafe_timeout() {
    use pretty_assertions::assert_eq;

    let mut params = FlightParameters::default();
    params.timeouts.strafe_margin = 5.0;
    let max_dwell = 20.0 / params.legs.strafe_speed * params.timeouts.strafe_factor + 5.0;
    let mut flight = Flight::with_params(params);
    flight.run_until(|flight| flight.captures().len() == 2);
    flight.vehicle.frozen = true;
    flight.run_until(|flight| !flight.timeouts().is_empty());

    let timeouts = flight.timeouts();
    assert_eq!(timeouts.len(), 1);
    assert_eq!(timeouts[0].0, 2);
    assert!(timeouts[0].1 > max_dwell && timeouts[0].1 < max_dwell + 0.1);
    let landing = FlightEvent::LegStarted { leg_index: 9, leg: FlightLeg::Land };
    assert_eq!(flight.events.last(), Some(&landing));
    assert_eq!(flight.captures().len(), 2);

    flight.vehicle.frozen = false;
    flight.run_until(|flight| flight.controller.is_complete());
    assert_eq!(flight.completed(), vec![0, 1, 9]);
    assert_eq!(flight.timeouts().len(), 1);
    assert_eq!(flight.captures().len(), 2);
}

#[test]
fn test_turn_timeout() {
    use pretty_assertions::assert_eq;

    let mut params = FlightParameters::default();
    params.timeouts.turn = 5.0;
    let mut flight = Flight::with_params(params);
    flight.run_until(|flight| flight.controller.plan().cursor().leg_index == 3);
    flight.vehicle.frozen = true;
    flight.run_until(|flight| !flight.timeouts().is_empty());

    let timeouts = flight.timeouts();
    assert_eq!(timeouts.len(), 1);
    assert_eq!(timeouts[0].0, 3);
    assert!(timeouts[0].1 > 5.0 && timeouts[0].1 < 5.1);
    let landing = FlightEvent::LegStarted { leg_index: 9, leg: FlightLeg::Land };
    assert_eq!(flight.events.last(), Some(&landing));
    assert_eq!(flight.captures().len(), 4);

    flight.vehicle.frozen = false;
    flight.run_until(|flight| flight.controller.is_complete());
    assert_eq!(flight.completed(), vec![0, 1, 2, 9]);
    assert_eq!(flight.captures().len(), 4);
}

#[test]
fn test_zero_dt() {
    use pretty_assertions::assert_eq;

    let mut flight = Flight::with_params(FlightParameters::default());
    flight.run_until(|flight| flight.controller.plan().cursor().leg_index == 1);
    flight.tick(DT);
    let cursor = *flight.controller.plan().cursor();
    let motors = flight.controller.last_output().motors;
    let output = flight.tick(0.0);
    assert_eq!(*flight.controller.plan().cursor(), cursor);
    assert_eq!(output.motors, motors);
    assert!(output.events.is_empty());
}

#[test]
fn test_motors_bounded() {
    let mut flight = Flight::with_params(FlightParameters::default());
    flight.run_until(|flight| flight.controller.is_complete());
    assert!(!flight.motors.0.is_empty());
    for command in flight.motors.0.iter() {
        assert!(command.0.iter().all(|m| (0.0..=1.0).contains(m)), "{:?}", command);
    }
}
