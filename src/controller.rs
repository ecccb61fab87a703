use crate::{
    config::{
        self,
        flight::{Gimbal, Timeouts},
        FlightParameters, InspectionConfig,
    },
    fcs::{gimbal, mixer, Guidance, Stabilizer},
    hal::{Actuators, ImageSink, Sensors},
    mission::plan::{Events, FlightEvent, FlightPlan, Step},
    sync::trigger::Receiver,
    types::{AttitudeTarget, GimbalCommand, MotorCommand, SensorSample, Setpoint},
};

/// Everything computed in one tick.
#[derive(Clone, Debug, Default)]
pub struct Output {
    pub motors: MotorCommand,
    pub gimbal: GimbalCommand,
    pub setpoint: Setpoint,
    pub target: AttitudeTarget,
    pub events: Events,
}

/// Sensor sample in, actuator commands out. One instance flies one inspection.
///
/// When no valid sample arrives for longer than [`Timeouts::sensor`] the controller raises
/// [`FlightEvent::SensorTimeout`], requests the land leg and commands a level blind descent
/// until samples return.
pub struct InspectionController {
    plan: FlightPlan,
    guidance: Guidance,
    stabilizer: Stabilizer,
    gimbal: Gimbal,
    timeouts: Timeouts,
    blind_throttle: f32,
    abort: Option<Receiver>,
    abort_pending: bool,
    /// Seconds since the last valid sample.
    stale: f32,
    blind: bool,
    output: Output,
}

impl InspectionController {
    pub fn new(
        config: &InspectionConfig,
        params: &FlightParameters,
    ) -> Result<Self, config::Error> {
        config.validate()?;
        info!(
            "Inspecting {}m x {}m x {}m structure",
            config.building_length, config.building_breadth, config.building_height
        );
        Ok(Self {
            plan: FlightPlan::new(config, params),
            guidance: Guidance::new(params.guidance),
            stabilizer: Stabilizer::new(&params.pids, params.guidance.hover_throttle),
            gimbal: params.gimbal,
            timeouts: params.timeouts,
            blind_throttle: params.guidance.blind_throttle,
            abort: None,
            abort_pending: false,
            stale: 0.0,
            blind: false,
            output: Output::default(),
        })
    }

    pub fn with_abort(mut self, receiver: Receiver) -> Self {
        self.abort = Some(receiver);
        self
    }

    pub fn plan(&self) -> &FlightPlan {
        &self.plan
    }

    pub fn is_complete(&self) -> bool {
        self.plan.is_complete()
    }

    /// Last computed output, reissued when a tick cannot be computed.
    pub fn last_output(&self) -> &Output {
        &self.output
    }

    /// Whether the controller is descending without sensor data.
    pub fn is_blind(&self) -> bool {
        self.blind
    }

    pub fn abort(&mut self) {
        self.abort_pending = true;
        self.plan.abort()
    }

    fn poll_abort(&mut self) {
        if self.abort.as_ref().map(|receiver| receiver.take()).unwrap_or(false) {
            self.abort();
        }
    }

    /// Reissues the previous command for a tick without a valid sample, falling back to a
    /// blind descent once samples have been missing for too long or an abort is pending.
    fn hold(&mut self, dt: f32) -> Output {
        if dt.is_finite() && dt > 0.0 {
            self.stale += dt;
        }
        let mut events = Events::new();
        let on_ground = self.plan.is_warming_up() || self.plan.is_complete();
        if !self.blind && (self.stale > self.timeouts.sensor || self.abort_pending) {
            self.blind = true;
            let leg_index = self.plan.cursor().leg_index;
            if self.stale > self.timeouts.sensor {
                warn!("No valid sensor sample for {:.1}s, descending blind", self.stale);
                let event = FlightEvent::SensorTimeout { leg_index, elapsed: self.stale };
                events.push(event).ok();
                self.plan.abort();
            } else {
                warn!("Abort without sensor data, descending blind");
            }
        }
        if self.blind {
            self.output.motors = match on_ground {
                true => MotorCommand::IDLE,
                false => mixer::mix(0.0, 0.0, 0.0, self.blind_throttle),
            };
        }
        Output { events, ..self.output.clone() }
    }

    pub fn tick(&mut self, sample: &SensorSample, dt: f32) -> Output {
        self.poll_abort();

        if !sample.is_finite() {
            debug!("Discard non-finite sensor sample");
            return self.hold(dt);
        }
        if self.blind {
            info!("Sensor samples back after {:.1}s", self.stale);
            self.blind = false;
        }
        self.stale = 0.0;
        self.abort_pending = false;

        let Step { setpoint, events } = self.plan.step(sample, dt);
        let target = self.guidance.attitude_target(&setpoint, sample);
        let motors = if self.plan.is_warming_up() || self.plan.is_complete() {
            MotorCommand::IDLE
        } else {
            mixer::mix_axes(&self.stabilizer.update(&target, sample, dt))
        };
        let gimbal = gimbal::stabilize(&sample.attitude, &self.gimbal);
        self.output = Output { motors, gimbal, setpoint, target, events };
        self.output.clone()
    }

    /// Runs one tick against the host: read sensors, compute, hand captures to the sink and
    /// write actuators. A failed sensor read holds the previous command.
    pub fn step<S, A, I>(
        &mut self,
        sensors: &mut S,
        actuators: &mut A,
        sink: &mut I,
        dt: f32,
    ) -> Output
    where
        S: Sensors,
        A: Actuators,
        I: ImageSink,
    {
        self.poll_abort();
        let output = match sensors.read() {
            Ok(sample) => self.tick(&sample, dt),
            Err(e) => {
                debug!("Sensor read failed: {:?}, holding previous command", e);
                self.hold(dt)
            }
        };

        for event in output.events.iter() {
            if let FlightEvent::Capture(capture) = event {
                if let Err(e) = sink.capture(capture) {
                    warn!("Image sink rejected capture {:?}: {:?}", capture, e);
                }
            }
        }

        if let Err(e) = actuators.write(&self.output.motors, &self.output.gimbal) {
            debug!("Actuator write failed: {:?}", e);
        }
        output
    }
}

mod test {
    #[test]
    fn test_invalid_config() {
        use super::InspectionController;
        use crate::config::{Dimension, Error, InspectionConfig};

        let mut config = InspectionConfig::new(20.0, 10.0, 8.0).unwrap();
        config.building_height = 0.0;
        let result = InspectionController::new(&config, &Default::default());
        assert_eq!(result.err(), Some(Error::NonPositive(Dimension::Height)));
    }

    #[test]
    fn test_idle_while_warming_up() {
        use super::InspectionController;
        use crate::config::InspectionConfig;
        use crate::types::{MotorCommand, SensorSample};

        let config = InspectionConfig::new(20.0, 10.0, 8.0).unwrap();
        let mut controller = InspectionController::new(&config, &Default::default()).unwrap();
        let output = controller.tick(&SensorSample::default(), 0.1);
        assert_eq!(output.motors, MotorCommand::IDLE);
        assert!(controller.plan().is_warming_up());
        assert!(output.events.is_empty());
    }

    #[test]
    fn test_hold_on_sensor_failure() {
        use super::InspectionController;
        use crate::config::{FlightParameters, InspectionConfig};
        use crate::hal::{Actuators, ImageSink, Sensors};
        use crate::types::{CaptureEvent, GimbalCommand, MotorCommand, SensorSample};

        struct Flaky(usize);

        impl Sensors for Flaky {
            type Error = ();

            fn read(&mut self) -> Result<SensorSample, ()> {
                self.0 += 1;
                match self.0 {
                    3 => Err(()),
                    _ => Ok(SensorSample::default()),
                }
            }
        }

        #[derive(Default)]
        struct Recorder(std::vec::Vec<MotorCommand>);

        impl Actuators for Recorder {
            type Error = ();

            fn write(&mut self, motors: &MotorCommand, _: &GimbalCommand) -> Result<(), ()> {
                self.0.push(*motors);
                Ok(())
            }
        }

        struct Discard;

        impl ImageSink for Discard {
            type Error = ();

            fn capture(&mut self, _: &CaptureEvent) -> Result<(), ()> {
                Ok(())
            }
        }

        let config = InspectionConfig::new(20.0, 10.0, 8.0).unwrap();
        let mut params = FlightParameters::default();
        params.legs.warm_up = 0.0;
        let mut controller = InspectionController::new(&config, &params).unwrap();
        let (mut sensors, mut actuators) = (Flaky(0), Recorder::default());
        for _ in 0..3 {
            controller.step(&mut sensors, &mut actuators, &mut Discard, 0.02);
        }
        assert_eq!(actuators.0.len(), 3);
        // Climbing on the ground, then the same command held
        assert!(actuators.0[1].total() > 0.0);
        assert_eq!(actuators.0[1], actuators.0[2]);
        assert!(!controller.is_blind());
    }

    #[test]
    fn test_sensor_timeout() {
        use super::InspectionController;
        use crate::config::{FlightParameters, InspectionConfig};
        use crate::hal::{Actuators, ImageSink, Sensors};
        use crate::mission::{FlightEvent, FlightLeg};
        use crate::sync::trigger::trigger;
        use crate::types::{CaptureEvent, GimbalCommand, MotorCommand, SensorSample};

        struct Failing {
            good: usize,
            reads: usize,
        }

        impl Sensors for Failing {
            type Error = ();

            fn read(&mut self) -> Result<SensorSample, ()> {
                self.reads += 1;
                let mut sample = SensorSample::default();
                sample.kinematics.position.z = 1.0;
                match self.reads <= self.good {
                    true => Ok(sample),
                    false => Err(()),
                }
            }
        }

        struct Ignore;

        impl Actuators for Ignore {
            type Error = ();

            fn write(&mut self, _: &MotorCommand, _: &GimbalCommand) -> Result<(), ()> {
                Ok(())
            }
        }

        impl ImageSink for Ignore {
            type Error = ();

            fn capture(&mut self, _: &CaptureEvent) -> Result<(), ()> {
                Ok(())
            }
        }

        let config = InspectionConfig::new(20.0, 10.0, 8.0).unwrap();
        let mut params = FlightParameters::default();
        params.legs.warm_up = 0.0;
        let blind = MotorCommand([params.guidance.blind_throttle; 4]);

        let mut controller = InspectionController::new(&config, &params).unwrap();
        let mut sensors = Failing { good: 5, reads: 0 };
        let mut timeouts = std::vec::Vec::new();
        for _ in 0..500 {
            let output = controller.step(&mut sensors, &mut Ignore, &mut Ignore, 0.02);
            for event in output.events.iter() {
                if let FlightEvent::SensorTimeout { leg_index, elapsed } = event {
                    timeouts.push((*leg_index, *elapsed));
                }
            }
        }
        assert_eq!(timeouts.len(), 1);
        assert_eq!(timeouts[0].0, 0);
        assert!(timeouts[0].1 > 2.0 && timeouts[0].1 < 2.1);
        assert!(controller.is_blind());
        assert_eq!(controller.last_output().motors, blind);

        // Abort honoured well before the sensor timeout
        let (notifier, receiver) = trigger();
        let controller = InspectionController::new(&config, &params).unwrap();
        let mut controller = controller.with_abort(receiver);
        let mut sensors = Failing { good: 5, reads: 0 };
        for _ in 0..10 {
            controller.step(&mut sensors, &mut Ignore, &mut Ignore, 0.02);
        }
        assert!(!controller.is_blind());
        notifier.set();
        let output = controller.step(&mut sensors, &mut Ignore, &mut Ignore, 0.02);
        assert!(output.events.is_empty());
        assert!(controller.is_blind());
        assert_eq!(output.motors, blind);

        // Samples return and the plan lands
        sensors.good = usize::MAX;
        let output = controller.step(&mut sensors, &mut Ignore, &mut Ignore, 0.02);
        assert!(!controller.is_blind());
        assert_eq!(output.events.first(), Some(&FlightEvent::Aborted { leg_index: 0 }));
        let landing = FlightEvent::LegStarted { leg_index: 9, leg: FlightLeg::Land };
        assert!(output.events.contains(&landing));
    }

    #[test]
    fn test_non_finite_sample() {
        use super::InspectionController;
        use crate::config::{FlightParameters, InspectionConfig};
        use crate::types::SensorSample;

        let config = InspectionConfig::new(20.0, 10.0, 8.0).unwrap();
        let mut params = FlightParameters::default();
        params.legs.warm_up = 0.0;
        let mut controller = InspectionController::new(&config, &params).unwrap();
        let first = controller.tick(&SensorSample::default(), 0.02);
        let mut sample = SensorSample::default();
        sample.attitude.roll = f32::NAN;
        let second = controller.tick(&sample, 0.02);
        assert_eq!(first.motors, second.motors);
        assert!(second.events.is_empty());
        assert_eq!(controller.plan().cursor().leg_index, 0);
    }
}
