#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;
extern crate drone_inspector;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::mpsc::{channel, Sender};
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use drone_inspector::config::{FlightParameters, InspectionConfig};
use drone_inspector::hal::{Actuators, ImageSink, Sensors};
use drone_inspector::types::control::{FRONT_LEFT, FRONT_RIGHT, REAR_LEFT, REAR_RIGHT};
use drone_inspector::types::measurement::{compose, wrap};
use drone_inspector::types::{CaptureEvent, GimbalCommand, MotorCommand, SensorSample};

const GRAVITY: f32 = 9.80665;

/// Point-mass quadrotor with first-order attitude response.
#[derive(Copy, Clone, Debug)]
pub struct Dynamics {
    /// Mean motor output that balances gravity on a level airframe.
    pub hover_throttle: f32,
    /// Roll and pitch rate in rad/s per unit of axis command.
    pub tilt_response: f32,
    /// Yaw rate in rad/s per unit of axis command.
    pub yaw_response: f32,
    /// Time constant of the yaw rate response in seconds.
    pub yaw_lag: f32,
    /// Linear drag in 1/s.
    pub drag: f32,
}

impl Default for Dynamics {
    fn default() -> Self {
        let (tilt_response, yaw_response) = (8.0, 2.0);
        Self { hover_throttle: 0.5, tilt_response, yaw_response, yaw_lag: 0.1, drag: 0.3 }
    }
}

pub struct Model {
    dynamics: Dynamics,
    sample: SensorSample,
}

impl Model {
    pub fn new(dynamics: Dynamics) -> Self {
        Self { dynamics, sample: SensorSample::default() }
    }

    pub fn sample(&self) -> &SensorSample {
        &self.sample
    }

    pub fn sample_mut(&mut self) -> &mut SensorSample {
        &mut self.sample
    }

    pub fn apply(&mut self, command: &MotorCommand, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let m = &command.0;
        let roll = (m[FRONT_LEFT] - m[FRONT_RIGHT] + m[REAR_LEFT] - m[REAR_RIGHT]) / 4.0;
        let pitch = (m[FRONT_LEFT] + m[FRONT_RIGHT] - m[REAR_LEFT] - m[REAR_RIGHT]) / 4.0;
        let yaw = (m[FRONT_LEFT] - m[FRONT_RIGHT] - m[REAR_LEFT] + m[REAR_RIGHT]) / 4.0;
        let throttle = command.total() / 4.0;

        let d = &self.dynamics;
        let attitude = &mut self.sample.attitude;
        attitude.roll_rate = d.tilt_response * roll;
        attitude.pitch_rate = d.tilt_response * pitch;
        let lag = (dt / d.yaw_lag).min(1.0);
        attitude.yaw_rate += (d.yaw_response * yaw - attitude.yaw_rate) * lag;
        attitude.roll += attitude.roll_rate * dt;
        attitude.pitch += attitude.pitch_rate * dt;
        attitude.yaw = wrap(attitude.yaw + attitude.yaw_rate * dt);

        let lift = throttle / d.hover_throttle * attitude.roll.cos() * attitude.pitch.cos();
        let (forward, right) = (-GRAVITY * attitude.pitch, GRAVITY * attitude.roll);
        let horizontal = compose(forward, right, attitude.yaw);
        let kinematics = &mut self.sample.kinematics;
        let velocity = &mut kinematics.velocity;
        velocity.x += (horizontal.x - d.drag * velocity.x) * dt;
        velocity.y += (horizontal.y - d.drag * velocity.y) * dt;
        velocity.z += (GRAVITY * (lift - 1.0) - d.drag * velocity.z) * dt;
        kinematics.position += *velocity * dt;

        if kinematics.position.z <= 0.0 {
            kinematics.position.z = 0.0;
            kinematics.velocity.fill(0.0);
        }
        trace!("Model {:?}", self.sample);
    }
}

impl Sensors for Model {
    type Error = ();

    fn read(&mut self) -> Result<SensorSample, ()> {
        Ok(self.sample)
    }
}

/// Holds the last command written, like an ESC between updates.
#[derive(Default)]
pub struct Latch {
    pub motors: MotorCommand,
    pub gimbal: GimbalCommand,
}

impl Actuators for Latch {
    type Error = ();

    fn write(&mut self, motors: &MotorCommand, gimbal: &GimbalCommand) -> Result<(), ()> {
        self.motors = *motors;
        self.gimbal = *gimbal;
        Ok(())
    }
}

#[derive(Serialize)]
struct Record {
    name: String,
    recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    event: CaptureEvent,
}

fn save(directory: &Path, record: &Record) -> io::Result<()> {
    let path = directory.join(format!("{}.json", record.name));
    serde_json::to_writer_pretty(File::create(&path)?, record)?;
    info!("Saved {}", path.display());
    Ok(())
}

/// Writes one JSON record per capture, named `capture_0001.json` onwards.
///
/// Records are queued to a writer thread so `capture` never waits on the filesystem.
pub struct FileSink {
    sender: Sender<Record>,
    worker: JoinHandle<usize>,
    count: usize,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(directory: P) -> io::Result<Self> {
        std::fs::create_dir_all(directory.as_ref())?;
        let directory = directory.as_ref().to_path_buf();
        let (sender, receiver) = channel::<Record>();
        let worker = std::thread::Builder::new().name("capture-writer".to_owned()).spawn(
            move || {
                let mut saved = 0;
                for record in receiver.iter() {
                    match save(&directory, &record) {
                        Ok(()) => saved += 1,
                        Err(e) => warn!("Save {} failed: {}", record.name, e),
                    }
                }
                saved
            },
        )?;
        Ok(Self { sender, worker, count: 0 })
    }

    /// Number of captures queued so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Waits for every queued record to be written and returns how many were saved.
    pub fn finish(self) -> io::Result<usize> {
        drop(self.sender);
        self.worker.join().map_err(|_| io::Error::new(io::ErrorKind::Other, "writer panicked"))
    }
}

impl ImageSink for FileSink {
    type Error = io::Error;

    fn capture(&mut self, event: &CaptureEvent) -> io::Result<()> {
        let name = format!("capture_{:04}", self.count + 1);
        let record = Record { name, recorded_at: Utc::now(), event: *event };
        self.sender.send(record).map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        self.count += 1;
        Ok(())
    }
}

fn read_file(path: &str) -> Result<String, String> {
    let mut file = File::open(path).map_err(|e| format!("Read file {} failed: {}", path, e))?;
    let mut buffer = String::new();
    file.read_to_string(&mut buffer).map_err(|_| format!("Unable to read {}", path))?;
    Ok(buffer)
}

pub fn load_config(path: &str) -> Result<InspectionConfig, String> {
    let buffer = read_file(path)?;
    let config: InspectionConfig =
        serde_json::from_str(&buffer).map_err(|e| format!("Invalid config {}: {}", path, e))?;
    config.validate().map_err(|e| format!("Invalid config {}: {}", path, e))?;
    Ok(config)
}

pub fn load_parameters(path: &str) -> Result<FlightParameters, String> {
    let buffer = read_file(path)?;
    serde_json::from_str(&buffer).map_err(|e| format!("Invalid parameters {}: {}", path, e))
}

mod test {
    #[test]
    fn test_hover_equilibrium() {
        use drone_inspector::types::MotorCommand;

        use super::{Dynamics, Model};

        let mut model = Model::new(Dynamics::default());
        model.sample_mut().kinematics.position.z = 4.0;
        let command = MotorCommand([0.5; 4]);
        for _ in 0..100 {
            model.apply(&command, 0.01);
        }
        let sample = model.sample();
        assert!((sample.kinematics.position.z - 4.0).abs() < 1e-4);
        assert!(sample.kinematics.position.xy().norm() < 1e-6);
        assert_eq!(sample.attitude.roll, 0.0);
    }

    #[test]
    fn test_ground_contact() {
        use drone_inspector::types::MotorCommand;

        use super::{Dynamics, Model};

        let mut model = Model::new(Dynamics::default());
        model.apply(&MotorCommand::IDLE, 0.1);
        assert_eq!(model.sample().kinematics.position.z, 0.0);
        assert_eq!(model.sample().kinematics.velocity.z, 0.0);
    }

    #[test]
    fn test_roll_moves_right() {
        use drone_inspector::fcs::mixer::mix;

        use super::{Dynamics, Model};

        // Facing north, right is east
        let mut model = Model::new(Dynamics::default());
        model.sample_mut().kinematics.position.z = 10.0;
        for _ in 0..10 {
            model.apply(&mix(0.05, 0.0, 0.0, 0.5), 0.01);
        }
        let sample = model.sample();
        assert!(sample.attitude.roll > 0.0);
        assert!(sample.kinematics.velocity.y > 0.0);
        assert!(sample.kinematics.velocity.x.abs() < 1e-6);
    }

    #[test]
    fn test_file_sink() {
        use drone_inspector::hal::ImageSink;
        use drone_inspector::types::CaptureEvent;
        use fugit::NanosDurationU64 as Duration;
        use nalgebra::Vector3;

        use super::FileSink;

        let directory = std::env::temp_dir().join(format!("inspection-{}", std::process::id()));
        let mut sink = FileSink::new(&directory).unwrap();
        let position = Vector3::new(1.0, 2.0, 4.0);
        let timestamp = Duration::millis(1500);
        let event = CaptureEvent { leg_index: 2, sequence_number: 1, position, timestamp };
        sink.capture(&event).unwrap();
        sink.capture(&event).unwrap();
        assert_eq!(sink.count(), 2);
        assert_eq!(sink.finish().unwrap(), 2);

        let text = std::fs::read_to_string(directory.join("capture_0002.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["name"], "capture_0002");
        assert_eq!(json["leg_index"], 2);
        assert_eq!(json["timestamp"], 1500);
        std::fs::remove_dir_all(&directory).ok();
    }

    #[test]
    fn test_load_config() {
        use super::load_config;

        let path = std::env::temp_dir().join(format!("config-{}.json", std::process::id()));
        let path = path.to_str().unwrap();
        let text = r#"{"building_length": 20.0, "building_breadth": 10.0, "building_height": 8.0}"#;
        std::fs::write(path, text).unwrap();
        let config = load_config(path).unwrap();
        assert_eq!(config.building_height, 8.0);

        std::fs::write(path, r#"{"building_length": 20.0}"#).unwrap();
        assert!(load_config(path).is_err());
        std::fs::write(path, text.replace("8.0", "-1.0")).unwrap();
        assert!(load_config(path).is_err());
        std::fs::remove_file(path).ok();
        assert!(load_config(path).is_err());
    }
}
