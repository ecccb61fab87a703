use fugit::NanosDurationU64 as Duration;
use heapless::Vec;
use nalgebra::Vector3;

use crate::types::CaptureEvent;

pub const MAX_CAPTURES: usize = 8;

pub type Captures = Vec<CaptureEvent, MAX_CAPTURES>;

/// Triggers evenly spaced photos along one strafe leg, at `distance * k / count` for
/// k = 1..=count. Each threshold fires once.
#[derive(Clone, Debug)]
pub struct CaptureScheduler {
    leg_index: usize,
    thresholds: Vec<f32, MAX_CAPTURES>,
    taken: usize,
}

impl CaptureScheduler {
    pub fn new(leg_index: usize, distance: f32, count: u8) -> Self {
        let count = (count as usize).clamp(1, MAX_CAPTURES);
        let mut thresholds = Vec::new();
        for k in 1..count {
            thresholds.push(distance * k as f32 / count as f32).ok();
        }
        // Exact, so the last photo fires on the tick the leg completes
        thresholds.push(distance).ok();
        Self { leg_index, thresholds, taken: 0 }
    }

    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    pub fn taken(&self) -> usize {
        self.taken
    }

    pub fn is_done(&self) -> bool {
        self.taken >= self.thresholds.len()
    }

    pub fn update(
        &mut self,
        distance: f32,
        position: Vector3<f32>,
        timestamp: Duration,
    ) -> Captures {
        let mut captures = Captures::new();
        while let Some(&threshold) = self.thresholds.get(self.taken) {
            if !(distance >= threshold) {
                break;
            }
            self.taken += 1;
            let event = CaptureEvent {
                leg_index: self.leg_index,
                sequence_number: self.taken as u8,
                position,
                timestamp,
            };
            captures.push(event).ok();
        }
        captures
    }
}

mod test {
    #[test]
    fn test_thresholds() {
        use pretty_assertions::assert_eq;

        use super::CaptureScheduler;

        let scheduler = CaptureScheduler::new(2, 20.0, 4);
        assert_eq!(scheduler.thresholds(), &[5.0, 10.0, 15.0, 20.0]);
        let scheduler = CaptureScheduler::new(2, 10.0, 0);
        assert_eq!(scheduler.thresholds(), &[10.0]);
    }

    #[test]
    fn test_fire_once() {
        use fugit::NanosDurationU64 as Duration;
        use nalgebra::Vector3;

        use super::CaptureScheduler;

        let mut scheduler = CaptureScheduler::new(2, 20.0, 4);
        let position = Vector3::zeros();
        let timestamp = Duration::millis(0);
        let mut sequence = std::vec::Vec::new();
        let mut distance = 0.0;
        while distance <= 21.0 {
            for capture in scheduler.update(distance, position, timestamp) {
                sequence.push((capture.sequence_number, distance));
            }
            distance += 0.25;
        }
        let numbers: std::vec::Vec<u8> = sequence.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, [1, 2, 3, 4]);
        let distances: std::vec::Vec<f32> = sequence.iter().map(|(_, d)| *d).collect();
        assert_eq!(distances, [5.0, 10.0, 15.0, 20.0]);
        assert!(scheduler.is_done());

        // Going backwards and forwards again does not re-trigger
        assert!(scheduler.update(3.0, position, timestamp).is_empty());
        assert!(scheduler.update(20.0, position, timestamp).is_empty());
    }

    #[test]
    fn test_skip_ahead() {
        use fugit::NanosDurationU64 as Duration;
        use nalgebra::Vector3;

        use super::CaptureScheduler;

        let mut scheduler = CaptureScheduler::new(4, 10.0, 4);
        let captures = scheduler.update(5.1, Vector3::zeros(), Duration::millis(10));
        assert_eq!(captures.len(), 2);
        assert_eq!(captures[0].sequence_number, 1);
        assert_eq!(captures[1].sequence_number, 2);
        assert_eq!(captures[1].leg_index, 4);
        assert!(scheduler.update(f32::NAN, Vector3::zeros(), Duration::millis(20)).is_empty());
        assert_eq!(scheduler.taken(), 2);
    }

    #[test]
    fn test_last_threshold_is_distance() {
        use fugit::NanosDurationU64 as Duration;
        use nalgebra::Vector3;

        use super::CaptureScheduler;

        for &distance in [1.8769, 0.1, 7.3, 19.99, 33.333].iter() {
            for count in 1..=8 {
                let mut scheduler = CaptureScheduler::new(2, distance, count);
                assert_eq!(scheduler.thresholds().last(), Some(&distance));
                let thresholds = scheduler.thresholds();
                assert!(thresholds.windows(2).all(|pair| pair[0] < pair[1]));
                let captures = scheduler.update(distance, Vector3::zeros(), Duration::millis(0));
                assert_eq!(captures.len(), count as usize);
            }
        }
    }
}
