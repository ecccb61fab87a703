use fugit::NanosDurationU64 as Duration;
use nalgebra::Vector3;
use serde::Serializer;

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.to_millis())
}

/// One triggered photo. Immutable once emitted.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct CaptureEvent {
    pub leg_index: usize,
    /// 1-based position of this photo within its strafe leg.
    pub sequence_number: u8,
    pub position: Vector3<f32>,
    /// Mission time since controller start.
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: Duration,
}

mod test {
    #[test]
    fn test_serialize_capture_event() {
        use fugit::NanosDurationU64 as Duration;
        use nalgebra::Vector3;
        use pretty_assertions::assert_eq;

        use super::CaptureEvent;

        let event = CaptureEvent {
            leg_index: 2,
            sequence_number: 3,
            position: Vector3::new(1.0, 15.0, 4.0),
            timestamp: Duration::millis(12_500),
        };
        let json = serde_json::to_string(&event).unwrap();
        let expected = concat!(
            r#"{"leg_index":2,"sequence_number":3,"#,
            r#""position":[1.0,15.0,4.0],"timestamp":12500}"#
        );
        assert_eq!(expected, json.as_str());
    }
}
