use crate::types::CaptureEvent;

/// Receives capture requests. Implementations must not block: encoding and storage belong to
/// the sink, not to the control tick.
pub trait ImageSink {
    type Error: core::fmt::Debug;

    fn capture(&mut self, event: &CaptureEvent) -> Result<(), Self::Error>;
}
