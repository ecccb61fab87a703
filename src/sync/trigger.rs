use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

/// Raising side of an abort request, usable from another thread or an interrupt.
#[derive(Clone)]
pub struct Notifier(Arc<AtomicBool>);

impl Notifier {
    pub fn set(&self) {
        self.0.as_ref().store(true, Ordering::Relaxed)
    }
}

pub struct Receiver(Arc<AtomicBool>);

impl Receiver {
    pub fn get(&self) -> bool {
        self.0.as_ref().load(Ordering::Relaxed)
    }

    /// Returns whether the trigger was set, clearing it.
    pub fn take(&self) -> bool {
        self.0.as_ref().swap(false, Ordering::Relaxed)
    }
}

pub fn trigger() -> (Notifier, Receiver) {
    let v = Arc::new(AtomicBool::new(false));
    (Notifier(v.clone()), Receiver(v))
}

mod test {
    #[test]
    fn test_trigger() {
        use super::trigger;

        let (notifier, receiver) = trigger();
        assert!(!receiver.get());
        let cloned = notifier.clone();
        std::thread::spawn(move || cloned.set()).join().unwrap();
        assert!(receiver.get());
        assert!(receiver.take());
        assert!(!receiver.take());
    }
}
