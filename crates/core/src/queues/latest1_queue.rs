use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

/// Single-slot mailbox: a newer value replaces an unread one.
pub struct Latest1Queue<T> {
    slot: Mutex<Option<T>>,
    notify_any: Arc<Notify>,
}

impl<T> Latest1Queue<T> {
    pub fn new(notify_any: Arc<Notify>) -> Self {
        Self {
            slot: Mutex::new(None),
            notify_any,
        }
    }

    /// Stores `value`; returns whether an unread value was superseded.
    pub fn set(&self, value: T) -> bool {
        let superseded = self
            .slot
            .lock()
            .expect("Latest1Queue poisoned")
            .replace(value)
            .is_some();
        self.notify_any.notify_one();
        superseded
    }

    pub fn try_recv(&self) -> Option<T> {
        self.slot.lock().expect("Latest1Queue poisoned").take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_value_supersedes_unread_one() {
        let q = Latest1Queue::new(Arc::new(Notify::new()));
        assert!(!q.set(1.0));
        assert!(q.set(2.0));
        assert_eq!(q.try_recv(), Some(2.0));
        assert_eq!(q.try_recv(), None);
    }
}
