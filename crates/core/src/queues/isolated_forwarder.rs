use std::{pin::Pin, sync::Arc};

use tokio::sync::{Notify, mpsc};

const INBOX_CAPACITY: usize = 16;

pub type StartupTask = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Tasks produced while building the bus; spawn them before anything
/// publishes.
pub struct StartupTasks {
    pub tokio: Vec<StartupTask>,
}

/// Decouples the publisher from a slow subscriber: the bus only ever
/// `try_send`s into a small inbox, and a dedicated task moves items into the
/// subscriber's buffer, waking it for each one.
pub struct IsolatedForwarder<T> {
    inbox_tx: mpsc::Sender<T>,
}

impl<T: Send + 'static> IsolatedForwarder<T> {
    pub fn new(
        output_buffer: usize,
        notify_any: Arc<Notify>,
    ) -> (IsolatedForwarder<T>, mpsc::Receiver<T>, StartupTask) {
        let (inbox_tx, mut inbox_rx) = mpsc::channel::<T>(INBOX_CAPACITY);
        let (out_tx, out_rx) = mpsc::channel::<T>(output_buffer);

        let drain_task = Box::pin(async move {
            while let Some(value) = inbox_rx.recv().await {
                if out_tx.send(value).await.is_err() {
                    tracing::debug!("Isolated subscriber gone, stopping forwarder");
                    break;
                }
                notify_any.notify_one();
            }
        });

        (IsolatedForwarder { inbox_tx }, out_rx, drain_task)
    }

    pub fn try_send(&self, value: T) -> Result<(), T> {
        self.inbox_tx.try_send(value).map_err(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_in_order() {
        let (fwd, mut rx, task) = IsolatedForwarder::new(4, Arc::new(Notify::new()));
        tokio::spawn(task);
        fwd.try_send(1).unwrap();
        fwd.try_send(2).unwrap();
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[test]
    fn full_inbox_hands_value_back() {
        let (fwd, _rx, _task) = IsolatedForwarder::new(1, Arc::new(Notify::new()));
        for n in 0..INBOX_CAPACITY {
            fwd.try_send(n).unwrap();
        }
        assert_eq!(fwd.try_send(99), Err(99));
    }
}
