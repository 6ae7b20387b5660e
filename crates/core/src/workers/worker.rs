use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{
    events::{EnrichedEvent, EventBus},
    workers::{SubscriptionSpec, WorkerBatch, WorkerFailed, WorkerInputs},
};

/// One task on the bus, fed only through its own inputs.
///
/// `handle` errors are published as `WorkerFailed` and the loop keeps going.
#[async_trait]
pub trait Worker: Send + Sized + 'static {
    const SUBSCRIBER_ID: &'static str;

    fn subscription() -> SubscriptionSpec;

    /// Runs once before the first event.
    async fn on_start(&mut self, _bus: &EventBus) -> Result<()> {
        Ok(())
    }

    async fn handle(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) -> Result<()>;

    /// Runs once after shutdown is signalled.
    async fn on_stop(&mut self, _bus: &EventBus) {}

    async fn run(
        mut self,
        mut inputs: WorkerInputs,
        bus: Arc<EventBus>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        tracing::debug!(worker = Self::SUBSCRIBER_ID, "Worker started");
        if let Err(e) = self.on_start(&bus).await {
            tracing::error!(worker = Self::SUBSCRIBER_ID, error = %e, "Worker failed to start");
            return Err(e);
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    self.on_stop(&bus).await;
                    tracing::debug!(worker = Self::SUBSCRIBER_ID, "Worker stopped");
                    return Ok(());
                }
                batch = inputs.next() => match batch {
                    WorkerBatch::Snapshots(updates) => {
                        for update in updates {
                            self.dispatch(update.event, &bus).await;
                        }
                    }
                    WorkerBatch::FifoItem { event, .. } => self.dispatch(event, &bus).await,
                }
            }
        }
    }

    async fn dispatch(&mut self, event: Arc<EnrichedEvent>, bus: &EventBus) {
        let parent = Arc::clone(&event.event);
        if let Err(e) = self.handle(event, bus).await {
            tracing::warn!(
                worker = Self::SUBSCRIBER_ID,
                event_type = parent.event_type(),
                error = %e,
                "Worker failed to handle event"
            );
            bus.publish(Arc::new(WorkerFailed::new(
                &parent,
                Self::SUBSCRIBER_ID,
                format!("{e:#}"),
            )));
        }
    }
}
