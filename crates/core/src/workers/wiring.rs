use std::collections::HashMap;

use anyhow::Result;

use crate::{queues::QueueKind, workers::WorkerInputs};

pub struct SubscriptionSpec {
    pub subscriber_id: &'static str,
    pub inputs: Vec<InputSpec>,
}

pub struct InputSpec {
    pub event_type: &'static str,
    pub queue_kind: QueueKind,
}

impl InputSpec {
    pub fn latest(event_type: &'static str) -> Self {
        Self {
            event_type,
            queue_kind: QueueKind::Latest1,
        }
    }

    pub fn fifo(event_type: &'static str, capacity: usize) -> Self {
        Self {
            event_type,
            queue_kind: QueueKind::FifoDropOldest { capacity },
        }
    }
}

/// Per-subscriber inputs produced by the bus builder, handed out once.
pub struct WorkerWiring {
    inputs: HashMap<&'static str, WorkerInputs>,
}

impl WorkerWiring {
    pub fn new(inputs: HashMap<&'static str, WorkerInputs>) -> Self {
        Self { inputs }
    }

    pub fn take(&mut self, subscriber_id: &'static str) -> Option<WorkerInputs> {
        self.inputs.remove(subscriber_id)
    }

    pub fn require(&mut self, subscriber_id: &'static str) -> Result<WorkerInputs> {
        self.take(subscriber_id)
            .ok_or_else(|| anyhow::anyhow!("no wiring for subscriber_id={}", subscriber_id))
    }
}
