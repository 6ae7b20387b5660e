use std::sync::Arc;

use serde::Serialize;

use crate::{
    events::{Event, EventHeader},
    impl_event,
};

/// A worker's `handle` returned an error for some event.
#[derive(Clone, Debug, Serialize)]
pub struct WorkerFailed {
    pub header: EventHeader,
    pub subscriber_id: &'static str,
    pub failed_event_type: &'static str,
    pub message: String,
}

impl WorkerFailed {
    pub const EVENT_TYPE: &'static str = "worker.failed";

    pub fn new(event: &Arc<dyn Event>, subscriber_id: &'static str, message: String) -> Self {
        Self {
            header: EventHeader::caused_by(event.event_id()),
            subscriber_id,
            failed_event_type: event.event_type(),
            message,
        }
    }
}

impl_event!(WorkerFailed);
