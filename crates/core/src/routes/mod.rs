use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    events::EnrichedEvent,
    queues::{FifoDropOldestQueue, IsolatedForwarder, Latest1Queue},
};

/// Event type to the inboxes subscribed to it.
#[derive(Default)]
pub struct Routes {
    table: HashMap<&'static str, Vec<Route>>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event_type: &'static str, route: Route) {
        self.table.entry(event_type).or_default().push(route);
    }

    /// `None` when nobody subscribed to `event_type`.
    pub fn for_type(&self, event_type: &str) -> Option<&[Route]> {
        self.table.get(event_type).map(Vec::as_slice)
    }

    pub fn subscribers_of(&self, event_type: &str) -> Vec<&'static str> {
        self.for_type(event_type)
            .map(|routes| routes.iter().map(|r| r.subscriber_id).collect())
            .unwrap_or_default()
    }

    /// Lost deliveries for `subscriber_id` across all its inputs.
    pub fn drops_for(&self, subscriber_id: &str) -> u64 {
        self.table
            .values()
            .flatten()
            .filter(|r| r.subscriber_id == subscriber_id)
            .map(Route::drops)
            .sum()
    }
}

pub struct Route {
    pub subscriber_id: &'static str,
    inbox: RouteInbox,
    drops_total: AtomicU64,
}

impl Route {
    pub fn new(subscriber_id: &'static str, inbox: RouteInbox) -> Self {
        Self {
            subscriber_id,
            inbox,
            drops_total: AtomicU64::new(0),
        }
    }

    /// Hands `event` to the inbox, counting it when it was lost.
    pub fn deliver(&self, event: Arc<EnrichedEvent>) -> bool {
        let delivered = self.inbox.try_deliver(event);
        if !delivered {
            self.drops_total.fetch_add(1, Ordering::Relaxed);
        }
        delivered
    }

    pub fn drops(&self) -> u64 {
        self.drops_total.load(Ordering::Relaxed)
    }
}

pub enum RouteInbox {
    Latest1(Arc<Latest1Queue<Arc<EnrichedEvent>>>),
    FifoDropOldest(Arc<FifoDropOldestQueue<Arc<EnrichedEvent>>>),
    Isolated(IsolatedForwarder<Arc<EnrichedEvent>>),
}

impl RouteInbox {
    /// Returns `false` when delivering lost an event: a FIFO eviction or a
    /// full isolated inbox. A superseded latest value is not a loss.
    fn try_deliver(&self, event: Arc<EnrichedEvent>) -> bool {
        match self {
            RouteInbox::Latest1(q) => {
                q.set(event);
                true
            }
            RouteInbox::FifoDropOldest(q) => q.push_overwrite(event).is_none(),
            RouteInbox::Isolated(fwd) => fwd.try_send(event).is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use tokio::{sync::Notify, time::Instant};
    use uuid::Uuid;

    use super::*;
    use crate::{events::EventHeader, impl_event};

    #[derive(Serialize)]
    struct Ping {
        header: EventHeader,
    }

    impl Ping {
        const EVENT_TYPE: &'static str = "test.ping";
    }

    impl_event!(Ping);

    fn enriched(seq: u64) -> Arc<EnrichedEvent> {
        Arc::new(EnrichedEvent {
            event: Arc::new(Ping {
                header: EventHeader::new(),
            }),
            session_id: Uuid::new_v4(),
            ingest_seq: seq,
            ingested_at: Instant::now(),
        })
    }

    #[test]
    fn fifo_evictions_are_counted_per_subscriber() {
        let notify = Arc::new(Notify::new());
        let fifo = Arc::new(FifoDropOldestQueue::new(1, Arc::clone(&notify)));
        let latest = Arc::new(Latest1Queue::new(notify));

        let mut routes = Routes::new();
        routes.add(
            "test.ping",
            Route::new("panel", RouteInbox::FifoDropOldest(fifo)),
        );
        routes.add("test.ping", Route::new("sink", RouteInbox::Latest1(latest)));

        for seq in 0..3 {
            for route in routes.for_type("test.ping").unwrap() {
                route.deliver(enriched(seq));
            }
        }

        assert_eq!(routes.drops_for("panel"), 2);
        assert_eq!(routes.drops_for("sink"), 0);
        assert_eq!(routes.subscribers_of("test.ping"), vec!["panel", "sink"]);
        assert!(routes.for_type("test.other").is_none());
    }
}
