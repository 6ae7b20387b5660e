use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Result;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::{
    events::{EnrichedEvent, EventBus},
    queues::{FifoDropOldestQueue, IsolatedForwarder, Latest1Queue, QueueKind, StartupTasks},
    routes::{Route, RouteInbox, Routes},
    workers::{
        FifoInput, FifoReceiver, Latest1Input, SubscriptionSpec, WorkerInputs, WorkerWiring,
    },
};

pub struct BusConfig {
    pub session_id: Uuid,
    /// Panic on events nobody subscribed to. Meant for tests.
    pub strict_routing: bool,
}

impl BusConfig {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            strict_routing: false,
        }
    }

    pub fn strict() -> Self {
        Self {
            strict_routing: true,
            ..Self::new()
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BusMetrics {
    pub unrouted_publish_total: AtomicU64,
}

impl BusMetrics {
    pub fn new() -> Self {
        Self {
            unrouted_publish_total: AtomicU64::new(0),
        }
    }

    pub fn record_unrouted(&self, event_type: &'static str) {
        self.unrouted_publish_total.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(event_type, "Event has no subscribers");
    }

    pub fn unrouted_total(&self) -> u64 {
        self.unrouted_publish_total.load(Ordering::Relaxed)
    }
}

impl Default for BusMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(subs: &[SubscriptionSpec]) -> Result<()> {
    let mut seen_subscribers: HashSet<&'static str> = HashSet::new();
    for s in subs {
        if s.subscriber_id.trim().is_empty() {
            anyhow::bail!("empty subscriber_id");
        }
        if !seen_subscribers.insert(s.subscriber_id) {
            anyhow::bail!("duplicate subscriber_id={}", s.subscriber_id);
        }
        if s.inputs.is_empty() {
            anyhow::bail!("subscriber_id={} has no inputs", s.subscriber_id);
        }

        let mut seen_inputs: HashSet<&'static str> = HashSet::new();
        for i in &s.inputs {
            if i.event_type.trim().is_empty() {
                anyhow::bail!("subscriber_id={} has empty event_type", s.subscriber_id);
            }
            if !seen_inputs.insert(i.event_type) {
                anyhow::bail!(
                    "subscriber_id={} has duplicate input event_type={}",
                    s.subscriber_id,
                    i.event_type
                );
            }

            match i.queue_kind {
                QueueKind::Latest1 => {}
                QueueKind::FifoDropOldest { capacity } => {
                    anyhow::ensure!(capacity > 0, "capacity must be > 0")
                }
                QueueKind::Isolated { output_buffer } => {
                    anyhow::ensure!(output_buffer > 0, "output_buffer must be > 0")
                }
            }
        }
    }
    Ok(())
}

pub struct EventBusBuilder {
    cfg: BusConfig,
    subs: Vec<SubscriptionSpec>,
}

impl EventBusBuilder {
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            cfg,
            subs: Vec::new(),
        }
    }

    pub fn subscribe(mut self, s: SubscriptionSpec) -> Self {
        self.subs.push(s);
        self
    }

    pub fn build(self) -> Result<(EventBus, WorkerWiring, StartupTasks)> {
        validate(&self.subs)?;

        let mut routes = Routes::new();
        let mut wiring: HashMap<&'static str, WorkerInputs> = HashMap::new();
        let mut tasks = StartupTasks { tokio: Vec::new() };
        let metrics = Arc::new(BusMetrics::new());

        for spec in self.subs {
            let notify_any = Arc::new(Notify::new());
            let mut latest = Vec::new();
            let mut fifos = Vec::new();

            for input in spec.inputs {
                match input.queue_kind {
                    QueueKind::Latest1 => {
                        let q = Arc::new(Latest1Queue::new(Arc::clone(&notify_any)));
                        routes.add(
                            input.event_type,
                            Route::new(spec.subscriber_id, RouteInbox::Latest1(Arc::clone(&q))),
                        );
                        latest.push(Latest1Input {
                            event_type: input.event_type,
                            queue: q,
                        });
                    }
                    QueueKind::FifoDropOldest { capacity } => {
                        let q =
                            Arc::new(FifoDropOldestQueue::new(capacity, Arc::clone(&notify_any)));
                        routes.add(
                            input.event_type,
                            Route::new(spec.subscriber_id, RouteInbox::FifoDropOldest(Arc::clone(&q))),
                        );
                        fifos.push(FifoInput {
                            event_type: input.event_type,
                            receiver: FifoReceiver::FifoDropOldest(q.receiver()),
                        });
                    }
                    QueueKind::Isolated { output_buffer } => {
                        let (fwd, out_rx, drain_task) =
                            IsolatedForwarder::<Arc<EnrichedEvent>>::new(
                                output_buffer,
                                Arc::clone(&notify_any),
                            );
                        tasks.tokio.push(drain_task);

                        routes.add(
                            input.event_type,
                            Route::new(spec.subscriber_id, RouteInbox::Isolated(fwd)),
                        );

                        fifos.push(FifoInput {
                            event_type: input.event_type,
                            receiver: FifoReceiver::Isolated(out_rx),
                        });
                    }
                }
            }

            tracing::debug!(
                subscriber_id = spec.subscriber_id,
                latest = latest.len(),
                fifos = fifos.len(),
                "Subscriber wired"
            );
            wiring.insert(
                spec.subscriber_id,
                WorkerInputs {
                    latest,
                    fifos,
                    notify_any,
                    fifo_index: 0,
                },
            );
        }

        let bus = EventBus::new(self.cfg, routes, metrics);
        Ok((bus, WorkerWiring::new(wiring), tasks))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Serialize;

    use super::*;
    use crate::{
        events::{EventHeader, downcast_ref},
        impl_event,
        workers::{InputSpec, WorkerBatch},
    };

    #[derive(Serialize)]
    struct Ping {
        header: EventHeader,
        n: u32,
    }

    impl Ping {
        const EVENT_TYPE: &'static str = "test.ping";

        fn new(n: u32) -> Self {
            Self {
                header: EventHeader::new(),
                n,
            }
        }
    }

    impl_event!(Ping);

    fn spec(id: &'static str, queue_kind: QueueKind) -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: id,
            inputs: vec![InputSpec {
                event_type: Ping::EVENT_TYPE,
                queue_kind,
            }],
        }
    }

    fn ping_n(batch: WorkerBatch) -> Vec<u32> {
        let events = match batch {
            WorkerBatch::Snapshots(updates) => updates.into_iter().map(|u| u.event).collect(),
            WorkerBatch::FifoItem { event, .. } => vec![event],
        };
        events
            .iter()
            .filter_map(|e| downcast_ref::<Ping>(&e.event).map(|p| p.n))
            .collect()
    }

    #[test]
    fn rejects_duplicate_subscribers_and_empty_inputs() {
        let dup = EventBusBuilder::new(BusConfig::new())
            .subscribe(spec("a", QueueKind::Latest1))
            .subscribe(spec("a", QueueKind::Latest1))
            .build();
        assert!(dup.is_err());

        let empty = EventBusBuilder::new(BusConfig::new())
            .subscribe(SubscriptionSpec {
                subscriber_id: "b",
                inputs: Vec::new(),
            })
            .build();
        assert!(empty.is_err());

        let zero = EventBusBuilder::new(BusConfig::new())
            .subscribe(spec("c", QueueKind::FifoDropOldest { capacity: 0 }))
            .build();
        assert!(zero.is_err());
    }

    #[tokio::test]
    async fn latest_queue_keeps_only_newest() {
        let (bus, mut wiring, _tasks) = EventBusBuilder::new(BusConfig::new())
            .subscribe(spec("latest", QueueKind::Latest1))
            .build()
            .unwrap();
        let mut inputs = wiring.take("latest").unwrap();

        for n in 0..5 {
            bus.publish(Arc::new(Ping::new(n)));
        }
        assert_eq!(ping_n(inputs.next().await), vec![4]);
    }

    #[tokio::test]
    async fn fifo_queue_drops_oldest_past_capacity() {
        let (bus, mut wiring, _tasks) = EventBusBuilder::new(BusConfig::new())
            .subscribe(spec("fifo", QueueKind::FifoDropOldest { capacity: 2 }))
            .build()
            .unwrap();
        let mut inputs = wiring.take("fifo").unwrap();

        for n in 0..4 {
            bus.publish(Arc::new(Ping::new(n)));
        }
        assert_eq!(ping_n(inputs.next().await), vec![2]);
        assert_eq!(ping_n(inputs.next().await), vec![3]);
    }

    #[tokio::test]
    async fn isolated_queue_delivers_through_drain_task() {
        let (bus, mut wiring, tasks) = EventBusBuilder::new(BusConfig::new())
            .subscribe(spec("iso", QueueKind::Isolated { output_buffer: 4 }))
            .build()
            .unwrap();
        for t in tasks.tokio {
            tokio::spawn(t);
        }
        let mut inputs = wiring.take("iso").unwrap();

        bus.publish(Arc::new(Ping::new(7)));
        assert_eq!(ping_n(inputs.next().await), vec![7]);
        assert_eq!(bus.drops_for("iso"), 0);
    }

    #[test]
    fn unrouted_events_are_counted() {
        let (bus, _wiring, _tasks) = EventBusBuilder::new(BusConfig::new()).build().unwrap();
        bus.publish(Arc::new(Ping::new(1)));
        assert_eq!(bus.metrics().unrouted_total(), 1);
    }

    #[test]
    #[should_panic(expected = "Unrouted event type")]
    fn strict_routing_panics_on_unrouted() {
        let (bus, _wiring, _tasks) = EventBusBuilder::new(BusConfig::strict()).build().unwrap();
        bus.publish(Arc::new(Ping::new(1)));
    }
}
