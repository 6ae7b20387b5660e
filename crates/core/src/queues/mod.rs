pub mod fifo_drop_oldest_queue;
pub mod isolated_forwarder;
pub mod latest1_queue;

pub use fifo_drop_oldest_queue::*;
pub use isolated_forwarder::*;
pub use latest1_queue::*;

/// How a subscriber's inbox behaves for one event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    /// Only the newest undelivered event is kept. Used for playback time.
    Latest1,
    /// Bounded FIFO that evicts the oldest entry when full.
    FifoDropOldest { capacity: usize },
    /// Bounded channel drained by its own task; a full inbox drops the new
    /// event and counts it.
    Isolated { output_buffer: usize },
}
