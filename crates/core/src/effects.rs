use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Guards async results against the subject changing mid-flight.
///
/// Take a ticket before starting a fetch; when the result comes back, apply it
/// only if the ticket is still current. `invalidate` (video switched, panel
/// dropped) turns every outstanding ticket stale. The network request itself
/// is not cancelled.
#[derive(Debug, Clone, Default)]
pub struct EffectGeneration {
    current: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectTicket(u64);

impl EffectGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticket(&self) -> EffectTicket {
        EffectTicket(self.current.load(Ordering::Acquire))
    }

    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_current(&self, ticket: EffectTicket) -> bool {
        self.current.load(Ordering::Acquire) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_go_stale_after_invalidate() {
        let generation = EffectGeneration::new();
        let first = generation.ticket();
        assert!(generation.is_current(first));

        generation.invalidate();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(generation.ticket()));
    }

    #[test]
    fn clones_share_the_generation() {
        let generation = EffectGeneration::new();
        let handle = generation.clone();
        let ticket = generation.ticket();
        handle.invalidate();
        assert!(!generation.is_current(ticket));
    }
}
