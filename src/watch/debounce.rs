// src/watch/debounce.rs

//! Per-binding trailing-edge debounce.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

/// Deadlines keyed by binding index.
///
/// Every `touch` pushes the binding's deadline to `now + window`; `due`
/// hands back (and forgets) each binding whose deadline has passed, so a
/// burst of changes fires once.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadlines: BTreeMap<usize, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: BTreeMap::new(),
        }
    }

    pub fn touch(&mut self, binding: usize, now: Instant) {
        self.deadlines.insert(binding, now + self.window);
    }

    pub fn due(&mut self, now: Instant) -> Vec<usize> {
        let ready: Vec<usize> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(idx, _)| *idx)
            .collect();
        for idx in &ready {
            self.deadlines.remove(idx);
        }
        ready
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once_after_quiet_period() {
        let mut d = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();

        d.touch(0, start);
        d.touch(0, start + Duration::from_millis(60));
        assert!(d.due(start + Duration::from_millis(120)).is_empty());
        assert_eq!(d.next_deadline(), Some(start + Duration::from_millis(160)));

        assert_eq!(d.due(start + Duration::from_millis(160)), vec![0]);
        assert!(d.is_empty());
        assert!(d.due(start + Duration::from_secs(5)).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn bindings_expire_independently() {
        let mut d = Debouncer::new(Duration::from_millis(50));
        let start = Instant::now();

        d.touch(1, start);
        d.touch(0, start + Duration::from_millis(30));
        assert_eq!(d.due(start + Duration::from_millis(50)), vec![1]);
        assert_eq!(d.due(start + Duration::from_millis(80)), vec![0]);
    }
}
