//! Deferred dash retry.
//!
//! A dash pressed during cooldown is not dropped: a single-shot retry is
//! armed for the moment the cooldown ends. Each character has at most one
//! pending retry; arming again replaces it and releasing the button
//! cancels it.

use std::collections::BTreeMap;

use crate::character::CharacterId;

/// Pending dash retries, keyed by character.
#[derive(Debug, Clone, Default)]
pub struct DashRetryScheduler {
    pending: BTreeMap<CharacterId, f64>,
}

impl DashRetryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the retry for `character` to fire at `fire_at`.
    pub fn schedule(&mut self, character: CharacterId, fire_at: f64) {
        log::debug!("dash retry for character {character} armed for t={fire_at:.3}");
        self.pending.insert(character, fire_at);
    }

    /// Cancel the pending retry. Returns whether one was pending.
    pub fn cancel(&mut self, character: CharacterId) -> bool {
        self.pending.remove(&character).is_some()
    }

    /// When the retry for `character` fires, if one is pending.
    pub fn fire_time(&self, character: CharacterId) -> Option<f64> {
        self.pending.get(&character).copied()
    }

    pub fn is_pending(&self, character: CharacterId) -> bool {
        self.pending.contains_key(&character)
    }

    /// Remove and return every retry due at `now`, in character order.
    pub fn take_due(&mut self, now: f64) -> Vec<CharacterId> {
        let due: Vec<CharacterId> = self
            .pending
            .iter()
            .filter(|(_, &fire_at)| fire_at <= now)
            .map(|(&character, _)| character)
            .collect();

        for character in &due {
            self.pending.remove(character);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_when_due() {
        let mut retries = DashRetryScheduler::new();
        retries.schedule(3, 1.5);

        assert!(retries.take_due(1.0).is_empty());
        assert_eq!(retries.take_due(1.5), vec![3]);
        assert!(retries.take_due(2.0).is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut retries = DashRetryScheduler::new();
        retries.schedule(3, 1.5);
        assert!(retries.cancel(3));
        assert!(!retries.cancel(3));
        assert!(retries.take_due(10.0).is_empty());
    }

    #[test]
    fn test_rearm_replaces() {
        let mut retries = DashRetryScheduler::new();
        retries.schedule(3, 1.5);
        retries.schedule(3, 2.5);
        assert_eq!(retries.len(), 1);
        assert_eq!(retries.fire_time(3), Some(2.5));
        assert!(retries.take_due(2.0).is_empty());
    }

    #[test]
    fn test_keyed_by_character() {
        let mut retries = DashRetryScheduler::new();
        retries.schedule(9, 1.0);
        retries.schedule(2, 1.0);
        retries.schedule(5, 3.0);
        assert_eq!(retries.take_due(1.0), vec![2, 9]);
        assert!(retries.is_pending(5));
    }
}
