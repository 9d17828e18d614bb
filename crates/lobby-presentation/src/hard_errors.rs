//! Hard-error message registry
//!
//! Written from any thread as lockups come and go, read on the UI thread when
//! the lockup text is built. Readers see writes eventually; there is no
//! ordering promise between a write and a concurrent read.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::signals::{DisableKey, PresentationSignals};

#[derive(Debug, Clone)]
struct HardErrorEntry {
    sequence: u64,
    message: String,
}

/// Messages of the currently active hard errors, keyed by disable key
#[derive(Debug, Default)]
pub struct HardErrorMessages {
    entries: RwLock<HashMap<DisableKey, HardErrorEntry>>,
    next_sequence: AtomicU64,
}

impl HardErrorMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-word) the message for `key`
    ///
    /// Re-registering keeps the key's original position.
    pub fn register(&self, key: DisableKey, message: impl Into<String>) {
        let message = message.into();
        let mut entries = self.entries.write();
        match entries.get_mut(&key) {
            Some(entry) => entry.message = message,
            None => {
                let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
                entries.insert(key, HardErrorEntry { sequence, message });
            }
        }
    }

    /// Remove the message for `key`
    pub fn clear(&self, key: DisableKey) -> bool {
        self.entries.write().remove(&key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Active keys in registration order
    pub fn keys(&self) -> Vec<DisableKey> {
        self.ordered().into_iter().map(|(key, _)| key).collect()
    }

    /// Distinct messages in registration order, one per line
    pub fn build_text(&self) -> String {
        let mut seen: Vec<String> = Vec::new();
        for (_, message) in self.ordered() {
            if !message.is_empty() && !seen.contains(&message) {
                seen.push(message);
            }
        }
        seen.join("\n")
    }

    /// Copy the error count and active keys into `signals`
    pub fn fill_signals(&self, signals: &mut PresentationSignals) {
        let keys = self.keys();
        signals.hard_error_count = keys.len();
        signals.active_disable_keys = keys;
    }

    fn ordered(&self) -> Vec<(DisableKey, String)> {
        let entries = self.entries.read();
        let mut ordered: Vec<_> = entries
            .iter()
            .map(|(key, entry)| (entry.sequence, *key, entry.message.clone()))
            .collect();
        ordered.sort_by_key(|(sequence, _, _)| *sequence);
        ordered
            .into_iter()
            .map(|(_, key, message)| (key, message))
            .collect()
    }
}
