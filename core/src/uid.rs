// Copyright (c) 2023 Mike Tsao. All rights reserved.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [TriggerId] pairs a `pulse_off` with the `pulse_on` that it terminates.
/// Ids are unique within the session that minted them.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct TriggerId(pub usize);
impl TriggerId {
    /// The "no id" sentinel. An incoming trigger with this id asks the
    /// receiver to mint one.
    pub const NO_ID: TriggerId = TriggerId(0);

    /// The first id a fresh [TriggerIdFactory] hands out.
    pub const FIRST_ID: TriggerId = TriggerId(1);

    /// Whether this is a real id rather than [TriggerId::NO_ID].
    pub fn is_some(&self) -> bool {
        *self != Self::NO_ID
    }
}
impl From<usize> for TriggerId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Generates unique [TriggerId]s. One factory belongs to a session, and every
/// pulsator in that session shares it, typically through an
/// [Arc](std::sync::Arc). Minting takes `&self`, so sharing needs no lock.
#[derive(Debug)]
pub struct TriggerIdFactory {
    next_id_value: AtomicUsize,
}
impl Default for TriggerIdFactory {
    fn default() -> Self {
        Self::new(TriggerId::FIRST_ID.0)
    }
}
impl TriggerIdFactory {
    /// Creates a new factory whose first id is `first_id`. Values at or below
    /// [TriggerId::NO_ID] are bumped up to [TriggerId::FIRST_ID].
    pub fn new(first_id: usize) -> Self {
        Self {
            next_id_value: AtomicUsize::new(first_id.max(TriggerId::FIRST_ID.0)),
        }
    }

    /// Generates the next unique [TriggerId].
    pub fn mint_next(&self) -> TriggerId {
        TriggerId(self.next_id_value.fetch_add(1, Ordering::Relaxed))
    }

    /// The id that the next call to [TriggerIdFactory::mint_next()] will
    /// return.
    pub fn peek_next(&self) -> TriggerId {
        TriggerId(self.next_id_value.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Arc, thread};

    #[test]
    fn ids_start_at_first_id() {
        let factory = TriggerIdFactory::default();
        assert_eq!(factory.peek_next(), TriggerId::FIRST_ID);
        assert_eq!(factory.mint_next(), TriggerId(1));
        assert_eq!(factory.mint_next(), TriggerId(2));
        assert_eq!(TriggerIdFactory::new(0).mint_next(), TriggerId::FIRST_ID);
        assert_eq!(TriggerIdFactory::new(100).mint_next(), TriggerId(100));
        assert!(!TriggerId::NO_ID.is_some());
        assert_eq!(TriggerId(7).to_string(), "7");
    }

    #[test]
    fn concurrent_minting_never_repeats() {
        let factory = Arc::new(TriggerIdFactory::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let factory = Arc::clone(&factory);
                thread::spawn(move || (0..250).map(|_| factory.mint_next()).collect::<Vec<_>>())
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "{id} was minted twice");
            }
        }
        assert_eq!(seen.len(), 1000);
        assert!(!seen.contains(&TriggerId::NO_ID));
    }
}
