use std::collections::{HashMap, VecDeque};

use crate::decision::parse::Decision;

/// Bounded decision cache keyed by normalized context hash.
///
/// Entries expire after a configured window of simulation time; capacity
/// overflow evicts oldest-first.
pub struct DecisionCache {
    entries: HashMap<u64, CachedDecision>,
    order: VecDeque<u64>,
    capacity: usize,
    expiry_seconds: f32,
}

#[derive(Debug, Clone)]
pub struct CachedDecision {
    pub decision: Decision,
    pub inserted_at: f64,
}

impl DecisionCache {
    pub fn new(capacity: usize, expiry_seconds: f32) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            expiry_seconds,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// An entry older than the expiry window is never returned; it is
    /// removed on lookup.
    pub fn get(&mut self, hash: u64, now: f64) -> Option<Decision> {
        let expired = match self.entries.get(&hash) {
            Some(entry) => now - entry.inserted_at > self.expiry_seconds as f64,
            None => return None,
        };
        if expired {
            self.remove(hash);
            return None;
        }
        self.entries.get(&hash).map(|e| e.decision.clone())
    }

    pub fn insert(&mut self, hash: u64, decision: Decision, now: f64) {
        if self.entries.contains_key(&hash) {
            self.order.retain(|k| *k != hash);
        }
        while self.entries.len() >= self.capacity && !self.entries.contains_key(&hash) {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
        self.entries.insert(
            hash,
            CachedDecision {
                decision,
                inserted_at: now,
            },
        );
        self.order.push_back(hash);
    }

    fn remove(&mut self, hash: u64) {
        self.entries.remove(&hash);
        self.order.retain(|k| *k != hash);
    }
}
