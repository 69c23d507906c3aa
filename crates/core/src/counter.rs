use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered multiset: counts occurrences of string keys, remembering the order
/// in which each key was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyCounter {
    counts: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `key`.
    pub fn increment(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.counts.len());
                self.counts.push((key.to_string(), 1));
            }
        }
    }

    /// Every key seen so far with its count, in first-seen order.
    pub fn total(&self) -> &[(String, usize)] {
        &self.counts
    }

    /// Sum of all counts.
    pub fn occurrences(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

// Serialized as a JSON object whose keys keep first-seen order.
impl Serialize for FrequencyCounter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (key, count) in &self.counts {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}
