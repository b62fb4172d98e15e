use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::sort::rank_descending;

/// How often one gap (drawings between two consecutive occurrences of the
/// same entity) was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyRecord {
    pub gap: u32,
    pub times_occurred: u32,
    pub probability: f64,
}

impl FrequencyRecord {
    fn new(gap: u32) -> Self {
        Self {
            gap,
            times_occurred: 1,
            probability: 0.0,
        }
    }
}

/// Occurrence and gap statistics for one number or one projection.
#[derive(Debug, Clone)]
pub struct EntityStat<K> {
    pub key: K,
    pub times_occurred: u32,
    pub probability: f64,
    /// Occurrence-weighted mean gap. Stays 0.0 for entities seen once.
    pub average_frequency: f64,
    frequencies: HashMap<u32, FrequencyRecord>,
    last_spot: u32,
}

impl<K> EntityStat<K> {
    pub fn new(key: K, spot: u32) -> Self {
        Self {
            key,
            times_occurred: 1,
            probability: 0.0,
            average_frequency: 0.0,
            frequencies: HashMap::new(),
            last_spot: spot,
        }
    }

    /// Registers another occurrence at `spot` and records the gap to the
    /// previous one. A second occurrence within the same spot records gap 0.
    /// A spot before the last one also records gap 0 and keeps the last spot.
    pub fn occurred(&mut self, spot: u32) {
        self.times_occurred += 1;
        if spot < self.last_spot {
            log::warn!(
                "Spot {} is before the last spot {}, recorded as gap 0",
                spot,
                self.last_spot
            );
        }
        let gap = spot.saturating_sub(self.last_spot);
        self.frequencies
            .entry(gap)
            .and_modify(|record| record.times_occurred += 1)
            .or_insert_with(|| FrequencyRecord::new(gap));
        self.last_spot = self.last_spot.max(spot);
    }

    pub fn last_spot(&self) -> u32 {
        self.last_spot
    }

    pub fn frequencies(&self) -> &HashMap<u32, FrequencyRecord> {
        &self.frequencies
    }

    pub fn frequency(&self, gap: u32) -> Option<&FrequencyRecord> {
        self.frequencies.get(&gap)
    }

    /// Total number of gaps observed, N - 1 for an entity seen N times.
    pub fn gap_observations(&self) -> u32 {
        self.frequencies.values().map(|r| r.times_occurred).sum()
    }

    /// Gap records, most frequent first; equal counts ordered by gap.
    pub fn ordered_frequencies(&self) -> Vec<&FrequencyRecord> {
        let mut by_gap: Vec<&FrequencyRecord> = self.frequencies.values().collect();
        by_gap.sort_by_key(|r| r.gap);
        rank_descending(by_gap, |r| r.times_occurred)
    }

    pub fn most_common_gap(&self) -> Option<&FrequencyRecord> {
        self.ordered_frequencies().into_iter().next()
    }

    pub(crate) fn calc_probability(&mut self, total: u32) {
        self.probability = if total > 0 {
            self.times_occurred as f64 / total as f64
        } else {
            0.0
        };
    }

    /// Nothing to do for entities seen once: they have no gaps.
    pub(crate) fn calc_frequency_probabilities(&mut self) {
        if self.frequencies.is_empty() {
            return;
        }
        let mut size = 0u64;
        let mut weighted_sum = 0u64;
        for record in self.frequencies.values() {
            size += record.times_occurred as u64;
            weighted_sum += record.gap as u64 * record.times_occurred as u64;
        }
        for record in self.frequencies.values_mut() {
            record.probability = record.times_occurred as f64 / size as f64;
        }
        self.average_frequency = weighted_sum as f64 / size as f64;
    }
}

/// Entities of one class, kept in first-seen order.
#[derive(Debug, Clone)]
pub struct EntityTable<K> {
    entries: Vec<EntityStat<K>>,
    index: HashMap<K, usize>,
}

impl<K> Default for EntityTable<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> EntityTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the entity on first sight, otherwise registers one more occurrence.
    pub fn record(&mut self, key: K, spot: u32) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].occurred(spot),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(EntityStat::new(key, spot));
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&EntityStat<K>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut EntityStat<K>> {
        self.index.get(key).map(|&i| &mut self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityStat<K>> {
        self.entries.iter()
    }

    pub fn total_occurrences(&self) -> u32 {
        self.entries.iter().map(|e| e.times_occurred).sum()
    }

    pub(crate) fn calc_probabilities(&mut self) {
        let total = self.total_occurrences();
        for entity in &mut self.entries {
            entity.calc_probability(total);
            entity.calc_frequency_probabilities();
        }
    }

    /// Entities by descending probability; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<&EntityStat<K>> {
        rank_descending(self.entries.iter(), |e| e.probability)
    }

    pub fn top(&self, n: usize) -> Vec<&EntityStat<K>> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}
