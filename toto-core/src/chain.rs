use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{Drawing, POOL_SIZE};
use crate::projection::{ProjectionKind, Projector};
use crate::sort::{leading_run, rank_descending, take_with_ties};
use crate::stats::PatternStats;

/// Candidates taken per source number before ties are extended.
pub const NEXT_NUMBERS_PER_SOURCE: usize = 6;

/// Successor keys with their transition counts. Insertion order until
/// ordered, descending count afterwards.
#[derive(Debug, Clone)]
pub struct Successors<K> {
    entries: Vec<(K, u32)>,
    index: HashMap<K, usize>,
}

impl<K> Default for Successors<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Successors<K> {
    fn from_entries(entries: Vec<(K, u32)>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (key, _))| (key.clone(), i))
            .collect();
        Self { entries, index }
    }

    fn increment(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Same successors, stably ordered by descending count.
    fn ordered(&self) -> Self {
        Self::from_entries(rank_descending(self.entries.iter().cloned(), |(_, count)| *count))
    }

    pub fn count<Q>(&self, key: &Q) -> u32
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map_or(0, |&i| self.entries[i].1)
    }

    pub fn as_slice(&self) -> &[(K, u32)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, u32)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

/// "from" key -> successors, in first-seen order of the "from" keys.
#[derive(Debug, Clone)]
pub struct TransitionTable<K> {
    chains: Vec<(K, Successors<K>)>,
    index: HashMap<K, usize>,
}

impl<K> Default for TransitionTable<K> {
    fn default() -> Self {
        Self {
            chains: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> TransitionTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table already holding an empty successor list for every key.
    pub fn seeded(keys: impl IntoIterator<Item = K>) -> Self {
        let mut table = Self::new();
        for key in keys {
            table.ensure(key);
        }
        table
    }

    /// Registers `key` with no successors unless it is already present.
    pub fn ensure(&mut self, key: K) -> &mut Successors<K> {
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.chains.len();
                self.index.insert(key.clone(), i);
                self.chains.push((key, Successors::default()));
                i
            }
        };
        &mut self.chains[i].1
    }

    pub fn increment(&mut self, from: K, to: K) {
        self.ensure(from).increment(to);
    }

    pub fn successors<Q>(&self, from: &Q) -> Option<&Successors<K>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(from).map(|&i| &self.chains[i].1)
    }

    pub fn count<Q>(&self, from: &Q, to: &Q) -> u32
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.successors(from).map_or(0, |s| s.count(to))
    }

    pub fn contains<Q>(&self, from: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(from)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Successors<K>)> {
        self.chains.iter().map(|(key, successors)| (key, successors))
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    fn order(&mut self) {
        for (_, successors) in &mut self.chains {
            *successors = successors.ordered();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberChainKind {
    /// Numbers drawn together in one drawing. Symmetric.
    SameDrawing,
    /// Numbers of one drawing followed by numbers of the next. Directional.
    Consecutive,
}

impl NumberChainKind {
    pub fn label(&self) -> &'static str {
        match self {
            NumberChainKind::SameDrawing => "same drawing",
            NumberChainKind::Consecutive => "consecutive drawings",
        }
    }
}

/// First-order transition tables over projections and numbers.
#[derive(Debug, Clone)]
pub struct Chains {
    colors: TransitionTable<String>,
    high_lows: TransitionTable<String>,
    odd_evens: TransitionTable<String>,
    same_drawing: TransitionTable<u8>,
    consecutive: TransitionTable<u8>,
}

impl Chains {
    /// Trains all five tables in one forward pass, then orders every
    /// successor list by descending count.
    pub fn train(drawings: &[Drawing], projector: &Projector) -> Self {
        let mut chains = Self {
            colors: TransitionTable::new(),
            high_lows: TransitionTable::new(),
            odd_evens: TransitionTable::new(),
            same_drawing: TransitionTable::seeded(1..=POOL_SIZE),
            consecutive: TransitionTable::seeded(1..=POOL_SIZE),
        };

        let mut previous_patterns: [Option<String>; 3] = [None, None, None];
        let mut previous_drawing: Option<&Drawing> = None;

        for drawing in drawings {
            for (slot, kind) in ProjectionKind::ALL.into_iter().enumerate() {
                let current = projector.project(kind, &drawing.numbers);
                let table = chains.table_mut(kind);
                if let Some(previous) = previous_patterns[slot].take() {
                    table.increment(previous, current.clone());
                }
                // the latest pattern is a key even before anything follows it
                table.ensure(current.clone());
                previous_patterns[slot] = Some(current);
            }

            chains.train_same_drawing(&drawing.numbers);
            if let Some(previous) = previous_drawing {
                chains.train_consecutive(&previous.numbers, &drawing.numbers);
            }
            previous_drawing = Some(drawing);
        }

        chains.order();
        log::info!(
            "Trained chains on {} drawings: {} color, {} high/low, {} odd/even keys",
            drawings.len(),
            chains.colors.len(),
            chains.high_lows.len(),
            chains.odd_evens.len()
        );
        chains
    }

    fn train_same_drawing(&mut self, numbers: &[u8]) {
        for (i, &from) in numbers.iter().enumerate() {
            for (j, &to) in numbers.iter().enumerate() {
                if i != j {
                    self.same_drawing.increment(from, to);
                }
            }
        }
    }

    fn train_consecutive(&mut self, previous: &[u8], current: &[u8]) {
        for &from in previous {
            for &to in current {
                self.consecutive.increment(from, to);
            }
        }
    }

    fn order(&mut self) {
        self.colors.order();
        self.high_lows.order();
        self.odd_evens.order();
        self.same_drawing.order();
        self.consecutive.order();
    }

    fn table_mut(&mut self, kind: ProjectionKind) -> &mut TransitionTable<String> {
        match kind {
            ProjectionKind::Color => &mut self.colors,
            ProjectionKind::HighLow => &mut self.high_lows,
            ProjectionKind::OddEven => &mut self.odd_evens,
        }
    }

    pub fn patterns(&self, kind: ProjectionKind) -> &TransitionTable<String> {
        match kind {
            ProjectionKind::Color => &self.colors,
            ProjectionKind::HighLow => &self.high_lows,
            ProjectionKind::OddEven => &self.odd_evens,
        }
    }

    pub fn numbers(&self, kind: NumberChainKind) -> &TransitionTable<u8> {
        match kind {
            NumberChainKind::SameDrawing => &self.same_drawing,
            NumberChainKind::Consecutive => &self.consecutive,
        }
    }

    pub fn same_drawing(&self) -> &TransitionTable<u8> {
        &self.same_drawing
    }

    pub fn consecutive(&self) -> &TransitionTable<u8> {
        &self.consecutive
    }

    /// Most likely successor of `last_pattern` in the `kind` chain.
    ///
    /// Successors tied on the highest count are narrowed down to those with
    /// the highest overall probability in `stats`; a tie that survives that
    /// step is settled by `rng`. `None` when the pattern was never followed
    /// by anything.
    pub fn next_best_pattern<R: Rng>(
        &self,
        kind: ProjectionKind,
        last_pattern: &str,
        stats: &PatternStats,
        rng: &mut R,
    ) -> Option<String> {
        let successors = match self.patterns(kind).successors(last_pattern) {
            Some(s) if !s.is_empty() => s,
            _ => {
                log::info!(
                    "Last {} pattern {} has no successors in the chain",
                    kind,
                    last_pattern
                );
                return None;
            }
        };

        let top = leading_run(successors.as_slice(), |(_, count)| *count);
        if let [(only, _)] = top {
            log::info!("Next best {} pattern: {}", kind, only);
            return Some(only.clone());
        }

        let mut best: Vec<&String> = Vec::new();
        let mut best_probability = f64::NEG_INFINITY;
        for (candidate, _) in top {
            let probability = stats.pattern_probability(kind, candidate);
            if best.is_empty() || probability > best_probability {
                best.clear();
                best.push(candidate);
                best_probability = probability;
            } else if probability == best_probability {
                best.push(candidate);
            }
        }
        log::debug!(
            "{} {} patterns tied on count {}, {} left after probability",
            top.len(),
            kind,
            top[0].1,
            best.len()
        );

        let chosen = if best.len() == 1 {
            best[0]
        } else {
            best[rng.random_range(0..best.len())]
        };
        log::info!("Next best {} pattern: {}", kind, chosen);
        Some(chosen.clone())
    }

    /// Successors of one number in the consecutive-drawing chain: the six
    /// strongest, plus any that tie with the sixth.
    pub fn number_candidates(&self, number: u8) -> Vec<u8> {
        match self.consecutive.successors(&number) {
            Some(successors) => take_with_ties(
                successors.as_slice(),
                NEXT_NUMBERS_PER_SOURCE,
                |(_, count)| *count,
            )
            .iter()
            .map(|(n, _)| *n)
            .collect(),
            None => Vec::new(),
        }
    }

    /// Union of `number_candidates` over every number of the last drawing.
    pub fn next_best_numbers(&self, last_numbers: &[u8]) -> BTreeSet<u8> {
        last_numbers
            .iter()
            .flat_map(|&n| self.number_candidates(n))
            .collect()
    }
}
