use serde::{Deserialize, Serialize};

use crate::analysis::NextBest;
use crate::chain::Chains;
use crate::models::PICK_COUNT;
use crate::projection::{ProjectionKind, Projector};
use crate::sort::rank_descending;
use crate::stats::PatternStats;

pub type Sequence = [u8; PICK_COUNT];

/// How per-number probabilities are combined into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Product,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSequence<S> {
    pub numbers: Sequence,
    pub score: S,
}

pub fn probability_score(numbers: &Sequence, stats: &PatternStats, aggregation: Aggregation) -> f64 {
    let probabilities = numbers.iter().map(|&n| stats.number_probability(n));
    match aggregation {
        Aggregation::Sum => probabilities.sum(),
        Aggregation::Product => probabilities.product(),
    }
}

/// Sum of same-drawing co-occurrence counts over the 15 unordered pairs.
pub fn pair_score(numbers: &Sequence, chains: &Chains) -> u32 {
    let table = chains.same_drawing();
    let mut score = 0;
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            score += table.count(&numbers[i], &numbers[j]);
        }
    }
    score
}

/// Candidates by descending aggregated number probability.
pub fn rank_by_probability(
    candidates: &[Sequence],
    stats: &PatternStats,
    aggregation: Aggregation,
) -> Vec<RankedSequence<f64>> {
    let scored = candidates.iter().map(|numbers| RankedSequence {
        numbers: *numbers,
        score: probability_score(numbers, stats, aggregation),
    });
    rank_descending(scored, |r| r.score)
}

/// Candidates by descending pairwise co-occurrence.
pub fn rank_by_pair_cooccurrence(candidates: &[Sequence], chains: &Chains) -> Vec<RankedSequence<u32>> {
    let scored = candidates.iter().map(|numbers| RankedSequence {
        numbers: *numbers,
        score: pair_score(numbers, chains),
    });
    rank_descending(scored, |r| r.score)
}

/// Keeps candidates whose projections equal the recommended ones. Kinds
/// without a recommendation do not filter.
pub fn filter_by_next_best(candidates: &[Sequence], next: &NextBest, projector: &Projector) -> Vec<Sequence> {
    candidates
        .iter()
        .filter(|numbers| {
            ProjectionKind::ALL.iter().all(|&kind| match next.pattern(kind) {
                Some(pattern) => projector.matches(kind, numbers.as_slice(), pattern),
                None => true,
            })
        })
        .copied()
        .collect()
}
