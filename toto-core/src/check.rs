use std::fmt::Display;
use std::hash::Hash;

use crate::entity::EntityTable;

/// Tolerance for probability sums.
pub const EPSILON: f64 = 1e-9;

/// A statistic that does not satisfy one of the counting invariants.
/// Reported, never fatal: the statistic stays in place as computed.
#[derive(Debug, Clone, PartialEq)]
pub enum Inconsistency {
    /// Gap observations of an entity seen N times must add up to N - 1.
    GapCount {
        class: String,
        key: String,
        observed: u32,
        expected: u32,
    },
    /// Probabilities of all entities of a class must add up to 1.
    ClassProbability { class: String, sum: f64 },
    /// Gap probabilities of one entity must add up to 1.
    GapProbability { class: String, key: String, sum: f64 },
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inconsistency::GapCount { class, key, observed, expected } => write!(
                f,
                "{class} {key}: {observed} gap observations, expected {expected}"
            ),
            Inconsistency::ClassProbability { class, sum } => {
                write!(f, "{class}: probabilities sum to {sum}")
            }
            Inconsistency::GapProbability { class, key, sum } => {
                write!(f, "{class} {key}: gap probabilities sum to {sum}")
            }
        }
    }
}

pub fn approx_one(sum: f64) -> bool {
    (sum - 1.0).abs() <= EPSILON
}

/// Runs every invariant over one class of entities.
pub fn check_table<K>(class: &str, table: &EntityTable<K>) -> Vec<Inconsistency>
where
    K: Eq + Hash + Clone + Display,
{
    let mut issues = Vec::new();
    if table.is_empty() {
        return issues;
    }

    let sum: f64 = table.iter().map(|e| e.probability).sum();
    if !approx_one(sum) {
        issues.push(Inconsistency::ClassProbability {
            class: class.to_string(),
            sum,
        });
    }

    for entity in table.iter() {
        // entities seen once carry no gaps
        if entity.frequencies().is_empty() {
            continue;
        }
        let observed = entity.gap_observations();
        let expected = entity.times_occurred - 1;
        if observed != expected {
            issues.push(Inconsistency::GapCount {
                class: class.to_string(),
                key: entity.key.to_string(),
                observed,
                expected,
            });
        }

        // fixed summation order, HashMap iteration order is not
        let mut gaps: Vec<_> = entity.frequencies().values().collect();
        gaps.sort_by_key(|r| r.gap);
        let gap_sum: f64 = gaps.iter().map(|r| r.probability).sum();
        if !approx_one(gap_sum) {
            issues.push(Inconsistency::GapProbability {
                class: class.to_string(),
                key: entity.key.to_string(),
                sum: gap_sum,
            });
        }
    }
    issues
}

pub fn report(issues: &[Inconsistency]) {
    if issues.is_empty() {
        log::info!("Statistics consistent");
        return;
    }
    for issue in issues {
        log::warn!("Inconsistent statistic: {}", issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_table() {
        let mut table = EntityTable::new();
        for (key, spot) in [(1u8, 1), (2, 1), (1, 2), (1, 4), (2, 5)] {
            table.record(key, spot);
        }
        table.calc_probabilities();
        assert!(check_table("numbers", &table).is_empty());
    }

    #[test]
    fn test_gap_count_mismatch_reported() {
        let mut table = EntityTable::new();
        table.record(1u8, 2);
        table.record(1u8, 3);
        table.record(1u8, 3);
        table.calc_probabilities();
        assert!(check_table("numbers", &table).is_empty());

        table.get_mut(&1).unwrap().times_occurred += 1;
        let issues: Vec<_> = check_table("numbers", &table)
            .into_iter()
            .filter(|issue| matches!(issue, Inconsistency::GapCount { .. }))
            .collect();
        assert_eq!(
            issues,
            vec![Inconsistency::GapCount {
                class: "numbers".to_string(),
                key: "1".to_string(),
                observed: 2,
                expected: 3,
            }]
        );
    }

    #[test]
    fn test_uncomputed_probabilities_reported() {
        let mut table = EntityTable::new();
        table.record("hhhlll".to_string(), 1);
        let issues = check_table("high/low", &table);
        assert!(matches!(issues[0], Inconsistency::ClassProbability { .. }));
    }

    #[test]
    fn test_approx_one_tolerance() {
        let thirds = 1.0 / 3.0 + 1.0 / 3.0 + 1.0 / 3.0;
        assert!(approx_one(thirds));
        let tenths: f64 = (0..10).map(|_| 0.1).sum();
        assert!(approx_one(tenths));
        assert!(!approx_one(0.99));
    }

    #[test]
    fn test_display() {
        let issue = Inconsistency::ClassProbability {
            class: "color".to_string(),
            sum: 0.5,
        };
        assert_eq!(issue.to_string(), "color: probabilities sum to 0.5");
    }
}
