use std::collections::{BTreeSet, HashSet};

use anyhow::{bail, Result};
use rand::Rng;
use serde::Serialize;

use crate::chain::Chains;
use crate::config::AnalysisConfig;
use crate::models::Drawing;
use crate::projection::{ProjectionKind, Projector};
use crate::stats::PatternStats;

/// Recommendation for the drawing after the last one in the history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NextBest {
    pub color: Option<String>,
    pub high_low: Option<String>,
    pub odd_even: Option<String>,
    pub numbers: BTreeSet<u8>,
}

impl NextBest {
    pub fn pattern(&self, kind: ProjectionKind) -> Option<&str> {
        match kind {
            ProjectionKind::Color => self.color.as_deref(),
            ProjectionKind::HighLow => self.high_low.as_deref(),
            ProjectionKind::OddEven => self.odd_even.as_deref(),
        }
    }

    fn set_pattern(&mut self, kind: ProjectionKind, pattern: Option<String>) {
        match kind {
            ProjectionKind::Color => self.color = pattern,
            ProjectionKind::HighLow => self.high_low = pattern,
            ProjectionKind::OddEven => self.odd_even = pattern,
        }
    }
}

/// Statistics and chains over one chronological history.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub projector: Projector,
    pub stats: PatternStats,
    pub chains: Chains,
    last: Drawing,
    duplicates: usize,
}

impl Analysis {
    /// `drawings` must be chronological, oldest first, and already filtered
    /// to the wanted start year.
    pub fn run(drawings: &[Drawing], config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let Some(last) = drawings.last() else {
            bail!("No drawings since {}", config.effective_start_year());
        };

        let projector = config.projector();
        let stats = PatternStats::generate(drawings, &projector)?;
        let chains = Chains::train(drawings, &projector);
        let duplicates = count_duplicates(drawings);
        if duplicates > 0 {
            log::info!("{} drawings repeat an earlier drawing", duplicates);
        }

        Ok(Self {
            projector,
            stats,
            chains,
            last: last.clone(),
            duplicates,
        })
    }

    pub fn last_drawing(&self) -> &Drawing {
        &self.last
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates
    }

    pub fn last_pattern(&self, kind: ProjectionKind) -> String {
        self.projector.project(kind, &self.last.numbers)
    }

    pub fn next_best<R: Rng>(&self, rng: &mut R) -> NextBest {
        let mut next = NextBest::default();
        for kind in ProjectionKind::ALL {
            let last = self.last_pattern(kind);
            let pattern = self.chains.next_best_pattern(kind, &last, &self.stats, rng);
            next.set_pattern(kind, pattern);
        }
        next.numbers = self.chains.next_best_numbers(&self.last.numbers);
        next
    }
}

/// Drawings whose number set already appeared earlier in the history.
pub fn count_duplicates(drawings: &[Drawing]) -> usize {
    let mut seen = HashSet::new();
    drawings
        .iter()
        .filter(|d| !seen.insert(d.sorted_numbers()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_test_drawings;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn history() -> Vec<Drawing> {
        make_test_drawings(&[
            [1, 2, 10, 20, 30, 40],
            [3, 4, 11, 21, 31, 41],
            [5, 6, 12, 22, 32, 42],
            [2, 1, 10, 20, 30, 40],
        ])
    }

    #[test]
    fn test_run_empty_history() {
        assert!(Analysis::run(&[], &AnalysisConfig::default()).is_err());
    }

    #[test]
    fn test_run_invalid_config() {
        let config = AnalysisConfig { top: 0, ..Default::default() };
        assert!(Analysis::run(&history(), &config).is_err());
    }

    #[test]
    fn test_run_and_next_best() {
        let analysis = Analysis::run(&history(), &AnalysisConfig::default()).unwrap();
        assert_eq!(analysis.stats.drawing_count(), 4);
        assert_eq!(analysis.last_drawing().issue, 4);
        assert_eq!(analysis.last_pattern(ProjectionKind::Color), "0,0,1,2,3,4");

        let mut rng = StdRng::seed_from_u64(3);
        let next = analysis.next_best(&mut rng);
        assert_eq!(next.color.as_deref(), Some("0,0,1,2,3,4"));
        assert_eq!(next.pattern(ProjectionKind::Color), Some("0,0,1,2,3,4"));
        assert!(next.high_low.is_some());
        assert!(next.odd_even.is_some());
        // numbers of the last drawing were followed by the second drawing
        assert!(next.numbers.contains(&3));
        assert!(next.numbers.contains(&41));
    }

    #[test]
    fn test_count_duplicates() {
        assert_eq!(count_duplicates(&history()), 1);
        assert_eq!(count_duplicates(&history()[..3]), 0);
    }
}
