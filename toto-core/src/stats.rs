use anyhow::{bail, Result};

use crate::check::{check_table, report, Inconsistency};
use crate::entity::{EntityStat, EntityTable};
use crate::models::Drawing;
use crate::projection::{all_patterns, ProjectionKind, Projector};

/// Occurrence, probability and gap statistics for numbers and for the three
/// projections, built in one pass over a chronological history.
///
/// Each drawing takes the next spot (the first drawing is spot 1). Numbers are
/// updated six times per drawing, each projection once.
#[derive(Debug, Clone)]
pub struct PatternStats {
    drawing_count: u32,
    numbers: EntityTable<u8>,
    colors: EntityTable<String>,
    high_lows: EntityTable<String>,
    odd_evens: EntityTable<String>,
    inconsistencies: Vec<Inconsistency>,
}

impl PatternStats {
    /// `drawings` must be in chronological order, oldest first.
    pub fn generate(drawings: &[Drawing], projector: &Projector) -> Result<Self> {
        if drawings.is_empty() {
            bail!("No drawings to analyse");
        }

        let mut stats = Self {
            drawing_count: 0,
            numbers: EntityTable::new(),
            colors: EntityTable::new(),
            high_lows: EntityTable::new(),
            odd_evens: EntityTable::new(),
            inconsistencies: Vec::new(),
        };

        for drawing in drawings {
            stats.process(drawing, projector);
        }
        log::info!(
            "Processed {} drawings: {} numbers, {} color, {} high/low, {} odd/even patterns",
            stats.drawing_count,
            stats.numbers.len(),
            stats.colors.len(),
            stats.high_lows.len(),
            stats.odd_evens.len()
        );

        stats.numbers.calc_probabilities();
        for kind in ProjectionKind::ALL {
            stats.table_mut(kind).calc_probabilities();
        }

        stats.inconsistencies = stats.check();
        report(&stats.inconsistencies);

        Ok(stats)
    }

    fn process(&mut self, drawing: &Drawing, projector: &Projector) {
        self.drawing_count += 1;
        let spot = self.drawing_count;
        for &number in &drawing.numbers {
            self.numbers.record(number, spot);
        }
        for kind in ProjectionKind::ALL {
            let key = projector.project(kind, &drawing.numbers);
            self.table_mut(kind).record(key, spot);
        }
    }

    fn table_mut(&mut self, kind: ProjectionKind) -> &mut EntityTable<String> {
        match kind {
            ProjectionKind::Color => &mut self.colors,
            ProjectionKind::HighLow => &mut self.high_lows,
            ProjectionKind::OddEven => &mut self.odd_evens,
        }
    }

    /// Re-runs the invariants on the current statistics.
    pub fn check(&self) -> Vec<Inconsistency> {
        let mut issues = check_table("numbers", &self.numbers);
        for kind in ProjectionKind::ALL {
            issues.extend(check_table(kind.label(), self.patterns(kind)));
        }
        issues
    }

    pub fn inconsistencies(&self) -> &[Inconsistency] {
        &self.inconsistencies
    }

    pub fn drawing_count(&self) -> u32 {
        self.drawing_count
    }

    pub fn numbers(&self) -> &EntityTable<u8> {
        &self.numbers
    }

    pub fn patterns(&self, kind: ProjectionKind) -> &EntityTable<String> {
        match kind {
            ProjectionKind::Color => &self.colors,
            ProjectionKind::HighLow => &self.high_lows,
            ProjectionKind::OddEven => &self.odd_evens,
        }
    }

    pub fn number(&self, number: u8) -> Option<&EntityStat<u8>> {
        self.numbers.get(&number)
    }

    pub fn pattern(&self, kind: ProjectionKind, key: &str) -> Option<&EntityStat<String>> {
        self.patterns(kind).get(key)
    }

    /// 0.0 for numbers never drawn.
    pub fn number_probability(&self, number: u8) -> f64 {
        self.number(number).map_or(0.0, |e| e.probability)
    }

    /// 0.0 for patterns never seen.
    pub fn pattern_probability(&self, kind: ProjectionKind, key: &str) -> f64 {
        self.pattern(kind, key).map_or(0.0, |e| e.probability)
    }

    /// Possible patterns of `kind` that never occurred in the history.
    pub fn unseen_patterns(&self, kind: ProjectionKind, projector: &Projector) -> Vec<String> {
        all_patterns(kind, projector)
            .into_iter()
            .filter(|pattern| self.pattern(kind, pattern).is_none())
            .collect()
    }

    pub fn top_numbers(&self, n: usize) -> Vec<&EntityStat<u8>> {
        self.numbers.top(n)
    }

    pub fn top_patterns(&self, kind: ProjectionKind, n: usize) -> Vec<&EntityStat<String>> {
        self.patterns(kind).top(n)
    }

    pub fn top_number(&self) -> Option<&EntityStat<u8>> {
        self.top_numbers(1).into_iter().next()
    }

    pub fn top_pattern(&self, kind: ProjectionKind) -> Option<&EntityStat<String>> {
        self.top_patterns(kind, 1).into_iter().next()
    }
}
