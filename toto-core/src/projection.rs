use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{PICK_COUNT, POOL_SIZE};

/// With 25 the low/high split matches the published 6/49 pattern odds.
pub const DEFAULT_HIGH_LOW_MIDPOINT: u8 = 25;

/// Number of color bands (0 = 1-9, 1 = 10-19, ..., 4 = 40-49).
pub const COLOR_BANDS: u8 = 5;

/// The three symbolic views of a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectionKind {
    Color,
    HighLow,
    OddEven,
}

impl ProjectionKind {
    pub const ALL: [ProjectionKind; 3] = [
        ProjectionKind::Color,
        ProjectionKind::HighLow,
        ProjectionKind::OddEven,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProjectionKind::Color => "color",
            ProjectionKind::HighLow => "high/low",
            ProjectionKind::OddEven => "odd/even",
        }
    }
}

impl std::fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Turns drawings into projection strings.
///
/// Every projection is sorted, so two drawings holding the same multiset of
/// bands/letters always produce the same key. High/low and odd/even letters
/// are sorted lexically: `h` sorts before `l`, `e` before `o`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projector {
    midpoint: u8,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(DEFAULT_HIGH_LOW_MIDPOINT)
    }
}

impl Projector {
    pub fn new(midpoint: u8) -> Self {
        Self { midpoint }
    }

    pub fn midpoint(&self) -> u8 {
        self.midpoint
    }

    pub fn project(&self, kind: ProjectionKind, numbers: &[u8]) -> String {
        match kind {
            ProjectionKind::Color => color_pattern(numbers),
            ProjectionKind::HighLow => self.high_low_pattern(numbers),
            ProjectionKind::OddEven => odd_even_pattern(numbers),
        }
    }

    /// `5,14,22,25,34,49` -> `hhllll`
    pub fn high_low_pattern(&self, numbers: &[u8]) -> String {
        sorted_letters(
            numbers
                .iter()
                .map(|&n| if n <= self.midpoint { 'l' } else { 'h' }),
        )
    }

    /// Whether `numbers` projects onto exactly `pattern`.
    pub fn matches(&self, kind: ProjectionKind, numbers: &[u8], pattern: &str) -> bool {
        self.project(kind, numbers) == pattern
    }
}

pub fn color_band(number: u8) -> u8 {
    number / 10
}

/// `5,14,22,25,34,49` -> `0,1,2,2,3,4`
pub fn color_pattern(numbers: &[u8]) -> String {
    let mut bands: Vec<u8> = numbers.iter().map(|&n| color_band(n)).collect();
    bands.sort();
    bands
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// `5,14,22,25,34,49` -> `eeeooo`
pub fn odd_even_pattern(numbers: &[u8]) -> String {
    sorted_letters(
        numbers
            .iter()
            .map(|&n| if n % 2 == 0 { 'e' } else { 'o' }),
    )
}

fn sorted_letters(letters: impl Iterator<Item = char>) -> String {
    let mut letters: Vec<char> = letters.collect();
    letters.sort();
    letters.into_iter().collect()
}

/// Numbers of the pool that fall into `band`.
pub fn band_members(band: u8) -> Vec<u8> {
    (1..=POOL_SIZE).filter(|&n| color_band(n) == band).collect()
}

/// How many ordered picks can produce a color pattern: each repeated band
/// has one member fewer left to choose from.
///
/// `0,1,1,2,3,4` -> 9 * 10 * 9 * 10 * 10 * 10
pub fn color_combinations(pattern: &str) -> Result<u64> {
    let mut used = [0u64; COLOR_BANDS as usize];
    let mut total = 1u64;
    for part in pattern.split(',') {
        let band: u8 = part
            .trim()
            .parse()
            .with_context(|| format!("Invalid color band '{}' in '{}'", part, pattern))?;
        if band >= COLOR_BANDS {
            bail!("Color band {} out of range (0-{})", band, COLOR_BANDS - 1);
        }
        let size = band_members(band).len() as u64;
        let taken = used[band as usize];
        if taken >= size {
            bail!("Color band {} cannot appear more than {} times", band, size);
        }
        total *= size - taken;
        used[band as usize] += 1;
    }
    Ok(total)
}

/// Every pattern of `kind` a valid drawing can produce, in lexical order.
///
/// Color gives 210 patterns (multisets of six bands out of five). The letter
/// kinds give one pattern per split of the six letters the pool can fill,
/// seven each at the default midpoint.
pub fn all_patterns(kind: ProjectionKind, projector: &Projector) -> Vec<String> {
    match kind {
        ProjectionKind::Color => {
            let mut patterns = Vec::new();
            let mut bands = Vec::with_capacity(PICK_COUNT);
            push_color_patterns(0, &mut bands, &mut patterns);
            patterns
        }
        ProjectionKind::HighLow => {
            let lows = projector.midpoint() as usize;
            let highs = (POOL_SIZE - projector.midpoint()) as usize;
            letter_splits('h', highs, 'l', lows)
        }
        ProjectionKind::OddEven => {
            let evens = (1..=POOL_SIZE).filter(|n| n % 2 == 0).count();
            let odds = POOL_SIZE as usize - evens;
            letter_splits('e', evens, 'o', odds)
        }
    }
}

/// Non-decreasing band sequences starting at `from`, so each multiset
/// appears once and already sorted.
fn push_color_patterns(from: u8, bands: &mut Vec<u8>, patterns: &mut Vec<String>) {
    if bands.len() == PICK_COUNT {
        patterns.push(
            bands
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
        return;
    }
    for band in from..COLOR_BANDS {
        let used = bands.iter().filter(|&&b| b == band).count();
        if used < band_members(band).len() {
            bands.push(band);
            push_color_patterns(band, bands, patterns);
            bands.pop();
        }
    }
}

/// `first` sorts before `second`; the count of `first` runs from six down.
fn letter_splits(first: char, first_available: usize, second: char, second_available: usize) -> Vec<String> {
    (0..=PICK_COUNT)
        .rev()
        .filter(|&k| k <= first_available && PICK_COUNT - k <= second_available)
        .map(|k| {
            std::iter::repeat(first)
                .take(k)
                .chain(std::iter::repeat(second).take(PICK_COUNT - k))
                .collect::<String>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_pattern() {
        assert_eq!(color_pattern(&[5, 14, 22, 25, 34, 49]), "0,1,2,2,3,4");
        assert_eq!(color_pattern(&[49, 34, 25, 22, 14, 5]), "0,1,2,2,3,4");
        assert_eq!(color_pattern(&[1, 2, 10, 20, 30, 40]), "0,0,1,2,3,4");
    }

    #[test]
    fn test_high_low_pattern_sorted_lexically() {
        let projector = Projector::default();
        assert_eq!(projector.high_low_pattern(&[5, 14, 22, 25, 34, 49]), "hhllll");
        assert_eq!(projector.high_low_pattern(&[26, 1, 27, 2, 28, 3]), "hhhlll");
        assert_eq!(projector.high_low_pattern(&[1, 26, 2, 27, 3, 28]), "hhhlll");
    }

    #[test]
    fn test_high_low_midpoint_inclusive() {
        let projector = Projector::default();
        assert_eq!(projector.high_low_pattern(&[25, 26]), "hl");
        let custom = Projector::new(24);
        assert_eq!(custom.high_low_pattern(&[25, 26]), "hh");
    }

    #[test]
    fn test_odd_even_pattern_sorted_lexically() {
        assert_eq!(odd_even_pattern(&[5, 14, 22, 25, 34, 49]), "eeeooo");
        assert_eq!(odd_even_pattern(&[1, 2, 3, 4, 5, 6]), "eeeooo");
        assert_eq!(odd_even_pattern(&[2, 4, 6, 8, 10, 1]), "eeeeeo");
    }

    #[test]
    fn test_projection_independent_of_order() {
        let projector = Projector::default();
        let a = [3, 18, 27, 30, 41, 44];
        let b = [44, 30, 3, 41, 18, 27];
        for kind in ProjectionKind::ALL {
            assert_eq!(projector.project(kind, &a), projector.project(kind, &b), "{kind}");
        }
    }

    #[test]
    fn test_matches() {
        let projector = Projector::default();
        let numbers = [5, 14, 22, 25, 34, 49];
        assert!(projector.matches(ProjectionKind::Color, &numbers, "0,1,2,2,3,4"));
        assert!(projector.matches(ProjectionKind::HighLow, &numbers, "hhllll"));
        assert!(!projector.matches(ProjectionKind::OddEven, &numbers, "eeeeoo"));
    }

    #[test]
    fn test_band_members() {
        assert_eq!(band_members(0), (1..=9).collect::<Vec<u8>>());
        assert_eq!(band_members(4), (40..=49).collect::<Vec<u8>>());
        assert!(band_members(5).is_empty());
    }

    #[test]
    fn test_color_combinations() {
        assert_eq!(color_combinations("0,1,1,2,3,4").unwrap(), 9 * 10 * 9 * 10 * 10 * 10);
        assert_eq!(color_combinations("0,0,0,0,0,0").unwrap(), 9 * 8 * 7 * 6 * 5 * 4);
    }

    #[test]
    fn test_color_combinations_invalid() {
        assert!(color_combinations("0,1,5").is_err());
        assert!(color_combinations("a,1").is_err());
    }

    /// A drawing whose projection of `kind` is `pattern`, picking the
    /// lowest unused pool numbers of each class.
    fn drawing_for(kind: ProjectionKind, pattern: &str, projector: &Projector) -> Vec<u8> {
        let mut used: Vec<u8> = Vec::new();
        let classes: Vec<Box<dyn Fn(u8) -> bool>> = match kind {
            ProjectionKind::Color => pattern
                .split(',')
                .map(|b| {
                    let band: u8 = b.parse().unwrap();
                    Box::new(move |n: u8| color_band(n) == band) as Box<dyn Fn(u8) -> bool>
                })
                .collect(),
            ProjectionKind::HighLow => {
                let midpoint = projector.midpoint();
                pattern
                    .chars()
                    .map(|c| {
                        Box::new(move |n: u8| (n > midpoint) == (c == 'h')) as Box<dyn Fn(u8) -> bool>
                    })
                    .collect()
            }
            ProjectionKind::OddEven => pattern
                .chars()
                .map(|c| Box::new(move |n: u8| (n % 2 == 0) == (c == 'e')) as Box<dyn Fn(u8) -> bool>)
                .collect(),
        };
        for class in classes {
            let n = (1..=POOL_SIZE)
                .find(|&n| class(n) && !used.contains(&n))
                .unwrap();
            used.push(n);
        }
        used
    }

    #[test]
    fn test_all_patterns_counts() {
        let projector = Projector::default();
        assert_eq!(all_patterns(ProjectionKind::Color, &projector).len(), 210);
        assert_eq!(all_patterns(ProjectionKind::HighLow, &projector).len(), 7);
        assert_eq!(all_patterns(ProjectionKind::OddEven, &projector).len(), 7);
    }

    #[test]
    fn test_all_patterns_sorted_and_distinct() {
        let projector = Projector::default();
        for kind in ProjectionKind::ALL {
            let patterns = all_patterns(kind, &projector);
            let mut sorted = patterns.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(patterns, sorted, "{kind}");
        }
        let odd_even = all_patterns(ProjectionKind::OddEven, &projector);
        assert_eq!(odd_even.first().unwrap(), "eeeeee");
        assert_eq!(odd_even.last().unwrap(), "oooooo");
        let colors = all_patterns(ProjectionKind::Color, &projector);
        assert_eq!(colors.first().unwrap(), "0,0,0,0,0,0");
        assert_eq!(colors.last().unwrap(), "4,4,4,4,4,4");
    }

    #[test]
    fn test_all_patterns_reachable_by_a_drawing() {
        for projector in [Projector::default(), Projector::new(3)] {
            for kind in ProjectionKind::ALL {
                for pattern in all_patterns(kind, &projector) {
                    let numbers = drawing_for(kind, &pattern, &projector);
                    assert!(crate::models::validate_numbers(&numbers).is_ok(), "{pattern}");
                    assert_eq!(projector.project(kind, &numbers), pattern);
                }
            }
        }
    }

    #[test]
    fn test_all_patterns_narrow_midpoint() {
        // only three low numbers: at most three l letters
        let patterns = all_patterns(ProjectionKind::HighLow, &Projector::new(3));
        assert_eq!(patterns, vec!["hhhhhh", "hhhhhl", "hhhhll", "hhhlll"]);
    }
}
