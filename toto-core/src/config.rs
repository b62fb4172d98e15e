use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::POOL_SIZE;
use crate::projection::{Projector, DEFAULT_HIGH_LOW_MIDPOINT};

/// First year with recorded 6/49 drawings.
pub const FIRST_YEAR: u16 = 1958;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Drawings before this year are left out of the history.
    pub start_year: u16,
    pub high_low_midpoint: u8,
    /// Rows shown per ranked table.
    pub top: usize,
    /// Seed for the random tie-break. `None` lets the caller decide.
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start_year: FIRST_YEAR,
            high_low_midpoint: DEFAULT_HIGH_LOW_MIDPOINT,
            top: 10,
            seed: None,
        }
    }
}

impl AnalysisConfig {
    pub fn projector(&self) -> Projector {
        Projector::new(self.high_low_midpoint)
    }

    /// Years before the first recorded drawing mean "everything".
    pub fn effective_start_year(&self) -> u16 {
        self.start_year.max(FIRST_YEAR)
    }

    pub fn validate(&self) -> Result<()> {
        if self.high_low_midpoint < 1 || self.high_low_midpoint >= POOL_SIZE {
            bail!(
                "High/low midpoint {} out of range (1-{})",
                self.high_low_midpoint,
                POOL_SIZE - 1
            );
        }
        if self.top == 0 {
            bail!("top must be at least 1");
        }
        Ok(())
    }
}

/// Parses a year filter: `all` or a year, clamped to [`FIRST_YEAR`].
pub fn parse_year_filter(s: &str) -> Result<u16> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("all") {
        return Ok(FIRST_YEAR);
    }
    let year: u16 = s
        .parse()
        .with_context(|| format!("Invalid year filter '{}'", s))?;
    Ok(year.max(FIRST_YEAR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.start_year, 1958);
        assert_eq!(config.high_low_midpoint, 25);
        assert_eq!(config.projector().midpoint(), 25);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = AnalysisConfig { high_low_midpoint: 49, ..Default::default() };
        assert!(config.validate().is_err());
        let config = AnalysisConfig { top: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_start_year() {
        let config = AnalysisConfig { start_year: 1900, ..Default::default() };
        assert_eq!(config.effective_start_year(), 1958);
        let config = AnalysisConfig { start_year: 2000, ..Default::default() };
        assert_eq!(config.effective_start_year(), 2000);
    }

    #[test]
    fn test_parse_year_filter() {
        assert_eq!(parse_year_filter("all").unwrap(), 1958);
        assert_eq!(parse_year_filter("1950").unwrap(), 1958);
        assert_eq!(parse_year_filter(" 2000 ").unwrap(), 2000);
        assert!(parse_year_filter("20x0").is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = AnalysisConfig { seed: Some(42), ..Default::default() };
        let json = serde_json::to_string(&config).unwrap();
        let restored: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_config_partial_json() {
        let restored: AnalysisConfig = serde_json::from_str(r#"{"start_year": 2010}"#).unwrap();
        assert_eq!(restored.start_year, 2010);
        assert_eq!(restored.high_low_midpoint, 25);
        assert_eq!(restored.top, 10);
    }
}
