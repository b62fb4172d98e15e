use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::import::{parse_record, reader};
use toto_core::ranking::Sequence;

/// Candidate sequences to rank, one comma-separated line each. Unlike an
/// import, a single bad line rejects the whole file.
pub fn read_candidates(path: &Path) -> Result<Vec<Sequence>> {
    let mut reader = reader(path)?;
    let mut candidates = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("{:?} record {}", path, index + 1))?;
        let line = record.position().map_or(index as u64 + 1, |p| p.line());
        let numbers = parse_record(&record).with_context(|| format!("{:?} line {}", path, line))?;
        candidates.push(numbers);
    }
    if candidates.is_empty() {
        bail!("No candidates in {:?}", path);
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("candidates.txt");
        std::fs::write(&file, "1,2,3,4,5,6\n\n49, 48, 47, 46, 45, 44\n").unwrap();

        let candidates = read_candidates(&file).unwrap();
        assert_eq!(candidates, vec![[1, 2, 3, 4, 5, 6], [49, 48, 47, 46, 45, 44]]);
    }

    #[test]
    fn test_read_candidates_rejects_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("candidates.txt");
        std::fs::write(&file, "1,2,3,4,5,6\n1,1,2,3,4,5\n").unwrap();
        assert!(read_candidates(&file).is_err());
    }

    #[test]
    fn test_read_candidates_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("candidates.txt");
        std::fs::write(&file, "").unwrap();
        assert!(read_candidates(&file).is_err());
    }
}
