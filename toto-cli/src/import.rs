use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use toto_db::rusqlite::Connection;

use toto_core::models::{validate_numbers, Drawing, PICK_COUNT};
use toto_db::db::insert_drawing;

/// Numbers of one comma-separated line. Empty fields (trailing commas) are
/// ignored.
pub fn parse_record(record: &csv::StringRecord) -> Result<[u8; PICK_COUNT]> {
    let numbers = record
        .iter()
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| {
            field
                .parse::<u8>()
                .with_context(|| format!("Cannot parse '{}' as a number", field))
        })
        .collect::<Result<Vec<u8>>>()?;
    validate_numbers(&numbers)
}

/// Year of a yearly file, taken from its stem (`2020.txt` -> 2020).
pub fn year_from_path(path: &Path) -> Result<u16> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("No file name in {:?}", path))?;
    stem.trim()
        .parse::<u16>()
        .with_context(|| format!("File name {:?} is not a year", path))
}

pub fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Cannot open {:?}", path))
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportResult {
    pub files: u32,
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

/// Yearly files to import: `path` itself, or every file of the directory
/// whose stem is a year, oldest year first.
fn yearly_files(path: &Path) -> Result<Vec<(u16, PathBuf)>> {
    if !path.is_dir() {
        return Ok(vec![(year_from_path(path)?, path.to_path_buf())]);
    }

    let mut files = Vec::new();
    let entries = std::fs::read_dir(path).with_context(|| format!("Cannot read directory {:?}", path))?;
    for entry in entries {
        let file = entry?.path();
        if !file.is_file() {
            continue;
        }
        match year_from_path(&file) {
            Ok(year) => files.push((year, file)),
            Err(_) => log::debug!("Skipping {:?}, not a yearly file", file),
        }
    }
    if files.is_empty() {
        bail!("No yearly files found in {:?}", path);
    }
    files.sort();
    Ok(files)
}

fn import_file(conn: &Connection, year: u16, path: &Path, result: &mut ImportResult) -> Result<()> {
    let mut reader = reader(path)?;
    for (index, record_result) in reader.records().enumerate() {
        result.total_records += 1;
        let record = match record_result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("{:?} record {}: cannot read: {}", path, index + 1, e);
                result.errors += 1;
                continue;
            }
        };
        let issue = record
            .position()
            .map_or(index as u32 + 1, |p| p.line() as u32);
        match parse_record(&record) {
            Ok(numbers) => match insert_drawing(conn, &Drawing::new(year, issue, numbers)) {
                Ok(true) => result.inserted += 1,
                Ok(false) => result.skipped += 1,
                Err(e) => {
                    log::warn!("{:?} line {}: insert failed: {}", path, issue, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                log::warn!("{:?} line {}: {:#}", path, issue, e);
                result.errors += 1;
            }
        }
    }
    result.files += 1;
    Ok(())
}

/// Imports one yearly file or a directory of them in a single transaction.
pub fn import_path(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let files = yearly_files(path)?;

    let tx = conn
        .unchecked_transaction()
        .context("Cannot start transaction")?;

    let mut result = ImportResult::default();
    for (year, file) in &files {
        import_file(&tx, *year, file, &mut result)?;
    }

    tx.commit().context("Commit failed")?;
    log::info!(
        "Imported {} files: {} inserted, {} skipped, {} errors",
        result.files,
        result.inserted,
        result.skipped,
        result.errors
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use toto_db::db::{count_drawings, fetch_drawings_since, migrate};

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn record(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_parse_record() {
        assert_eq!(
            parse_record(&record(&["5", " 14", "22 ", "25", "34", "49"])).unwrap(),
            [5, 14, 22, 25, 34, 49]
        );
        assert_eq!(
            parse_record(&record(&["1", "2", "3", "4", "5", "6", ""])).unwrap(),
            [1, 2, 3, 4, 5, 6]
        );
        assert!(parse_record(&record(&["1", "2", "3", "4", "5"])).is_err());
        assert!(parse_record(&record(&["1", "2", "3", "4", "5", "50"])).is_err());
        assert!(parse_record(&record(&["1", "2", "x", "4", "5", "6"])).is_err());
    }

    #[test]
    fn test_year_from_path() {
        assert_eq!(year_from_path(Path::new("data/2020.txt")).unwrap(), 2020);
        assert_eq!(year_from_path(Path::new("1999")).unwrap(), 1999);
        assert!(year_from_path(Path::new("notes.txt")).is_err());
    }

    #[test]
    fn test_import_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("2020.txt");
        std::fs::write(&file, "5,14,22,25,34,49\n1,2,3,4,5\n7,8,9,10,11,12\n").unwrap();

        let conn = test_db();
        let result = import_path(&conn, &file).unwrap();
        assert_eq!(result.files, 1);
        assert_eq!(result.total_records, 3);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.errors, 1);

        let drawings = fetch_drawings_since(&conn, 2020).unwrap();
        assert_eq!(drawings.len(), 2);
        assert_eq!(drawings[0].issue, 1);
        assert_eq!(drawings[1].issue, 3);
        assert_eq!(drawings[1].numbers, [7, 8, 9, 10, 11, 12]);

        let again = import_path(&conn, &file).unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.skipped, 2);
        assert_eq!(count_drawings(&conn).unwrap(), 2);
    }

    #[test]
    fn test_import_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2021.txt"), "1,2,3,4,5,6\n").unwrap();
        std::fs::write(dir.path().join("2020.txt"), "7,8,9,10,11,12\n13,14,15,16,17,18\n").unwrap();
        std::fs::write(dir.path().join("README.md"), "not a drawing file\n").unwrap();

        let conn = test_db();
        let result = import_path(&conn, dir.path()).unwrap();
        assert_eq!(result.files, 2);
        assert_eq!(result.inserted, 3);
        assert_eq!(result.errors, 0);

        let years: Vec<u16> = fetch_drawings_since(&conn, 1958)
            .unwrap()
            .iter()
            .map(|d| d.year)
            .collect();
        assert_eq!(years, vec![2020, 2020, 2021]);
    }

    #[test]
    fn test_import_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let conn = test_db();
        assert!(import_path(&conn, dir.path()).is_err());
    }
}
