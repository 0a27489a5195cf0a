use std::fmt;
use std::fmt::Formatter;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, WriterBuilder};
use glob::glob;
use crate::city::City;
use crate::config::Files;
use crate::errors::StoreError;

/// Snapshot kind markers used as the leading token of every identifier
pub const KIND_HOURLY: &str = "hourly";
pub const KIND_DAILY: &str = "forecast";
pub const KIND_ACTUAL: &str = "actual";

/// One flat row of a snapshot file. Columns keep their insertion order so
/// saved files keep a stable layout, and cell access distinguishes a missing
/// or non-numeric value from zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Record {
        Record { columns: Vec::new() }
    }

    /// Sets a column value, replacing any existing value for that column
    pub fn set(&mut self, column: &str, value: String) {
        if let Some(cell) = self.columns.iter_mut().find(|(c, _)| c == column) {
            cell.1 = value;
        } else {
            self.columns.push((column.to_string(), value));
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the cell parsed as a number, or None if the column is absent,
    /// empty or not numeric. A missing value is never coerced to zero.
    ///
    /// # Arguments
    ///
    /// * 'column' - the column to read
    pub fn numeric(&self, column: &str) -> Option<f64> {
        self.get(column)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(|v| v.parse::<f64>().ok())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }
}

/// Parsed snapshot identifier.
///
/// Snapshots are stored under one of two fixed patterns:
/// * '{kind}_{city}_{YYYY-MM-DD}_{HH-MM}' for hourly artifacts
/// * '{kind}_{city}_{YYYY-MM-DD}' for daily artifacts
///
/// The embedded date (and time, where present) is the generation time of the
/// snapshot, which the horizon computation depends on. A name that does not
/// match either pattern makes every derived horizon meaningless, so parsing
/// fails hard and the caller skips the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotId {
    pub kind: String,
    pub city: City,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl SnapshotId {
    /// Identifier carrying a full generation timestamp (minute precision)
    pub fn timestamped(kind: &str, city: City, generated: NaiveDateTime) -> SnapshotId {
        SnapshotId {
            kind: kind.to_string(),
            city,
            date: generated.date(),
            time: Some(generated.time()),
        }
    }

    /// Identifier carrying only a generation date
    pub fn dated(kind: &str, city: City, date: NaiveDate) -> SnapshotId {
        SnapshotId { kind: kind.to_string(), city, date, time: None }
    }

    /// Parses an identifier from a file name or bare identifier string
    ///
    /// # Arguments
    ///
    /// * 'name' - the identifier, with or without a '.csv' extension
    pub fn parse(name: &str) -> Result<SnapshotId, StoreError> {
        let malformed = || StoreError::MalformedIdentifier(name.to_string());

        let stem = name.strip_suffix(".csv").unwrap_or(name);
        let parts = stem.split('_').collect::<Vec<&str>>();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(malformed());
        }

        let city = City::from_str(parts[1]).map_err(|_| malformed())?;
        let date = NaiveDate::parse_from_str(parts[2], "%Y-%m-%d").map_err(|_| malformed())?;
        let time = match parts.get(3) {
            Some(t) => Some(NaiveTime::parse_from_str(t, "%H-%M").map_err(|_| malformed())?),
            None => None,
        };

        Ok(SnapshotId { kind: parts[0].to_string(), city, date, time })
    }

    /// Parses an identifier from a snapshot file path
    pub fn from_path(path: &Path) -> Result<SnapshotId, StoreError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::MalformedIdentifier(path.display().to_string()))?;

        SnapshotId::parse(name)
    }

    /// The snapshot's generation time; identifiers without a time component
    /// resolve to midnight of the embedded date.
    pub fn generation_time(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}_{}_{}", self.kind, self.city, self.date.format("%Y-%m-%d"))?;
        if let Some(time) = self.time {
            write!(f, "_{}", time.format("%H-%M"))?;
        }
        Ok(())
    }
}

/// Creates the storage directories if they do not exist yet. Idempotent,
/// called once at startup rather than as a side effect of anything else.
///
/// # Arguments
///
/// * 'files' - the files configuration section
pub fn init_storage(files: &Files) -> Result<(), StoreError> {
    for dir in [&files.hourly_dir, &files.daily_dir, &files.actual_dir, &files.results_dir] {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Saves records to '{dir}/{name}.csv' with a header taken from the first
/// record. An empty record slice writes nothing.
///
/// # Arguments
///
/// * 'dir' - the directory to save the file to
/// * 'name' - the identifier, without extension
/// * 'records' - the rows to save
pub fn save_records(dir: &str, name: &str, records: &[Record]) -> Result<(), StoreError> {
    let Some(first) = records.first() else {
        return Ok(());
    };

    let path = Path::new(dir).join(format!("{}.csv", name));
    let mut writer = WriterBuilder::new().from_path(&path)?;

    let header = first.columns().collect::<Vec<&str>>();
    writer.write_record(&header)?;
    for record in records {
        writer.write_record(header.iter().map(|c| record.get(c).unwrap_or("")))?;
    }
    writer.flush()?;

    Ok(())
}

/// Loads records from '{dir}/{name}.csv'. A missing file yields an empty
/// collection, never an error.
///
/// # Arguments
///
/// * 'dir' - the directory to load the file from
/// * 'name' - the identifier, without extension
pub fn load_records(dir: &str, name: &str) -> Result<Vec<Record>, StoreError> {
    let path = Path::new(dir).join(format!("{}.csv", name));
    if !path.exists() {
        return Ok(Vec::new());
    }

    load_records_from(&path)
}

/// Loads records from a snapshot file path
pub fn load_records_from(path: &Path) -> Result<Vec<Record>, StoreError> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let header = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (column, value) in header.iter().zip(row.iter()) {
            record.set(column, value.to_string());
        }
        records.push(record);
    }

    Ok(records)
}

/// Returns the sorted snapshot file paths in 'dir' matching a glob pattern.
/// Since identifiers embed the generation timestamp, the name sort doubles
/// as a chronological sort.
///
/// # Arguments
///
/// * 'dir' - the directory to search
/// * 'pattern' - glob pattern, e.g. 'hourly_Koper_*.csv'
pub fn list_snapshots(dir: &str, pattern: &str) -> Result<Vec<PathBuf>, StoreError> {
    let full = Path::new(dir).join(pattern);

    let mut paths = Vec::new();
    for entry in glob(&full.to_string_lossy())? {
        if let Ok(path) = entry {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(cells: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (c, v) in cells {
            r.set(c, v.to_string());
        }
        r
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let dir = dir.path().to_str().unwrap();

        let records = vec![
            record(&[("time", "2025-01-01T05:00"), ("temperature_2m", "10.4")]),
            record(&[("time", "2025-01-01T06:00"), ("temperature_2m", "")]),
        ];
        save_records(dir, "hourly_Koper_2025-01-01_05-00", &records).unwrap();

        let loaded = load_records(dir, "hourly_Koper_2025-01-01_05-00").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].numeric("temperature_2m"), Some(10.4));
        assert_eq!(loaded[1].numeric("temperature_2m"), None);
        assert_eq!(loaded[1].get("time"), Some("2025-01-01T06:00"));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_records(dir.path().to_str().unwrap(), "actual_Koper_2025-01-01").unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_empty_records_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        save_records(dir.path().to_str().unwrap(), "actual_Koper_2025-01-01", &[]).unwrap();
        assert!(!dir.path().join("actual_Koper_2025-01-01.csv").exists());
    }

    #[test]
    fn test_missing_is_not_zero() {
        let r = record(&[("temperature_2m", "abc"), ("precipitation", " ")]);
        assert_eq!(r.numeric("temperature_2m"), None);
        assert_eq!(r.numeric("precipitation"), None);
        assert_eq!(r.numeric("cloudcover"), None);
    }

    #[test]
    fn test_identifier_round_trip_timestamped() {
        let generated = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(6, 30, 0)
            .unwrap();
        let id = SnapshotId::timestamped(KIND_HOURLY, City::Koper, generated);

        assert_eq!(id.to_string(), "hourly_Koper_2025-01-01_06-30");
        let parsed = SnapshotId::parse("hourly_Koper_2025-01-01_06-30.csv").unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.generation_time(), generated);
    }

    #[test]
    fn test_identifier_round_trip_dated() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let id = SnapshotId::dated(KIND_DAILY, City::Maribor, date);

        assert_eq!(id.to_string(), "forecast_Maribor_2025-01-01");
        let parsed = SnapshotId::parse("forecast_Maribor_2025-01-01").unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.generation_time(), date.and_time(NaiveTime::MIN));
    }

    #[test]
    fn test_malformed_identifiers_rejected() {
        for name in [
            "hourly_Koper",
            "hourly_Celje_2025-01-01_06-30",
            "hourly_Koper_20250101_06-30",
            "hourly_Koper_2025-01-01_0630",
            "hourly_Koper_2025-01-01_06-30_extra",
            "notes.txt",
        ] {
            assert!(
                matches!(SnapshotId::parse(name), Err(StoreError::MalformedIdentifier(_))),
                "accepted {}",
                name
            );
        }
    }

    #[test]
    fn test_list_snapshots_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        let rows = vec![record(&[("time", "t")])];

        save_records(dir_str, "hourly_Koper_2025-01-02_06-00", &rows).unwrap();
        save_records(dir_str, "hourly_Koper_2025-01-01_06-00", &rows).unwrap();
        save_records(dir_str, "hourly_Ljubljana_2025-01-01_06-00", &rows).unwrap();

        let paths = list_snapshots(dir_str, "hourly_Koper_*.csv").unwrap();
        let names = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect::<Vec<&str>>();
        assert_eq!(
            names,
            vec!["hourly_Koper_2025-01-01_06-00.csv", "hourly_Koper_2025-01-02_06-00.csv"]
        );
    }
}
