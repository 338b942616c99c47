// Cache store for reading and writing cached tables.
// Handles CSV serialization, atomic writes, and filesystem metadata.

use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{AcquireError, Result};
use crate::table::Table;

/// Metadata about a cache file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Read a cached table, returning `None` when no file exists.
/// A file that exists but cannot be opened or parsed is a `CacheRead` error.
pub fn read_table(path: &Path) -> Result<Option<Table>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = fs::File::open(path).map_err(|e| AcquireError::CacheRead {
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    Table::read_csv(BufReader::new(file))
        .map(Some)
        .map_err(|source| AcquireError::CacheRead {
            path: path.to_path_buf(),
            source,
        })
}

/// Write a table to the cache as CSV.
pub fn write_table(path: &Path, table: &Table) -> std::result::Result<(), csv::Error> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Write atomically via temp file
    let tmp = temp_path(path);
    let result = write_file(&tmp, table)
        .and_then(|()| fs::rename(&tmp, path).map_err(csv::Error::from));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Sibling temp file: the full file name plus `.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_file(path: &Path, table: &Table) -> std::result::Result<(), csv::Error> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    table.write_csv(&mut writer)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Size and modification time of a cache file, if present.
pub fn entry_status(path: &Path) -> Result<Option<EntryStatus>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(EntryStatus {
        path: path.to_path_buf(),
        size: metadata.len(),
        modified: DateTime::<Utc>::from(metadata.modified()?),
    }))
}

/// Delete a cached file. Returns whether a file was removed.
pub fn delete(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_table() -> Table {
        let mut table = Table::new();
        for id in 1..=3 {
            let serde_json::Value::Object(record) =
                json!({"store_id": id, "store_city": "San Antonio", "store_zipcode": "78253"})
            else {
                unreachable!()
            };
            table.push_record(record);
        }
        table
    }

    #[test]
    fn test_write_and_read_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stores.csv");
        let table = sample_table();

        write_table(&path, &table).unwrap();

        let read = read_table(&path).unwrap().unwrap();
        assert_eq!(read.columns(), table.columns());
        assert_eq!(read.to_text_rows(), table.to_text_rows());
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_temp_path_keeps_full_name() {
        let dir = Path::new("/cache");
        assert_eq!(temp_path(&dir.join("items.csv")), dir.join("items.csv.tmp"));
        assert_ne!(temp_path(&dir.join("items.tsv")), temp_path(&dir.join("items.csv")));
        assert_eq!(temp_path(&dir.join("x.tmp")), dir.join("x.tmp.tmp"));
    }

    #[test]
    fn test_write_tmp_named_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("x.tmp");

        write_table(&path, &sample_table()).unwrap();

        let read = read_table(&path).unwrap().unwrap();
        assert_eq!(read.len(), 3);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("items.csv");

        write_table(&path, &sample_table()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.csv");

        assert!(read_table(&path).unwrap().is_none());
        assert!(entry_status(&path).unwrap().is_none());
        assert!(!delete(&path).unwrap());
    }

    #[test]
    fn test_read_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sales.csv");
        fs::write(&path, "sale_id,sale_amount\n1,13\n2\n").unwrap();

        let err = read_table(&path).unwrap_err();
        assert!(matches!(err, AcquireError::CacheRead { .. }));
    }

    #[test]
    fn test_entry_status_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("items.csv");
        write_table(&path, &sample_table()).unwrap();

        let status = entry_status(&path).unwrap().unwrap();
        assert_eq!(status.path, path);
        assert!(status.size > 0);
        assert!(status.modified <= Utc::now());

        assert!(delete(&path).unwrap());
        assert!(!path.exists());
    }
}
