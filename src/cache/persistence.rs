//! Snapshot file format and I/O.
//!
//! A snapshot is one JSON document `{ "version": n, "items": { key: entry } }`
//! that is fully rewritten on every persist. Writes go to a sibling temp file
//! which is then renamed over the target, so a crash mid-write never leaves a
//! truncated snapshot behind.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::CacheEntry;
use crate::error::Result;

/// Default snapshot file name, relative to the working directory.
pub const SNAPSHOT_FILE: &str = "cache.json";

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u64,
    items: &'a HashMap<String, CacheEntry>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    version: Value,
    #[serde(default)]
    items: Value,
}

/// Decoded snapshot. Items that failed to decode are kept with their error so
/// the loader can skip them individually.
#[derive(Debug)]
pub struct Snapshot {
    pub version: Option<u64>,
    pub items: Vec<(String, serde_json::Result<CacheEntry>)>,
}

/// Writes `items` and `version` to `path`, replacing the previous snapshot.
pub fn write_snapshot(path: &Path, version: u64, items: &HashMap<String, CacheEntry>) -> Result<()> {
    let body = serde_json::to_string_pretty(&SnapshotRef { version, items })?;
    let tmp = temp_path(path);

    fs::write(&tmp, body)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

/// Reads the snapshot at `path`. A missing file is `Ok(None)`.
pub fn read_snapshot(path: &Path) -> Result<Option<Snapshot>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let parsed: RawSnapshot = serde_json::from_str(&raw)?;

    let items = match parsed.items {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, item)| (key, serde_json::from_value(item)))
            .collect(),
        _ => Vec::new(),
    };

    Ok(Some(Snapshot {
        version: parsed.version.as_u64().filter(|v| *v > 0),
        items,
    }))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from(SNAPSHOT_FILE));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheValue;
    use crate::error::CacheError;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let mut items = HashMap::new();
        items.insert(
            "k".to_string(),
            CacheEntry::new(CacheValue::from("v"), 5, Some(50)),
        );

        write_snapshot(&path, 3, &items).unwrap();
        assert!(!temp_path(&path).exists(), "temp file should be renamed away");

        let snapshot = read_snapshot(&path).unwrap().unwrap();
        assert_eq!(snapshot.version, Some(3));
        assert_eq!(snapshot.items.len(), 1);
        let (key, entry) = &snapshot.items[0];
        assert_eq!(key, "k");
        assert_eq!(entry.as_ref().unwrap().expires_at, Some(50));
    }

    #[test]
    fn test_written_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let mut items = HashMap::new();
        items.insert(
            "k".to_string(),
            CacheEntry::new(CacheValue::from(json!({"n": 1})), 5, None),
        );
        write_snapshot(&path, 0, &items).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            json!({"version": 0, "items": {"k": {"value": {"n": 1}, "createAt": 5, "expireAt": null}}})
        );
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_snapshot(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(read_snapshot(&path), Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_lenient_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"version": "seven", "items": [1, 2]}"#).unwrap();

        let snapshot = read_snapshot(&path).unwrap().unwrap();
        assert_eq!(snapshot.version, None);
        assert!(snapshot.items.is_empty());
    }

    #[test]
    fn test_bad_item_kept_as_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(
            &path,
            r#"{"version": 2, "items": {"good": {"value": 1, "createAt": 1, "expireAt": null}, "bad": null}}"#,
        )
        .unwrap();

        let snapshot = read_snapshot(&path).unwrap().unwrap();
        let bad = snapshot.items.iter().filter(|(_, item)| item.is_err()).count();
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(bad, 1);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("cache.json");

        let result = write_snapshot(&path, 0, &HashMap::new());
        assert!(matches!(result, Err(CacheError::Persistence(_))));
    }
}
