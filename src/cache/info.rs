//! Cache Info Module
//!
//! Operational summary of the cache reported to administrators.

use serde::Serialize;

use crate::cache::CacheEntry;

// == Cache Info ==
/// Snapshot of cache occupancy.
///
/// `alive_count` counts entries that carry an expiration deadline and
/// `expire_count` the ones that never expire. The names are kept for
/// compatibility with existing dashboards even though they read backwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheInfo {
    /// Current number of entries
    pub size: usize,
    /// Entries with a deadline
    pub alive_count: usize,
    /// Entries without a deadline
    pub expire_count: usize,
    /// `expire_count / size` rounded to two decimals, 0.0 when empty
    pub expire_rate: f64,
    /// Snapshot version that the next persist will write
    pub version: u64,
}

impl CacheInfo {
    pub fn collect<'a>(entries: impl IntoIterator<Item = &'a CacheEntry>, version: u64) -> Self {
        let mut size = 0;
        let mut alive_count = 0;
        for entry in entries {
            size += 1;
            if entry.expires_at.is_some() {
                alive_count += 1;
            }
        }
        let expire_count = size - alive_count;

        Self {
            size,
            alive_count,
            expire_count,
            expire_rate: rate(expire_count, size),
            version,
        }
    }
}

fn rate(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 100.0).round() / 100.0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheValue;

    fn entry(expires_at: Option<u64>) -> CacheEntry {
        CacheEntry::new(CacheValue::Null, 0, expires_at)
    }

    #[test]
    fn test_info_empty() {
        let info = CacheInfo::collect(std::iter::empty(), 4);
        assert_eq!(info.size, 0);
        assert_eq!(info.alive_count, 0);
        assert_eq!(info.expire_count, 0);
        assert_eq!(info.expire_rate, 0.0);
        assert_eq!(info.version, 4);
    }

    #[test]
    fn test_alive_counts_entries_with_deadline() {
        let entries = [entry(Some(10)), entry(None), entry(None)];
        let info = CacheInfo::collect(&entries, 0);
        assert_eq!(info.size, 3);
        assert_eq!(info.alive_count, 1);
        assert_eq!(info.expire_count, 2);
        assert_eq!(info.expire_rate, 0.67);
    }

    #[test]
    fn test_info_serialize() {
        let info = CacheInfo::collect(&[entry(None)], 2);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["size"], 1);
        assert_eq!(json["expire_rate"], 1.0);
        assert_eq!(json["version"], 2);
    }
}
