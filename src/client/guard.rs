//! Once-per-day submission guard kept on the submitting device.
//!
//! The ledger is a convenience gate, not a source of truth: deleting the
//! file or using another device allows rating again.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, warn};

use crate::ratings::{aggregator::Stars, repo_types::iso_date};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub rating: u8,
}

#[derive(Debug, Default)]
pub struct SubmissionLedger {
    path: Option<PathBuf>,
    records: BTreeMap<String, SubmissionRecord>,
}

impl SubmissionLedger {
    /// A ledger that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the ledger at `path`. A missing or unreadable file starts an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, path = %path.display(), "ledger unreadable; starting fresh");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("read ledger {}", path.display()))
            }
        };
        Ok(Self {
            path: Some(path),
            records,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(&self.records)?;
        fs::write(&tmp, body).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }

    pub fn has_rated_today(&self, meal: &str, today: Date) -> bool {
        self.records
            .get(meal)
            .is_some_and(|r| r.date == today)
    }

    pub fn mark_rated(&mut self, meal: &str, rating: Stars, date: Date) {
        self.records.insert(
            meal.to_string(),
            SubmissionRecord {
                date,
                rating: rating.get(),
            },
        );
    }

    /// Drops every record not dated `today`; returns how many were dropped.
    pub fn purge_stale(&mut self, today: Date) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| r.date == today);
        let purged = before - self.records.len();
        if purged > 0 {
            debug!(purged, "stale submission records removed");
        }
        purged
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &SubmissionRecord)> {
        self.records.iter().map(|(m, r)| (m.as_str(), r))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn stars(n: i64) -> Stars {
        Stars::try_from(n).unwrap()
    }

    #[test]
    fn guard_holds_for_the_day_only() {
        let mut ledger = SubmissionLedger::in_memory();
        let today = date!(2026 - 10 - 16);
        assert!(!ledger.has_rated_today("lunch", today));

        ledger.mark_rated("lunch", stars(4), today);
        assert!(ledger.has_rated_today("lunch", today));
        assert!(!ledger.has_rated_today("dinner", today));
        assert!(!ledger.has_rated_today("lunch", date!(2026 - 10 - 17)));
    }

    #[test]
    fn purge_keeps_only_today() {
        let mut ledger = SubmissionLedger::in_memory();
        ledger.mark_rated("breakfast", stars(3), date!(2026 - 10 - 15));
        ledger.mark_rated("lunch", stars(5), date!(2026 - 10 - 16));

        assert_eq!(ledger.purge_stale(date!(2026 - 10 - 16)), 1);
        let left: Vec<&str> = ledger.records().map(|(m, _)| m).collect();
        assert_eq!(left, ["lunch"]);
    }

    #[test]
    fn ledger_survives_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        let mut ledger = SubmissionLedger::load(&path).unwrap();
        ledger.mark_rated("snacks", stars(2), date!(2026 - 10 - 16));
        ledger.save().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"2026-10-16\""));

        let reloaded = SubmissionLedger::load(&path).unwrap();
        assert!(reloaded.has_rated_today("snacks", date!(2026 - 10 - 16)));
        assert_eq!(
            reloaded.records().next().map(|(_, r)| r.rating),
            Some(2)
        );
    }

    #[test]
    fn corrupt_ledger_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{not json").unwrap();

        let ledger = SubmissionLedger::load(&path).unwrap();
        assert_eq!(ledger.records().count(), 0);
    }
}
