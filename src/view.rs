//! Client-side filtering and sorting of package lists

use crate::bridge::PackageRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Id,
    Version,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::Id => "ID",
            SortKey::Version => "Version",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortKey::Name => SortKey::Id,
            SortKey::Id => SortKey::Version,
            SortKey::Version => SortKey::Name,
        }
    }

    fn field(self, record: &PackageRecord) -> &str {
        match self {
            SortKey::Name => &record.name,
            SortKey::Id => &record.id,
            SortKey::Version => &record.version,
        }
    }
}

/// Filter text plus sort key for one package list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSortSpec {
    pub filter: String,
    pub sort: SortKey,
}

impl FilterSortSpec {
    pub fn apply<'a>(&self, records: &'a [PackageRecord]) -> Vec<&'a PackageRecord> {
        transform(records, &self.filter, self.sort)
    }
}

/// Keep records whose name or id contains `filter` (case-insensitive), then
/// sort them by `key`, ordinal and ascending.
///
/// A whitespace-only filter passes everything. Otherwise the filter is
/// matched as typed, surrounding spaces included.
///
/// The sort is stable, so equal keys keep their input order and repeated
/// calls render identically.
pub fn transform<'a>(records: &'a [PackageRecord], filter: &str, key: SortKey) -> Vec<&'a PackageRecord> {
    let mut out: Vec<&PackageRecord> = if filter.trim().is_empty() {
        records.iter().collect()
    } else {
        let needle = filter.to_lowercase();
        records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle) || r.id.to_lowercase().contains(&needle))
            .collect()
    };
    out.sort_by(|a, b| key.field(a).cmp(key.field(b)));
    out
}

/// Summary of how current the installed set is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageHealth {
    pub installed: usize,
    pub upgrades: usize,
    pub pinned: usize,
}

impl PackageHealth {
    pub fn new(installed: usize, upgrades: usize, pinned: usize) -> Self {
        Self {
            installed,
            upgrades,
            pinned,
        }
    }

    pub fn up_to_date(&self) -> usize {
        self.installed.saturating_sub(self.upgrades + self.pinned)
    }

    fn percent(&self, part: usize) -> u8 {
        if self.installed == 0 {
            return 0;
        }
        ((part as f64 / self.installed as f64) * 100.0).round().min(100.0) as u8
    }

    /// Share of packages with nothing to do. An empty set counts as healthy.
    pub fn up_to_date_percent(&self) -> u8 {
        if self.installed == 0 {
            return 100;
        }
        self.percent(self.up_to_date())
    }

    pub fn upgrades_percent(&self) -> u8 {
        self.percent(self.upgrades)
    }

    pub fn pinned_percent(&self) -> u8 {
        self.percent(self.pinned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, name: &str, version: &str) -> PackageRecord {
        PackageRecord::new(id, name, version)
    }

    fn sample() -> Vec<PackageRecord> {
        vec![
            rec("Mozilla.Firefox", "Mozilla Firefox", "120.0"),
            rec("Git.Git", "Git", "2.43.0"),
            rec("7zip.7zip", "7-Zip", "23.01"),
            rec("Mozilla.Thunderbird", "Thunderbird", "115.5"),
        ]
    }

    fn ids(records: &[&PackageRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn blank_filter_keeps_everything() {
        let records = sample();
        for filter in ["", "   "] {
            let out = transform(&records, filter, SortKey::Name);
            assert_eq!(out.len(), records.len());
        }
    }

    #[test]
    fn filter_matches_name_or_id_case_insensitively() {
        let records = sample();
        let out = transform(&records, "MOZILLA", SortKey::Id);
        assert_eq!(ids(&out), ["Mozilla.Firefox", "Mozilla.Thunderbird"]);

        let out = transform(&records, "thunder", SortKey::Name);
        assert_eq!(ids(&out), ["Mozilla.Thunderbird"]);
    }

    #[test]
    fn filter_keeps_surrounding_spaces() {
        let records = vec![
            rec("Mozilla.Firefox", "Mozilla Firefox", "120.0"),
            rec("Godzilla.Game", "Godzilla", "1.0"),
        ];
        let out = transform(&records, "zilla ", SortKey::Name);
        assert_eq!(ids(&out), ["Mozilla.Firefox"]);

        let out = transform(&records, " godzilla", SortKey::Name);
        assert!(out.is_empty());
    }

    #[test]
    fn sorts_ordinally_by_each_key() {
        let records = sample();
        assert_eq!(
            ids(&transform(&records, "", SortKey::Name)),
            ["7zip.7zip", "Git.Git", "Mozilla.Firefox", "Mozilla.Thunderbird"]
        );
        assert_eq!(
            ids(&transform(&records, "", SortKey::Version)),
            // "115.5" < "120.0" < "2.43.0" < "23.01"
            ["Mozilla.Thunderbird", "Mozilla.Firefox", "Git.Git", "7zip.7zip"]
        );
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let records = vec![rec("b", "Same", "1"), rec("a", "Same", "1"), rec("c", "Same", "1")];
        let out = transform(&records, "", SortKey::Name);
        assert_eq!(ids(&out), ["b", "a", "c"]);
    }

    #[test]
    fn transform_is_idempotent_and_leaves_input_alone() {
        let records = sample();
        let before = records.clone();
        let first = transform(&records, "o", SortKey::Version);
        let second = transform(&records, "o", SortKey::Version);
        assert_eq!(first, second);
        assert_eq!(records, before);

        let owned: Vec<PackageRecord> = first.into_iter().cloned().collect();
        let again = transform(&owned, "o", SortKey::Version);
        assert_eq!(ids(&again), owned.iter().map(|r| r.id.clone()).collect::<Vec<_>>());
    }

    #[test]
    fn filter_sort_apply_matches_transform() {
        let records = sample();
        let spec = FilterSortSpec {
            filter: "git".into(),
            sort: SortKey::Id,
        };
        assert_eq!(spec.apply(&records), transform(&records, "git", SortKey::Id));
    }

    #[test]
    fn sort_key_cycles() {
        assert_eq!(SortKey::Name.next().next().next(), SortKey::Name);
    }

    #[test]
    fn health_percentages() {
        let health = PackageHealth::new(10, 3, 1);
        assert_eq!(health.up_to_date(), 6);
        assert_eq!(health.up_to_date_percent(), 60);
        assert_eq!(health.upgrades_percent(), 30);
        assert_eq!(health.pinned_percent(), 10);

        let empty = PackageHealth::default();
        assert_eq!(empty.up_to_date_percent(), 100);
        assert_eq!(empty.upgrades_percent(), 0);
    }
}
