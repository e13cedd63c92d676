//! Result sets and the baseline store.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tempfile::NamedTempFile;

use crate::capture::CapturedRecord;
use crate::error::{Error, Result};
use crate::scenario::matches_filter;

/// Scenario name -> captured record, in the order scenarios were run.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    entries: Vec<(String, CapturedRecord)>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Re-inserting a name replaces the record in place and
    /// returns the old one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        record: CapturedRecord,
    ) -> Option<CapturedRecord> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, record)),
            None => {
                self.entries.push((name, record));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CapturedRecord> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapturedRecord)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Entries whose name or recorded command contains `pattern`.
    pub fn filtered(&self, pattern: &str) -> ResultSet {
        self.iter()
            .filter(|(name, record)| matches_filter(name, &record.command, pattern))
            .map(|(name, record)| (name.to_string(), record.clone()))
            .collect()
    }
}

impl FromIterator<(String, CapturedRecord)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (String, CapturedRecord)>>(iter: I) -> Self {
        let mut set = ResultSet::new();
        for (name, record) in iter {
            set.insert(name, record);
        }
        set
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, record) in &self.entries {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResultSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ResultSetVisitor;

        impl<'de> Visitor<'de> for ResultSetVisitor {
            type Value = ResultSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of scenario name to captured record")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<ResultSet, A::Error> {
                let mut set = ResultSet::new();
                while let Some((name, record)) = access.next_entry::<String, CapturedRecord>()? {
                    if set.contains(&name) {
                        return Err(de::Error::custom(format!("duplicate scenario '{name}'")));
                    }
                    set.insert(name, record);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(ResultSetVisitor)
    }
}

/// The accepted ground truth: one JSON document, replaced wholesale on every
/// capture pass.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the baseline with `results`.
    ///
    /// The document is written next to the target and renamed over it, so
    /// readers only ever see a complete snapshot.
    pub fn save(&self, results: &ResultSet) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, results)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        log::info!(
            "Baseline with {} scenarios saved to {}",
            results.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Load the baseline, failing with [`Error::BaselineMissing`] if no
    /// capture pass has been run yet.
    pub fn load(&self) -> Result<ResultSet> {
        if !self.exists() {
            return Err(Error::BaselineMissing {
                path: self.path.clone(),
            });
        }
        log::debug!("Loading baseline from {}", self.path.display());
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| Error::InvalidBaseline {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{record, result_set};
    use pretty_assertions::assert_eq;

    #[test]
    fn save_then_load_roundtrip_keeps_order() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(tmp.path().join("baseline.json"));
        let results = result_set(&[
            ("version", record("--version", "v1.0\n", "", 0)),
            ("add", record("add", "", "missing argument\n", 1)),
            ("apply-dry-run", record("apply --dry-run", "would apply 3\n", "", 0)),
        ]);

        store.save(&results).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, results);
        assert_eq!(
            loaded.names().collect::<Vec<_>>(),
            vec!["version", "add", "apply-dry-run"]
        );
    }

    #[test]
    fn measured_durations_survive_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(tmp.path().join("baseline.json"));
        let results: ResultSet = (0..2000u64)
            .map(|i| {
                let mut rec = record("status", "ok\n", "", 0);
                rec.duration =
                    std::time::Duration::from_nanos(1_234_567 + i * 7_919_113).as_secs_f64();
                (format!("status-{i}"), rec)
            })
            .collect();

        store.save(&results).unwrap();

        assert_eq!(store.load().unwrap(), results);
    }

    #[test]
    fn load_without_baseline_is_baseline_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(tmp.path().join("baseline.json"));

        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::BaselineMissing { .. }));
    }

    #[test]
    fn save_replaces_wholesale() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(tmp.path().join("baseline.json"));

        store
            .save(&result_set(&[
                ("help", record("--help", "usage\n", "", 0)),
                ("status", record("status", "ok\n", "", 0)),
            ]))
            .unwrap();
        let second = result_set(&[("status", record("status", "changed\n", "", 0))]);
        store.save(&second).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, second);
        assert!(!loaded.contains("help"));
    }

    #[test]
    fn document_is_keyed_by_scenario_name() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(tmp.path().join("baseline.json"));
        store
            .save(&result_set(&[("version", record("--version", "v1.0\n", "", 0))]))
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(value["version"]["stdout"], "v1.0\n");
        assert_eq!(value["version"]["exit_code"], 0);
        assert_eq!(value["version"]["command"], "--version");
    }

    #[test]
    fn rejects_malformed_records() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(tmp.path().join("baseline.json"));

        fs::write(store.path(), r#"{"version": {"command": "--version", "stdout": ""}}"#).unwrap();
        assert!(matches!(store.load(), Err(Error::InvalidBaseline { .. })));

        fs::write(store.path(), "[1, 2, 3]").unwrap();
        assert!(matches!(store.load(), Err(Error::InvalidBaseline { .. })));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(tmp.path().join("baseline.json"));
        let rec = r#"{"command": "x", "stdout": "", "stderr": "", "exit_code": 0, "duration": 0.1}"#;
        fs::write(store.path(), format!(r#"{{"a": {rec}, "a": {rec}}}"#)).unwrap();

        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("duplicate scenario 'a'"));
    }

    #[test]
    fn filtered_matches_name_or_recorded_command() {
        let results = result_set(&[
            ("list-all", record("list", "", "", 0)),
            ("status", record("status", "", "", 0)),
            ("list-packages", record("list --packages", "", "", 0)),
        ]);

        assert_eq!(results.filtered("list").len(), 2);
        assert_eq!(results.filtered("--packages").len(), 1);
        assert!(results.filtered("zzz").is_empty());
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut results = result_set(&[
            ("a", record("a", "1", "", 0)),
            ("b", record("b", "2", "", 0)),
        ]);
        let old = results.insert("a", record("a", "3", "", 0));

        assert_eq!(old.map(|r| r.stdout), Some("1".to_string()));
        assert_eq!(results.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(results.get("a").map(|r| r.stdout.as_str()), Some("3"));
    }
}
