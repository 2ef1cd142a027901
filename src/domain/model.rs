use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::report::{GeneralStats, ModuleReport};
use crate::utils::error::{QcError, Result};

/// One flat row of extracted values, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: BTreeMap<String, serde_json::Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens any struct that serializes to a JSON object into a record.
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(Self {
                data: map.into_iter().collect(),
            }),
            other => Err(QcError::ConfigError {
                message: format!("expected an object to build a record, got {}", other),
            }),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(|v| v.as_f64())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(|v| v.as_i64())
    }

    /// Keeps only the listed fields, in no particular order.
    pub fn project(&self, keys: &[&str]) -> Record {
        let data = keys
            .iter()
            .filter_map(|k| self.data.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect();
        Record { data }
    }
}

/// Per-sample records, ordered by sample name.
pub type SampleTable = BTreeMap<String, Record>;

/// A log file that matched a module's search pattern.
#[derive(Debug, Clone)]
pub struct LogFile {
    pub module: String,
    pub path: PathBuf,
    pub file_name: String,
    pub sample_name: String,
    pub contents: String,
}

impl LogFile {
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

/// Static identity of a report module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub anchor: &'static str,
    pub href: &'static str,
    pub info: &'static str,
}

/// How a module recognises its log files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPattern {
    /// File-name globs; a file matches when any glob matches.
    #[serde(default)]
    pub fn_globs: Vec<String>,
    /// Substring that must appear in the file.
    pub contents: Option<String>,
    /// Only the first `num_lines` lines are searched for `contents`; 0 searches everything.
    #[serde(default)]
    pub num_lines: usize,
}

/// Which file a sample's data came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub module: String,
    pub sample_name: String,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub reports: Vec<ModuleReport>,
    pub general_stats: GeneralStats,
    pub sources: Vec<SourceFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Counts {
        total: u64,
        #[serde(rename = "full-length_cp")]
        full_length_cp: u64,
        percent: f64,
    }

    #[test]
    fn test_record_from_serializable() {
        let record = Record::from_serializable(&Counts {
            total: 10,
            full_length_cp: 3,
            percent: 12.5,
        })
        .unwrap();

        assert_eq!(record.get_i64("total"), Some(10));
        assert_eq!(record.get_i64("full-length_cp"), Some(3));
        assert_eq!(record.get_f64("percent"), Some(12.5));
    }

    #[test]
    fn test_record_from_non_object_fails() {
        assert!(Record::from_serializable(&42u32).is_err());
    }

    #[test]
    fn test_record_project() {
        let mut record = Record::new();
        record.insert("a", 1);
        record.insert("b", 2);
        record.insert("c", 3);

        let projected = record.project(&["a", "c", "missing"]);
        assert_eq!(projected.data.len(), 2);
        assert_eq!(projected.get_i64("c"), Some(3));
    }
}
