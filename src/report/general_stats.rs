use serde::Serialize;

use crate::domain::model::{ModuleInfo, SampleTable};
use crate::report::{GeneralStatsBlock, TableColumn};

/// The cross-module summary table: one row per sample, columns contributed by
/// every module that produced a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneralStats {
    pub data: SampleTable,
    pub columns: Vec<TableColumn>,
}

impl GeneralStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column keys are prefixed with the module key so two modules can both
    /// report e.g. `reads_total`.
    pub fn add_block(&mut self, module: &ModuleInfo, block: &GeneralStatsBlock) {
        for column in &block.columns {
            let key = format!("{}-{}", module.key, column.key);
            let mut header = column.header.clone();
            if header.namespace.is_none() {
                header.namespace = Some(module.name.to_string());
            }

            for (sample, record) in &block.data {
                if let Some(value) = record.get(&column.key) {
                    self.data
                        .entry(sample.clone())
                        .or_default()
                        .insert(key.clone(), value.clone());
                }
            }

            self.columns.push(TableColumn { key, header });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Record;
    use crate::report::ColumnHeader;

    fn module(key: &'static str, name: &'static str) -> ModuleInfo {
        ModuleInfo {
            key,
            name,
            anchor: key,
            href: "",
            info: "",
        }
    }

    fn block(samples: &[(&str, i64)], field: &str) -> GeneralStatsBlock {
        let mut data = SampleTable::new();
        for (sample, value) in samples {
            let mut record = Record::new();
            record.insert(field, *value);
            data.insert(sample.to_string(), record);
        }
        GeneralStatsBlock {
            data,
            columns: vec![TableColumn::new(field, ColumnHeader::new("Reads", "reads"))],
        }
    }

    #[test]
    fn test_add_block_prefixes_and_merges_samples() {
        let mut stats = GeneralStats::new();
        stats.add_block(&module("one", "One"), &block(&[("s1", 10), ("s2", 20)], "reads"));
        stats.add_block(&module("two", "Two"), &block(&[("s2", 5), ("s3", 7)], "reads"));

        assert_eq!(stats.columns.len(), 2);
        assert_eq!(stats.columns[0].key, "one-reads");
        assert_eq!(stats.columns[1].key, "two-reads");
        assert_eq!(stats.columns[1].header.namespace.as_deref(), Some("Two"));

        assert_eq!(stats.data.len(), 3);
        assert_eq!(stats.data["s2"].get_i64("one-reads"), Some(20));
        assert_eq!(stats.data["s2"].get_i64("two-reads"), Some(5));
        assert!(stats.data["s3"].get("one-reads").is_none());
    }

    #[test]
    fn test_explicit_namespace_is_kept() {
        let mut b = block(&[("s1", 1)], "reads");
        b.columns[0].header = b.columns[0].header.clone().namespace("Custom");

        let mut stats = GeneralStats::new();
        stats.add_block(&module("one", "One"), &b);
        assert_eq!(stats.columns[0].header.namespace.as_deref(), Some("Custom"));
    }
}
