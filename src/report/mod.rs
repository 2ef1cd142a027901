//! Report model handed to the renderer: data files, general statistics
//! columns and report sections with their plot data.

pub mod general_stats;
pub mod writer;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::model::{ModuleInfo, SampleTable};

pub use general_stats::GeneralStats;
pub use writer::DataFormat;

/// Display metadata for one numeric column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnHeader {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_key: Option<String>,
}

impl ColumnHeader {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    pub fn scale(mut self, scale: &str) -> Self {
        self.scale = Some(scale.to_string());
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn shared_key(mut self, shared_key: &str) -> Self {
        self.shared_key = Some(shared_key.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    pub key: String,
    pub header: ColumnHeader,
}

impl TableColumn {
    pub fn new(key: &str, header: ColumnHeader) -> Self {
        Self {
            key: key.to_string(),
            header,
        }
    }
}

/// Columns a module contributes to the general statistics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralStatsBlock {
    pub data: SampleTable,
    pub columns: Vec<TableColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarCategory {
    pub key: String,
    pub name: String,
}

impl BarCategory {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
        }
    }
}

/// Per-sample `(x, y)` points of one line dataset.
pub type LineSeries = BTreeMap<String, Vec<(f64, f64)>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDataset {
    pub label: String,
    pub ylab: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xlab: Option<String>,
    pub data: LineSeries,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xlab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ylab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ymin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_decimals: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_zero_cats: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpswitch_counts_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tt_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Plot {
    BarGraph {
        data: SampleTable,
        categories: Vec<BarCategory>,
        config: PlotConfig,
    },
    LineGraph {
        datasets: Vec<LineDataset>,
        config: PlotConfig,
    },
    Table {
        data: SampleTable,
        columns: Vec<TableColumn>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub anchor: String,
    pub description: String,
    pub plot: Plot,
}

impl Section {
    pub fn new(name: &str, anchor: &str, description: &str, plot: Plot) -> Self {
        Self {
            name: name.to_string(),
            anchor: anchor.to_string(),
            description: description.to_string(),
            plot,
        }
    }
}

/// A table written to the data directory as `<name>.<ext>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataFile {
    pub name: String,
    pub data: SampleTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleReport {
    pub info: ModuleInfo,
    #[serde(skip)]
    pub data_files: Vec<DataFile>,
    pub general_stats: Option<GeneralStatsBlock>,
    pub sections: Vec<Section>,
}

impl ModuleReport {
    pub fn new(info: ModuleInfo) -> Self {
        Self {
            info,
            data_files: Vec::new(),
            general_stats: None,
            sections: Vec::new(),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.data_files
            .first()
            .map(|f| f.data.len())
            .unwrap_or_default()
    }

    pub fn section(&self, anchor: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.anchor == anchor)
    }
}
