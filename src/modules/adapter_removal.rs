//! AdapterRemoval `*.settings` logs.
//!
//! The settings file is a sequence of `[Section]` blocks. Run statistics are
//! read by line offset from `[Trimming statistics]`, and the per-length read
//! counts come from the tab-separated `[Length distribution]` table, whose
//! column header also tells single-end from paired-end and collapsed runs.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::model::{LogFile, ModuleInfo, Record, SampleTable, SearchPattern};
use crate::domain::ports::QcModule;
use crate::report::{
    BarCategory, ColumnHeader, DataFile, GeneralStatsBlock, LineDataset, LineSeries,
    ModuleReport, Plot, PlotConfig, Section, TableColumn,
};
use crate::utils::error::{QcError, Result};

const HEADER_BLOCK: &str = "header";
const TRIM_BLOCK: &str = "Trimming statistics";
const LENGTH_BLOCK: &str = "Length distribution";

pub const DATA_FILE: &str = "multiqc_adapter_removal";

static INFO: ModuleInfo = ModuleInfo {
    key: "adapter_removal",
    name: "Adapter Removal",
    anchor: "adapterRemoval",
    href: "https://github.com/MikkelSchubert/adapterremoval",
    info: "rapid adapter trimming, identification, and read merging",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadType {
    Single,
    Paired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMode {
    pub read_type: ReadType,
    pub collapsed: bool,
}

impl RunMode {
    /// Classifies the run from the `[Length distribution]` column header.
    pub fn from_header(header: &str) -> Option<Self> {
        let columns: Vec<&str> = header.trim_end().split('\t').collect();
        if columns.len() < 3 {
            return None;
        }
        let read_type = if columns[2] == "Mate2" {
            ReadType::Paired
        } else {
            ReadType::Single
        };
        let collapsed = columns[columns.len() - 3] == "CollapsedTruncated";
        Some(Self {
            read_type,
            collapsed,
        })
    }

    fn is_paired(&self) -> bool {
        self.read_type == ReadType::Paired
    }

    fn retained_offset(&self) -> usize {
        match (self.read_type, self.collapsed) {
            (ReadType::Single, _) => 6,
            (ReadType::Paired, false) => 8,
            (ReadType::Paired, true) => 10,
        }
    }

    pub fn describe(&self) -> &'static str {
        match (self.read_type, self.collapsed) {
            (ReadType::Single, false) => "single-end",
            (ReadType::Single, true) => "single-end collapsed",
            (ReadType::Paired, false) => "paired-end",
            (ReadType::Paired, true) => "paired-end collapsed",
        }
    }
}

/// Trimming statistics, both as reported and derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrimStats {
    pub total: i64,
    pub unaligned: i64,
    pub aligned: i64,
    pub discarded_m1: i64,
    pub singleton_m1: i64,
    pub discarded_m2: i64,
    pub singleton_m2: i64,
    #[serde(rename = "full-length_cp")]
    pub full_length_cp: i64,
    pub truncated_cp: i64,
    pub retained: i64,
    pub reads_total: i64,
    pub aligned_total: i64,
    pub unaligned_total: i64,
    pub discarded_total: i64,
    pub retained_reads: i64,
    pub percent_aligned: f64,
}

impl TrimStats {
    fn derive(&mut self, file: &str, mode: RunMode) -> Result<()> {
        let overflow = |field: &str| {
            QcError::parse(file, format!("[{}] {} overflows", TRIM_BLOCK, field))
        };
        let factor = if mode.is_paired() { 2 } else { 1 };

        self.reads_total = self
            .total
            .checked_mul(factor)
            .ok_or_else(|| overflow("reads_total"))?;
        self.aligned_total = self
            .aligned
            .checked_mul(factor)
            .ok_or_else(|| overflow("aligned_total"))?;
        self.unaligned_total = self
            .unaligned
            .checked_mul(factor)
            .ok_or_else(|| overflow("unaligned_total"))?;
        self.discarded_total = self
            .reads_total
            .checked_sub(self.retained)
            .ok_or_else(|| overflow("discarded_total"))?;
        self.retained_reads = self
            .retained
            .checked_sub(self.singleton_m1)
            .and_then(|v| v.checked_sub(self.singleton_m2))
            .ok_or_else(|| overflow("retained_reads"))?;
        self.percent_aligned = if self.total == 0 {
            0.0
        } else {
            round_2(self.aligned as f64 * 100.0 / self.total as f64)
        };
        Ok(())
    }
}

/// Two-decimal rounding with exact halves going to the even digit.
fn round_2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LengthCategory {
    Mate1,
    Mate2,
    Singleton,
    Collapsed,
    CollapsedTruncated,
    Discarded,
    All,
}

impl LengthCategory {
    pub const ALL: [LengthCategory; 7] = [
        LengthCategory::Mate1,
        LengthCategory::Mate2,
        LengthCategory::Singleton,
        LengthCategory::Collapsed,
        LengthCategory::CollapsedTruncated,
        LengthCategory::Discarded,
        LengthCategory::All,
    ];

    pub fn key(self) -> &'static str {
        match self {
            LengthCategory::Mate1 => "mate1",
            LengthCategory::Mate2 => "mate2",
            LengthCategory::Singleton => "singleton",
            LengthCategory::Collapsed => "collapsed",
            LengthCategory::CollapsedTruncated => "collapsed_truncated",
            LengthCategory::Discarded => "discarded",
            LengthCategory::All => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LengthCategory::Mate1 => "Mate1",
            LengthCategory::Mate2 => "Mate2",
            LengthCategory::Singleton => "Singleton",
            LengthCategory::Collapsed => "Collapsed",
            LengthCategory::CollapsedTruncated => "Collapsed Truncated",
            LengthCategory::Discarded => "Discarded",
            LengthCategory::All => "All",
        }
    }

    /// Column of the length table holding this category; `None` when the
    /// mode has no such reads and the count is always zero.
    pub fn column(self, mode: RunMode) -> Option<usize> {
        use LengthCategory::*;
        use ReadType::*;
        match (self, mode.read_type, mode.collapsed) {
            (Mate1, _, _) => Some(1),
            (Mate2, Paired, _) => Some(2),
            (Singleton, Paired, _) => Some(3),
            (Collapsed, Paired, true) => Some(4),
            (CollapsedTruncated, Paired, true) => Some(5),
            (Discarded, Single, _) => Some(2),
            (Discarded, Paired, false) => Some(4),
            (Discarded, Paired, true) => Some(6),
            (All, Single, _) => Some(3),
            (All, Paired, false) => Some(5),
            (All, Paired, true) => Some(7),
            _ => None,
        }
    }
}

/// Read counts per length for each category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LengthDistribution {
    counts: BTreeMap<LengthCategory, BTreeMap<u64, u64>>,
}

impl LengthDistribution {
    pub fn get(&self, category: LengthCategory) -> Option<&BTreeMap<u64, u64>> {
        self.counts.get(&category)
    }

    pub fn count(&self, category: LengthCategory, length: u64) -> Option<u64> {
        self.counts.get(&category)?.get(&length).copied()
    }

    fn series(&self, category: LengthCategory) -> Vec<(f64, f64)> {
        self.get(category)
            .map(|counts| {
                counts
                    .iter()
                    .map(|(len, count)| (*len as f64, *count as f64))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdapterRemovalSample {
    pub mode: RunMode,
    pub stats: TrimStats,
    pub lengths: LengthDistribution,
}

/// Splits a settings file into its `[...]` blocks.
///
/// The first non-empty line always lands in the `header` block, even when it
/// looks like a section heading.
pub fn split_blocks(text: &str) -> BTreeMap<String, Vec<String>> {
    let mut blocks: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let Some(title) = current.as_ref() else {
            blocks
                .entry(HEADER_BLOCK.to_string())
                .or_default()
                .push(line.to_string());
            current = Some(HEADER_BLOCK.to_string());
            continue;
        };

        if line.starts_with('[') {
            let name = line.trim_matches(|c| c == '[' || c == ']').to_string();
            blocks.insert(name.clone(), Vec::new());
            current = Some(name);
            continue;
        }

        blocks.entry(title.clone()).or_default().push(line.to_string());
    }

    blocks
}

fn trim_value(file: &str, lines: &[String], offset: usize) -> Result<i64> {
    let line = lines.get(offset).ok_or_else(|| {
        QcError::parse(
            file,
            format!("[{}] has no line at offset {}", TRIM_BLOCK, offset),
        )
    })?;
    let value = line.split(": ").nth(1).ok_or_else(|| {
        QcError::parse(
            file,
            format!("[{}] line {} has no value: '{}'", TRIM_BLOCK, offset, line),
        )
    })?;
    value.trim().parse::<i64>().map_err(|e| {
        QcError::parse(
            file,
            format!("[{}] line {} value '{}': {}", TRIM_BLOCK, offset, value, e),
        )
    })
}

fn parse_trim_stats(file: &str, lines: &[String], mode: RunMode) -> Result<TrimStats> {
    let read = |offset| trim_value(file, lines, offset);
    let paired = mode.is_paired();
    let collapsed = paired && mode.collapsed;

    let mut stats = TrimStats {
        total: read(0)?,
        unaligned: read(1)?,
        aligned: read(2)?,
        discarded_m1: read(3)?,
        singleton_m1: read(4)?,
        discarded_m2: if paired { read(5)? } else { 0 },
        singleton_m2: if paired { read(6)? } else { 0 },
        full_length_cp: if collapsed { read(8)? } else { 0 },
        truncated_cp: if collapsed { read(9)? } else { 0 },
        retained: read(mode.retained_offset())?,
        ..Default::default()
    };
    stats.derive(file, mode)?;
    Ok(stats)
}

fn parse_length_distribution(
    file: &str,
    rows: &[String],
    mode: RunMode,
) -> Result<LengthDistribution> {
    let mut dist = LengthDistribution::default();
    for category in LengthCategory::ALL {
        dist.counts.insert(category, BTreeMap::new());
    }

    for (n, row) in rows.iter().enumerate() {
        let values = row
            .split('\t')
            .map(|v| v.trim().parse::<u64>())
            .collect::<std::result::Result<Vec<u64>, _>>()
            .map_err(|e| {
                QcError::parse(file, format!("[{}] row {}: {}", LENGTH_BLOCK, n + 1, e))
            })?;
        let length = values[0];

        for category in LengthCategory::ALL {
            let count = match category.column(mode) {
                Some(col) => *values.get(col).ok_or_else(|| {
                    QcError::parse(
                        file,
                        format!(
                            "[{}] row {} has {} columns, expected at least {}",
                            LENGTH_BLOCK,
                            n + 1,
                            values.len(),
                            col + 1
                        ),
                    )
                })?,
                None => 0,
            };
            dist.counts.entry(category).or_default().insert(length, count);
        }
    }

    Ok(dist)
}

/// Parses one settings file. `file` only labels errors.
pub fn parse_settings(file: &str, text: &str) -> Result<AdapterRemovalSample> {
    let blocks = split_blocks(text);
    let block = |name: &str| {
        blocks
            .get(name)
            .ok_or_else(|| QcError::parse(file, format!("missing [{}] section", name)))
    };

    let length_block = block(LENGTH_BLOCK)?;
    let (header, rows) = length_block
        .split_first()
        .ok_or_else(|| QcError::parse(file, format!("[{}] is empty", LENGTH_BLOCK)))?;
    let mode = RunMode::from_header(header).ok_or_else(|| {
        QcError::parse(
            file,
            format!("[{}] header has too few columns: '{}'", LENGTH_BLOCK, header),
        )
    })?;

    if mode.read_type == ReadType::Single && mode.collapsed {
        return Err(QcError::UnsupportedFormat {
            file: file.to_string(),
            mode: mode.describe().to_string(),
        });
    }

    let stats = parse_trim_stats(file, block(TRIM_BLOCK)?, mode)?;
    let lengths = parse_length_distribution(file, rows, mode)?;

    Ok(AdapterRemovalSample {
        mode,
        stats,
        lengths,
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AdapterRemovalModule;

impl AdapterRemovalModule {
    pub fn new() -> Self {
        Self
    }

    fn stats_table(samples: &BTreeMap<String, AdapterRemovalSample>) -> Result<SampleTable> {
        samples
            .iter()
            .map(|(name, sample)| Ok((name.clone(), Record::from_serializable(&sample.stats)?)))
            .collect()
    }

    fn general_stats(table: &SampleTable) -> GeneralStatsBlock {
        let data = table
            .iter()
            .map(|(name, record)| {
                (
                    name.clone(),
                    record.project(&["percent_aligned", "aligned_total"]),
                )
            })
            .collect();

        GeneralStatsBlock {
            data,
            columns: vec![
                TableColumn::new(
                    "percent_aligned",
                    ColumnHeader::new("% Trimmed", "% trimmed reads")
                        .range(Some(0.0), Some(100.0))
                        .suffix("%")
                        .scale("RdYlGn")
                        .format("{:.1f}%")
                        .shared_key("percent_aligned"),
                ),
                TableColumn::new(
                    "aligned_total",
                    ColumnHeader::new("Total Trimmed", "total trimmed reads")
                        .range(Some(0.0), None)
                        .scale("PuBu")
                        .shared_key("aligned_total"),
                ),
            ],
        }
    }

    fn retained_section(table: &SampleTable) -> Section {
        let categories = vec![
            BarCategory::new("singleton_m1", "singleton mate1"),
            BarCategory::new("singleton_m2", "singleton mate2"),
            BarCategory::new("retained_reads", "retained read pairs"),
            BarCategory::new("full-length_cp", "full-length collapsed pairs"),
            BarCategory::new("truncated_cp", "truncated collapsed pairs"),
            BarCategory::new("discarded_m1", "discarded mate1"),
            BarCategory::new("discarded_m2", "discarded mate2"),
        ];
        let config = PlotConfig {
            id: Some("ar_retained_plot".to_string()),
            title: Some("retained and discarded".to_string()),
            ylab: Some("# Reads".to_string()),
            hide_zero_cats: Some(false),
            cpswitch_counts_label: Some("Number of Reads".to_string()),
            ..Default::default()
        };

        Section::new(
            "Retained and Discarded Paired-End Collapsed",
            "adapter_removal_retained_plot",
            "The proportions of retained and discarded reads.",
            Plot::BarGraph {
                data: table.clone(),
                categories,
                config,
            },
        )
    }

    fn length_section(samples: &BTreeMap<String, AdapterRemovalSample>) -> Section {
        let datasets = LengthCategory::ALL
            .iter()
            .map(|category| {
                let data: LineSeries = samples
                    .iter()
                    .map(|(name, sample)| (name.clone(), sample.lengths.series(*category)))
                    .collect();
                LineDataset {
                    label: category.label().to_string(),
                    ylab: "Count".to_string(),
                    xlab: None,
                    data,
                }
            })
            .collect();
        let config = PlotConfig {
            id: Some("ar_length_count_plot".to_string()),
            title: Some("Length Distribution".to_string()),
            ylab: Some("Counts".to_string()),
            xlab: Some("read length".to_string()),
            x_decimals: Some(false),
            ymin: Some(0.0),
            tt_label: Some("<b>{point.x} bp trimmed</b>: {point.y:.0f}".to_string()),
            ..Default::default()
        };

        Section::new(
            "Length Distribution Paired End Collapsed",
            "ar_length_count",
            "The length distribution of reads after processing adapter alignment.",
            Plot::LineGraph { datasets, config },
        )
    }
}

impl QcModule for AdapterRemovalModule {
    fn info(&self) -> &ModuleInfo {
        &INFO
    }

    fn search_pattern(&self) -> SearchPattern {
        SearchPattern {
            fn_globs: vec!["*.settings".to_string()],
            contents: Some("AdapterRemoval".to_string()),
            num_lines: 0,
        }
    }

    fn build(&self, files: &[LogFile]) -> Result<ModuleReport> {
        let mut samples = BTreeMap::new();

        for file in files {
            match parse_settings(&file.display_path(), &file.contents) {
                Ok(sample) => {
                    tracing::debug!(
                        "{}: {} run, {} reads",
                        file.sample_name,
                        sample.mode.describe(),
                        sample.stats.total
                    );
                    if samples.insert(file.sample_name.clone(), sample).is_some() {
                        tracing::debug!(
                            "Duplicate sample name found in {}! Overwriting: {}",
                            file.display_path(),
                            file.sample_name
                        );
                    }
                }
                Err(QcError::UnsupportedFormat { mode, .. }) => {
                    tracing::warn!(
                        "Case {} is not implemented -> File {} skipped",
                        mode,
                        file.sample_name
                    );
                }
                Err(e) if e.is_skippable() => {
                    tracing::warn!("Skipping {}: {}", file.sample_name, e);
                }
                Err(e) => return Err(e),
            }
        }

        if samples.is_empty() {
            return Err(QcError::NoReportsFound {
                module: INFO.name.to_string(),
            });
        }
        tracing::info!("{}: Found {} reports", INFO.name, samples.len());

        let table = Self::stats_table(&samples)?;
        let mut report = ModuleReport::new(INFO.clone());
        report.general_stats = Some(Self::general_stats(&table));
        report.sections.push(Self::retained_section(&table));
        report.sections.push(Self::length_section(&samples));
        report.data_files.push(DataFile {
            name: DATA_FILE.to_string(),
            data: table,
        });

        Ok(report)
    }
}
