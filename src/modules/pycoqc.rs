//! pycoQC YAML summaries.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::domain::model::{LogFile, ModuleInfo, Record, SampleTable, SearchPattern};
use crate::domain::ports::QcModule;
use crate::report::{
    BarCategory, ColumnHeader, DataFile, GeneralStatsBlock, LineDataset, LineSeries,
    ModuleReport, Plot, PlotConfig, Section, TableColumn,
};
use crate::utils::error::{QcError, Result};

pub const DATA_FILE: &str = "multiqc_pycoqc";

/// Index of the median in a 0..=100 percentile list.
const MEDIAN: usize = 50;

static INFO: ModuleInfo = ModuleInfo {
    key: "pycoqc",
    name: "pycoQC",
    anchor: "pycoqc",
    href: "https://a-slide.github.io/pycoQC/",
    info: "computes metrics and generates interactive QC plots for Oxford Nanopore technologies sequencing data",
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PycoqcSummary {
    #[serde(rename = "All Reads")]
    pub all_reads: ReadGroup,
    #[serde(rename = "Pass Reads")]
    pub pass_reads: ReadGroup,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReadGroup {
    pub basecall: Basecall,
    pub run: RunInfo,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Basecall {
    pub reads_number: i64,
    pub bases_number: i64,
    #[serde(rename = "N50")]
    pub n50: serde_json::Number,
    pub len_percentiles: Vec<serde_json::Number>,
    pub qual_score_percentiles: Vec<serde_json::Number>,
    pub len_hist: Histogram,
    pub qual_score_hist: Histogram,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunInfo {
    pub run_duration: f64,
    pub active_channels: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Histogram {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Histogram {
    /// Pairs up `x` and `y`; extra values on the longer side are dropped.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }
}

impl Basecall {
    fn median(
        file: &str,
        group: &str,
        name: &str,
        values: &[serde_json::Number],
    ) -> Result<serde_json::Number> {
        values.get(MEDIAN).cloned().ok_or_else(|| {
            QcError::parse(
                file,
                format!(
                    "{}.basecall.{} has {} entries, need at least {}",
                    group,
                    name,
                    values.len(),
                    MEDIAN + 1
                ),
            )
        })
    }
}

/// Parses a pycoQC YAML document. `file` only labels errors.
pub fn parse_summary(file: &str, text: &str) -> Result<PycoqcSummary> {
    let summary: PycoqcSummary =
        serde_yaml::from_str(text).map_err(|e| QcError::parse(file, e.to_string()))?;

    for (group, reads) in [("All Reads", &summary.all_reads), ("Pass Reads", &summary.pass_reads)] {
        Basecall::median(file, group, "len_percentiles", &reads.basecall.len_percentiles)?;
        Basecall::median(
            file,
            group,
            "qual_score_percentiles",
            &reads.basecall.qual_score_percentiles,
        )?;
    }

    Ok(summary)
}

/// Flat per-sample projection of a summary.
#[derive(Debug, Clone, PartialEq)]
pub struct PycoqcSample {
    pub table: Record,
    pub reads: Record,
    pub bases: Record,
    pub length_all: Vec<(f64, f64)>,
    pub length_pass: Vec<(f64, f64)>,
    pub quality_all: Vec<(f64, f64)>,
    pub quality_pass: Vec<(f64, f64)>,
}

impl PycoqcSample {
    pub fn from_summary(file: &str, summary: &PycoqcSummary) -> Result<Self> {
        let all = &summary.all_reads;
        let pass = &summary.pass_reads;

        let mut table = Record::new();
        table.insert(
            "all_median_read_length",
            Basecall::median(file, "All Reads", "len_percentiles", &all.basecall.len_percentiles)?,
        );
        table.insert(
            "all_median_phred_score",
            Basecall::median(
                file,
                "All Reads",
                "qual_score_percentiles",
                &all.basecall.qual_score_percentiles,
            )?,
        );
        table.insert("all_n50", all.basecall.n50.clone());
        table.insert("all_run_duration", all.run.run_duration);
        table.insert("all_channels", all.run.active_channels);
        table.insert("all_reads", all.basecall.reads_number);
        table.insert("all_bases", all.basecall.bases_number);
        table.insert(
            "passed_median_read_length",
            Basecall::median(file, "Pass Reads", "len_percentiles", &pass.basecall.len_percentiles)?,
        );
        table.insert(
            "passed_median_phred_score",
            Basecall::median(
                file,
                "Pass Reads",
                "qual_score_percentiles",
                &pass.basecall.qual_score_percentiles,
            )?,
        );
        table.insert("passed_n50", pass.basecall.n50.clone());
        table.insert("passed_channels", pass.run.active_channels);
        table.insert("passed_reads", pass.basecall.reads_number);
        table.insert("passed_bases", pass.basecall.bases_number);

        let mut reads = Record::new();
        reads.insert("passed_reads", pass.basecall.reads_number);
        reads.insert(
            "non_passed_reads",
            all.basecall.reads_number.saturating_sub(pass.basecall.reads_number),
        );

        let mut bases = Record::new();
        bases.insert("passed_bases", pass.basecall.bases_number);
        bases.insert(
            "non_passed_bases",
            all.basecall.bases_number.saturating_sub(pass.basecall.bases_number),
        );

        Ok(Self {
            table,
            reads,
            bases,
            length_all: all.basecall.len_hist.points(),
            length_pass: pass.basecall.len_hist.points(),
            quality_all: all.basecall.qual_score_hist.points(),
            quality_pass: pass.basecall.qual_score_hist.points(),
        })
    }
}

fn general_stats_columns() -> Vec<TableColumn> {
    let column = |key: &str, title: &str, description: &str, scale: &str, shared: &str| {
        TableColumn::new(
            key,
            ColumnHeader::new(title, description)
                .scale(scale)
                .shared_key(shared),
        )
    };
    vec![
        column(
            "all_median_read_length",
            "Median Read Length (All)",
            "Median Read Length all",
            "BuPu",
            "median_read_len",
        ),
        column(
            "passed_median_read_length",
            "Median Read Length (Pass)",
            "Median Read Length pass",
            "BuPu",
            "median_read_len",
        ),
        column(
            "all_reads",
            "Number of Reads (All)",
            "Number of Reads all",
            "BuGn",
            "long_read_count",
        ),
        column(
            "passed_reads",
            "Number of Reads (Pass)",
            "Number of Reads pass",
            "BuGn",
            "long_read_count",
        ),
        column(
            "all_bases",
            "Number of Bases (All)",
            "Number of Bases all",
            "OrRd",
            "bases_count",
        ),
        column(
            "passed_bases",
            "Number of Bases (Pass)",
            "Number of Bases pass",
            "OrRd",
            "bases_count",
        ),
    ]
}

fn stats_table_columns() -> Vec<TableColumn> {
    let column = |key: &str, title: &str, description: &str, scale: &str, shared: &str| {
        TableColumn::new(
            key,
            ColumnHeader::new(title, description)
                .namespace(INFO.name)
                .scale(scale)
                .shared_key(shared),
        )
    };
    vec![
        column("all_n50", "N50 (All)", "N50", "Greys", "n50"),
        column("passed_n50", "N50 (Pass)", "N50", "Greys", "n50"),
        column(
            "all_median_phred_score",
            "Median PHRED score (All)",
            "Median PHRED score",
            "BuGn",
            "phred",
        ),
        column(
            "passed_median_phred_score",
            "Median PHRED score (Pass)",
            "Median PHRED score",
            "BuGn",
            "phred",
        ),
        column(
            "all_channels",
            "Active Channels (All)",
            "Number of active channels",
            "PuBuGn",
            "channels",
        ),
        column(
            "passed_channels",
            "Active Channels (Pass)",
            "Number of active channels",
            "PuBuGn",
            "channels",
        ),
    ]
}

fn line_section(
    name: &str,
    anchor: &str,
    xlab: &str,
    all: LineSeries,
    pass: LineSeries,
) -> Section {
    let dataset = |label: &str, data: LineSeries| LineDataset {
        label: label.to_string(),
        ylab: "Read Density".to_string(),
        xlab: Some(xlab.to_string()),
        data,
    };
    Section::new(
        name,
        anchor,
        name,
        Plot::LineGraph {
            datasets: vec![dataset("All", all), dataset("Pass", pass)],
            config: PlotConfig::default(),
        },
    )
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PycoqcModule;

impl PycoqcModule {
    pub fn new() -> Self {
        Self
    }
}

impl QcModule for PycoqcModule {
    fn info(&self) -> &ModuleInfo {
        &INFO
    }

    fn search_pattern(&self) -> SearchPattern {
        SearchPattern {
            fn_globs: vec!["*.yaml".to_string(), "*.yml".to_string()],
            contents: Some("Pass Reads:".to_string()),
            num_lines: 0,
        }
    }

    fn build(&self, files: &[LogFile]) -> Result<ModuleReport> {
        let mut samples: BTreeMap<String, PycoqcSample> = BTreeMap::new();

        for file in files {
            let path = file.display_path();
            let parsed = parse_summary(&path, &file.contents)
                .and_then(|summary| PycoqcSample::from_summary(&path, &summary));
            match parsed {
                Ok(sample) => {
                    if samples.contains_key(&file.sample_name) {
                        tracing::debug!(
                            "Duplicate sample name found in {}! Overwriting: {}",
                            file.file_name,
                            file.sample_name
                        );
                    }
                    samples.insert(file.sample_name.clone(), sample);
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

        let table: SampleTable = samples
            .iter()
            .map(|(name, s)| (name.clone(), s.table.clone()))
            .collect();
        let reads: SampleTable = samples
            .iter()
            .map(|(name, s)| (name.clone(), s.reads.clone()))
            .collect();
        let bases: SampleTable = samples
            .iter()
            .map(|(name, s)| (name.clone(), s.bases.clone()))
            .collect();
        let series = |pick: fn(&PycoqcSample) -> &Vec<(f64, f64)>| -> LineSeries {
            samples
                .iter()
                .map(|(name, s)| (name.clone(), pick(s).clone()))
                .collect()
        };

        let mut report = ModuleReport::new(INFO.clone());
        report.general_stats = Some(GeneralStatsBlock {
            data: table.clone(),
            columns: general_stats_columns(),
        });

        report.sections.push(Section::new(
            "pycoQC Statistics table",
            "pycoqc_stats",
            "Statistics from pycoQC",
            Plot::Table {
                data: table.clone(),
                columns: stats_table_columns(),
            },
        ));
        report.sections.push(Section::new(
            "Run Duration",
            "pycoqc_run_duration",
            "Run Duration",
            Plot::Table {
                data: table.clone(),
                columns: vec![TableColumn::new(
                    "all_run_duration",
                    ColumnHeader::new("Run duration", "Run duration")
                        .namespace(INFO.name)
                        .scale("PuBuGn"),
                )],
            },
        ));
        report.sections.push(Section::new(
            "pycoQC Reads",
            "pycoqc_reads",
            "Reads",
            Plot::BarGraph {
                data: reads,
                categories: vec![
                    BarCategory::new("passed_reads", "passed_reads"),
                    BarCategory::new("non_passed_reads", "non_passed_reads"),
                ],
                config: PlotConfig::default(),
            },
        ));
        report.sections.push(Section::new(
            "pycoQC Bases",
            "pycoqc_bases",
            "Bases",
            Plot::BarGraph {
                data: bases,
                categories: vec![
                    BarCategory::new("passed_bases", "passed_bases"),
                    BarCategory::new("non_passed_bases", "non_passed_bases"),
                ],
                config: PlotConfig::default(),
            },
        ));
        report.sections.push(line_section(
            "pycoQC read length distribution",
            "pycoqc_read_len",
            "Basecalled Length",
            series(|s| &s.length_all),
            series(|s| &s.length_pass),
        ));
        report.sections.push(line_section(
            "pycoQC PHRED quality score distribution",
            "pycoqc_read_qual",
            "Read Quality Score",
            series(|s| &s.quality_all),
            series(|s| &s.quality_pass),
        ));
        report.data_files.push(DataFile {
            name: DATA_FILE.to_string(),
            data: table,
        });

        Ok(report)
    }
}
