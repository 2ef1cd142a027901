use crate::core::discovery::FileSearcher;
use crate::core::{ConfigProvider, LogFile, Pipeline, QcModule, Storage, TransformResult};
use crate::domain::model::SourceFile;
use crate::modules::select_modules;
use crate::report::writer::{bundle_zip, render_sources, render_table};
use crate::report::{GeneralStats, ModuleReport};
use crate::utils::error::{QcError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub const MANIFEST_FILE: &str = "qc_report.json";
pub const GENERAL_STATS_FILE: &str = "multiqc_general_stats";
pub const SOURCES_FILE: &str = "multiqc_sources.txt";

#[derive(Serialize)]
struct ReportManifest<'a> {
    generated_at: DateTime<Utc>,
    version: &'static str,
    analysis_paths: &'a [String],
    modules: &'a [ModuleReport],
    general_stats: &'a GeneralStats,
}

pub struct QcPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    modules: Vec<Box<dyn QcModule>>,
}

impl<S: Storage, C: ConfigProvider> QcPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let modules = select_modules(config.enabled_modules())?;
        Ok(Self {
            storage,
            config,
            modules,
        })
    }

    fn searcher(&self) -> Result<FileSearcher> {
        let patterns = self
            .modules
            .iter()
            .map(|m| {
                let key = m.info().key;
                let pattern = self
                    .config
                    .search_pattern(key)
                    .unwrap_or_else(|| m.search_pattern());
                (key.to_string(), pattern)
            })
            .collect();

        FileSearcher::new(
            patterns,
            self.config.ignore_patterns(),
            self.config.clean_extensions(),
            self.config.max_file_size(),
            self.config.follow_symlinks(),
        )
    }

    fn sources_for(report: &ModuleReport, files: &[LogFile]) -> Vec<SourceFile> {
        let Some(data_file) = report.data_files.first() else {
            return Vec::new();
        };
        // with duplicate sample names the last file wins, matching the module
        let mut latest: HashMap<&str, &LogFile> = HashMap::new();
        for file in files {
            if data_file.data.contains_key(&file.sample_name) {
                latest.insert(file.sample_name.as_str(), file);
            }
        }
        let mut sources: Vec<SourceFile> = latest
            .into_iter()
            .map(|(sample, file)| SourceFile {
                module: report.info.name.to_string(),
                sample_name: sample.to_string(),
                path: file.display_path(),
            })
            .collect();
        sources.sort_by(|a, b| a.sample_name.cmp(&b.sample_name));
        sources
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for QcPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<LogFile>> {
        let searcher = self.searcher()?;
        let paths = self.config.analysis_paths().to_vec();
        tracing::debug!("Searching {:?}", paths);

        tokio::task::spawn_blocking(move || searcher.search(&paths))
            .await
            .map_err(|e| QcError::IoError(std::io::Error::other(e)))?
    }

    async fn transform(&self, files: Vec<LogFile>) -> Result<TransformResult> {
        let mut by_module: HashMap<String, Vec<LogFile>> = HashMap::new();
        for file in files {
            by_module.entry(file.module.clone()).or_default().push(file);
        }

        let mut reports = Vec::new();
        let mut general_stats = GeneralStats::new();
        let mut sources = Vec::new();

        for module in &self.modules {
            let info = module.info();
            let module_files = by_module.remove(info.key).unwrap_or_default();
            if module_files.is_empty() {
                tracing::debug!("{}: no matching log files", info.name);
                continue;
            }

            match module.build(&module_files) {
                Ok(report) => {
                    if let Some(block) = &report.general_stats {
                        general_stats.add_block(&report.info, block);
                    }
                    sources.extend(Self::sources_for(&report, &module_files));
                    reports.push(report);
                }
                Err(QcError::NoReportsFound { .. }) => {
                    tracing::debug!(
                        "{}: Could not find any reports in {:?}",
                        info.name,
                        self.config.analysis_paths()
                    );
                }
                Err(e) => return Err(e),
            }
        }

        if reports.is_empty() {
            return Err(QcError::NoReportsFound {
                module: "supported".to_string(),
            });
        }

        Ok(TransformResult {
            reports,
            general_stats,
            sources,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let formats = self.config.output_formats();
        let mut outputs: Vec<(String, Vec<u8>)> = Vec::new();

        for report in &result.reports {
            for data_file in &report.data_files {
                for format in &formats {
                    outputs.push((
                        format!("{}.{}", data_file.name, format.extension()),
                        render_table(&data_file.data, *format)?,
                    ));
                }
            }
        }

        if !result.general_stats.is_empty() {
            for format in &formats {
                outputs.push((
                    format!("{}.{}", GENERAL_STATS_FILE, format.extension()),
                    render_table(&result.general_stats.data, *format)?,
                ));
            }
        }

        outputs.push((SOURCES_FILE.to_string(), render_sources(&result.sources)?));

        let manifest = ReportManifest {
            generated_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
            analysis_paths: self.config.analysis_paths(),
            modules: &result.reports,
            general_stats: &result.general_stats,
        };
        outputs.push((
            MANIFEST_FILE.to_string(),
            serde_json::to_vec_pretty(&manifest)?,
        ));

        tracing::debug!("Writing {} files", outputs.len());
        for (name, data) in &outputs {
            self.storage.write_file(name, data).await?;
        }

        let output_path = match self.config.archive_name() {
            Some(archive) => {
                let zip_data = bundle_zip(&outputs)?;
                tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
                self.storage.write_file(archive, &zip_data).await?;
                format!("{}/{}", self.config.output_path(), archive)
            }
            None => self.config.output_path().to_string(),
        };

        Ok(output_path)
    }
}
