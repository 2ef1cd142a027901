pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::toml_config::{
    CompressionConfig, TomlConfig, DEFAULT_ARCHIVE_NAME, DEFAULT_OUTPUT_PATH,
};
#[cfg(feature = "cli")]
use crate::core::discovery::{DEFAULT_CLEAN_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::SearchPattern;
#[cfg(feature = "cli")]
use crate::modules::MODULE_KEYS;
#[cfg(feature = "cli")]
use crate::report::DataFormat;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "qc-etl")]
#[command(about = "Collects AdapterRemoval and pycoQC logs into QC report data files")]
pub struct CliConfig {
    /// Directories (or files) to search for logs
    pub analysis_dirs: Vec<String>,

    /// Directory the data files are written to [default: ./qc_data]
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// TOML configuration file; flags given here take precedence
    #[arg(short, long)]
    pub config: Option<String>,

    /// Only run these modules (adapter_removal, pycoqc)
    #[arg(short, long = "module", value_delimiter = ',')]
    pub modules: Vec<String>,

    /// Data file formats (tsv, csv, json) [default: tsv]
    #[arg(long = "format", value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Skip files and directories whose name matches these globs
    #[arg(long, value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Also bundle every output into a ZIP archive
    #[arg(long)]
    pub zip: bool,

    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip log files larger than this many bytes
    #[arg(long)]
    pub max_file_size: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    /// Show which files would be parsed without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 命令列參數覆蓋 TOML 設定
    pub fn apply_to(&self, config: &mut TomlConfig) {
        if !self.analysis_dirs.is_empty() {
            config.analysis.paths = self.analysis_dirs.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output.path = Some(output_dir.clone());
        }
        if !self.modules.is_empty() {
            config.analysis.modules = self.modules.clone();
        }
        if !self.formats.is_empty() {
            config.output.formats = self.formats.clone();
        }
        config.analysis.ignore.extend(self.ignore.iter().cloned());
        if self.zip {
            let filename = config
                .output
                .compression
                .as_ref()
                .and_then(|c| c.filename.clone());
            config.output.compression = Some(CompressionConfig {
                enabled: true,
                filename,
            });
        }
        if self.follow_symlinks {
            config.analysis.follow_symlinks = Some(true);
        }
        if let Some(size) = self.max_file_size {
            config.analysis.max_file_size = Some(size);
        }
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn analysis_paths(&self) -> &[String] {
        &self.analysis_dirs
    }

    fn output_path(&self) -> &str {
        self.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn enabled_modules(&self) -> &[String] {
        &self.modules
    }

    fn search_pattern(&self, _module_key: &str) -> Option<SearchPattern> {
        None
    }

    fn ignore_patterns(&self) -> &[String] {
        &self.ignore
    }

    fn clean_extensions(&self) -> Vec<String> {
        DEFAULT_CLEAN_EXTENSIONS.iter().map(|s| s.to_string()).collect()
    }

    fn max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }

    fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    fn output_formats(&self) -> Vec<DataFormat> {
        if self.formats.is_empty() {
            return vec![DataFormat::Tsv];
        }
        self.formats.iter().filter_map(|f| f.parse().ok()).collect()
    }

    fn archive_name(&self) -> Option<&str> {
        self.zip.then_some(DEFAULT_ARCHIVE_NAME)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_paths("analysis_dirs", &self.analysis_dirs)?;
        validation::validate_path("output_dir", self.output_path())?;
        validation::validate_choices("module", &self.modules, &MODULE_KEYS)?;
        validation::validate_choices(
            "format",
            &validation::normalize_choices(&self.formats),
            &DataFormat::ALL,
        )?;
        if let Some(size) = self.max_file_size {
            validation::validate_positive_number("max_file_size", size, 1)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_flags() {
        let cli = CliConfig::parse_from([
            "qc-etl",
            "runs/a",
            "runs/b",
            "-o",
            "out",
            "--module",
            "pycoqc",
            "--format",
            "tsv,json",
            "--zip",
        ]);

        assert_eq!(cli.analysis_paths(), &["runs/a".to_string(), "runs/b".to_string()]);
        assert_eq!(cli.output_path(), "out");
        assert_eq!(cli.enabled_modules(), &["pycoqc".to_string()]);
        assert_eq!(cli.output_formats(), vec![DataFormat::Tsv, DataFormat::Json]);
        assert_eq!(cli.archive_name(), Some(DEFAULT_ARCHIVE_NAME));
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_format_flag_is_case_insensitive() {
        let cli = CliConfig::parse_from(["qc-etl", "runs", "--format", "TSV,Json"]);
        assert!(cli.validate().is_ok());
        assert_eq!(cli.output_formats(), vec![DataFormat::Tsv, DataFormat::Json]);

        let cli = CliConfig::parse_from(["qc-etl", "runs", "--format", "tsv,TSV"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_cli_requires_analysis_dir() {
        let cli = CliConfig::parse_from(["qc-etl"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_apply_overrides_toml() {
        let mut config = TomlConfig::from_toml_str(
            "[analysis]\npaths = [\"from-toml\"]\nignore = [\"work\"]\n[output]\nformats = [\"csv\"]\n",
        )
        .unwrap();
        let cli = CliConfig::parse_from(["qc-etl", "from-cli", "--ignore", "tmp", "--zip"]);

        cli.apply_to(&mut config);

        assert_eq!(config.analysis.paths, vec!["from-cli".to_string()]);
        assert_eq!(config.analysis.ignore, vec!["work".to_string(), "tmp".to_string()]);
        assert_eq!(config.output_formats(), vec![DataFormat::Csv]);
        assert_eq!(config.archive_name(), Some(DEFAULT_ARCHIVE_NAME));
    }
}
