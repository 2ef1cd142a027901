use crate::core::discovery::{DEFAULT_CLEAN_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};
use crate::core::ConfigProvider;
use crate::domain::model::SearchPattern;
use crate::modules::MODULE_KEYS;
use crate::report::DataFormat;
use crate::utils::error::{QcError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_OUTPUT_PATH: &str = "./qc_data";
pub const DEFAULT_ARCHIVE_NAME: &str = "qc_data.zip";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub search_patterns: Option<HashMap<String, SearchPattern>>,
    pub sample_names: Option<SampleNameConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
    pub follow_symlinks: Option<bool>,
    pub max_file_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleNameConfig {
    /// Replaces the built-in list when set.
    pub clean_extensions: Option<Vec<String>>,
    /// Appended to whichever list is in effect.
    pub extra_clean_extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    #[serde(default)]
    pub formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(QcError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| QcError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| QcError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_paths("analysis.paths", &self.analysis.paths)?;
        validation::validate_path("output.path", self.output_path())?;
        validation::validate_choices("analysis.modules", &self.analysis.modules, &MODULE_KEYS)?;
        validation::validate_choices(
            "output.formats",
            &validation::normalize_choices(&self.output.formats),
            &DataFormat::ALL,
        )?;

        if let Some(size) = self.analysis.max_file_size {
            validation::validate_positive_number("analysis.max_file_size", size, 1)?;
        }

        if let Some(patterns) = &self.search_patterns {
            for (module, pattern) in patterns {
                if !MODULE_KEYS.contains(&module.as_str()) {
                    return Err(QcError::InvalidConfigValueError {
                        field: "search_patterns".to_string(),
                        value: module.clone(),
                        reason: format!("Unknown module. Available: {}", MODULE_KEYS.join(", ")),
                    });
                }
                if let Some(contents) = &pattern.contents {
                    validation::validate_non_empty_string(
                        &format!("search_patterns.{}.contents", module),
                        contents,
                    )?;
                }
            }
        }

        if let Some(name) = self.archive_name() {
            validation::validate_non_empty_string("output.compression.filename", name)?;
        }

        Ok(())
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn analysis_paths(&self) -> &[String] {
        &self.analysis.paths
    }

    fn output_path(&self) -> &str {
        self.output.path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn enabled_modules(&self) -> &[String] {
        &self.analysis.modules
    }

    fn search_pattern(&self, module_key: &str) -> Option<SearchPattern> {
        self.search_patterns.as_ref()?.get(module_key).cloned()
    }

    fn ignore_patterns(&self) -> &[String] {
        &self.analysis.ignore
    }

    fn clean_extensions(&self) -> Vec<String> {
        let names = self.sample_names.as_ref();
        let mut extensions = names
            .and_then(|n| n.clean_extensions.clone())
            .unwrap_or_else(|| DEFAULT_CLEAN_EXTENSIONS.iter().map(|s| s.to_string()).collect());
        if let Some(extra) = names.and_then(|n| n.extra_clean_extensions.as_ref()) {
            extensions.extend(extra.iter().cloned());
        }
        extensions
    }

    fn max_file_size(&self) -> u64 {
        self.analysis.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }

    fn follow_symlinks(&self) -> bool {
        self.analysis.follow_symlinks.unwrap_or(false)
    }

    fn output_formats(&self) -> Vec<DataFormat> {
        if self.output.formats.is_empty() {
            return vec![DataFormat::Tsv];
        }
        self.output
            .formats
            .iter()
            .filter_map(|f| f.parse().ok())
            .collect()
    }

    fn archive_name(&self) -> Option<&str> {
        let compression = self.output.compression.as_ref()?;
        if !compression.enabled {
            return None;
        }
        Some(compression.filename.as_deref().unwrap_or(DEFAULT_ARCHIVE_NAME))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
