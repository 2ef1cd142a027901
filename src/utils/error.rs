use thiserror::Error;

#[derive(Error, Debug)]
pub enum QcError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse {file}: {message}")]
    ParseError { file: String, message: String },

    #[error("Unsupported run mode in {file}: {mode}")]
    UnsupportedFormat { file: String, mode: String },

    #[error("No {module} reports found")]
    NoReportsFound { module: String },
}

pub type Result<T> = std::result::Result<T, QcError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Parsing,
    Output,
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl QcError {
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        QcError::ParseError {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            QcError::IoError(_) => ErrorCategory::Io,
            QcError::ConfigError { .. }
            | QcError::MissingConfigError { .. }
            | QcError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            QcError::ParseError { .. } | QcError::UnsupportedFormat { .. } => {
                ErrorCategory::Parsing
            }
            QcError::ZipError(_) | QcError::CsvError(_) | QcError::SerializationError(_) => {
                ErrorCategory::Output
            }
            QcError::NoReportsFound { .. } => ErrorCategory::NoData,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Parsing => ErrorSeverity::Low,
            ErrorCategory::NoData => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Output => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// 單個檔案的錯誤只會跳過該樣本，不會中止整個流程
    pub fn is_skippable(&self) -> bool {
        self.category() == ErrorCategory::Parsing
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            QcError::NoReportsFound { .. } => {
                "No supported log files were found in the analysis directories".to_string()
            }
            QcError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value for '{}' is invalid: {}", field, reason)
            }
            QcError::MissingConfigError { field } => {
                format!("Required configuration '{}' is missing", field)
            }
            QcError::IoError(e) => format!("File system error: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the paths exist and are readable/writable",
            ErrorCategory::Configuration => "Review the command line flags and the TOML config file",
            ErrorCategory::Parsing => "Check that the log file was produced by a supported tool version",
            ErrorCategory::Output => "Check free disk space and permissions of the output directory",
            ErrorCategory::NoData => {
                "Point the tool at a directory containing *.settings or pycoQC YAML files"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_are_skippable() {
        let err = QcError::parse("sample.settings", "missing section");
        assert!(err.is_skippable());
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(
            err.to_string(),
            "Failed to parse sample.settings: missing section"
        );
    }

    #[test]
    fn test_no_reports_found_is_not_skippable() {
        let err = QcError::NoReportsFound {
            module: "pycoQC".to_string(),
        };
        assert!(!err.is_skippable());
        assert_eq!(err.category(), ErrorCategory::NoData);
        assert_eq!(err.to_string(), "No pycoQC reports found");
    }
}
