use crate::utils::error::{QcError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(QcError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(QcError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_paths(field_name: &str, paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        return Err(QcError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    for path in paths {
        validate_path(field_name, path)?;
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(QcError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// Every entry of `values` must be one of `allowed`; duplicates are rejected too.
pub fn validate_choices(field_name: &str, values: &[String], allowed: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed.iter().copied().collect();
    let mut seen = HashSet::new();

    for value in values {
        if !allowed_set.contains(value.as_str()) {
            return Err(QcError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: value.clone(),
                reason: format!("Unsupported value. Valid values: {}", allowed.join(", ")),
            });
        }
        if !seen.insert(value.as_str()) {
            return Err(QcError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: value.clone(),
                reason: "Value listed more than once".to_string(),
            });
        }
    }

    Ok(())
}

/// Lower-cased, trimmed copies of `values`, for case-insensitive choice checks.
pub fn normalize_choices(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.trim().to_ascii_lowercase()).collect()
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(QcError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output_dir", "./qc_data").is_ok());
        assert!(validate_path("output_dir", "").is_err());
        assert!(validate_path("output_dir", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_paths_requires_one_entry() {
        assert!(validate_paths("analysis_dirs", &[]).is_err());
        assert!(validate_paths("analysis_dirs", &[".".to_string()]).is_ok());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("max_file_size", 1024, 1).is_ok());
        assert!(validate_positive_number("max_file_size", 0, 1).is_err());
    }

    #[test]
    fn test_validate_choices() {
        let formats = vec!["tsv".to_string(), "json".to_string()];
        assert!(validate_choices("output.formats", &formats, &["tsv", "csv", "json"]).is_ok());

        let unknown = vec!["xlsx".to_string()];
        assert!(validate_choices("output.formats", &unknown, &["tsv", "csv", "json"]).is_err());

        let mixed_case = vec!["TSV".to_string(), " Json ".to_string()];
        assert!(validate_choices("output.formats", &mixed_case, &["tsv", "csv", "json"]).is_err());
        assert!(validate_choices(
            "output.formats",
            &normalize_choices(&mixed_case),
            &["tsv", "csv", "json"]
        )
        .is_ok());

        let duplicated = vec!["tsv".to_string(), "tsv".to_string()];
        assert!(validate_choices("output.formats", &duplicated, &["tsv"]).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("contents", "AdapterRemoval").is_ok());
        assert!(validate_non_empty_string("contents", "   ").is_err());
    }
}
