pub mod adapter_removal;
pub mod pycoqc;

use crate::domain::ports::QcModule;
use crate::utils::error::{QcError, Result};

pub use adapter_removal::AdapterRemovalModule;
pub use pycoqc::PycoqcModule;

/// Keys accepted by `--module` and `modules = [...]`, in run order.
pub const MODULE_KEYS: [&str; 2] = ["adapter_removal", "pycoqc"];

pub fn available_modules() -> Vec<Box<dyn QcModule>> {
    vec![
        Box::new(AdapterRemovalModule::new()),
        Box::new(PycoqcModule::new()),
    ]
}

/// Picks the modules named in `enabled`, keeping run order; an empty list
/// selects everything.
pub fn select_modules(enabled: &[String]) -> Result<Vec<Box<dyn QcModule>>> {
    for key in enabled {
        if !MODULE_KEYS.contains(&key.as_str()) {
            return Err(QcError::InvalidConfigValueError {
                field: "modules".to_string(),
                value: key.clone(),
                reason: format!("Unknown module. Available: {}", MODULE_KEYS.join(", ")),
            });
        }
    }

    Ok(available_modules()
        .into_iter()
        .filter(|m| enabled.is_empty() || enabled.iter().any(|k| k == m.info().key))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_modules() {
        let modules = select_modules(&[]).unwrap();
        let keys: Vec<&str> = modules.iter().map(|m| m.info().key).collect();
        assert_eq!(keys, MODULE_KEYS.to_vec());
    }

    #[test]
    fn test_select_keeps_run_order() {
        let modules = select_modules(&["pycoqc".to_string(), "adapter_removal".to_string()]).unwrap();
        assert_eq!(modules[0].info().key, "adapter_removal");
        assert_eq!(modules[1].info().key, "pycoqc");
    }

    #[test]
    fn test_select_unknown_module() {
        assert!(select_modules(&["fastqc".to_string()]).is_err());
    }
}
