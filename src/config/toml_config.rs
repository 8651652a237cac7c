use crate::utils::error::{LaunchError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_positive_number, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Optional launch overrides read from a TOML file.
///
/// ```toml
/// [launcher]
/// python = "/opt/conda/bin/python"
/// entry_point = "main.py"
///
/// [training]
/// data_path = "${IMAGENET_DIR}"
///
/// [environment]
/// OMP_NUM_THREADS = "4"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchFile {
    pub launcher: Option<LauncherSection>,
    pub training: Option<TrainingSection>,
    pub environment: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherSection {
    pub python: Option<String>,
    pub module: Option<String>,
    pub use_env: Option<bool>,
    pub entry_point: Option<String>,
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingSection {
    pub batch_size: Option<u32>,
    pub epochs: Option<u32>,
    pub data_path: Option<String>,
    pub master_port: Option<u16>,
}

impl LaunchFile {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LaunchError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${IMAGENET_DIR})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
            LaunchError::InvalidConfigValueError {
                field: "env_substitution".to_string(),
                value: String::new(),
                reason: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn master_port(&self) -> Option<u16> {
        self.training.as_ref().and_then(|t| t.master_port)
    }
}

impl Validate for LaunchFile {
    fn validate(&self) -> Result<()> {
        if let Some(launcher) = &self.launcher {
            if let Some(python) = &launcher.python {
                validate_non_empty_string("launcher.python", python)?;
            }
            if let Some(module) = &launcher.module {
                validate_non_empty_string("launcher.module", module)?;
            }
            if let Some(entry_point) = &launcher.entry_point {
                validate_path("launcher.entry_point", entry_point)?;
            }
        }
        if let Some(training) = &self.training {
            if let Some(batch_size) = training.batch_size {
                validate_positive_number("training.batch_size", batch_size as u64, 1)?;
            }
            if let Some(epochs) = training.epochs {
                validate_positive_number("training.epochs", epochs as u64, 1)?;
            }
            if let Some(data_path) = &training.data_path {
                validate_path("training.data_path", data_path)?;
            }
            if let Some(port) = training.master_port {
                validate_positive_number("training.master_port", port as u64, 1)?;
            }
        }
        Ok(())
    }
}
