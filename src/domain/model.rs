use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_MASTER_PORT: u16 = 29501;
pub const DEFAULT_BATCH_SIZE: u32 = 16;
pub const DEFAULT_EPOCHS: u32 = 300;
pub const DEFAULT_DATA_PATH: &str = "/path/to/imagenet";
pub const DEFAULT_PYTHON: &str = "python";
pub const DEFAULT_LAUNCHER_MODULE: &str = "torch.distributed.launch";
pub const DEFAULT_ENTRY_POINT: &str = "main.py";

/// NCCL 低延遲協定門檻，固定關閉
pub const NCCL_LL_THRESHOLD_VAR: &str = "NCCL_LL_THRESHOLD";
pub const NCCL_LL_THRESHOLD_VALUE: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingSettings {
    pub batch_size: u32,
    pub epochs: u32,
    pub data_path: String,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            epochs: DEFAULT_EPOCHS,
            data_path: DEFAULT_DATA_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LauncherSettings {
    pub python: String,
    pub module: String,
    /// 傳 `--use_env`，讓 rank 以 LOCAL_RANK 環境變數傳給 main.py
    pub use_env: bool,
    pub entry_point: String,
    pub working_dir: Option<PathBuf>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            python: DEFAULT_PYTHON.to_string(),
            module: DEFAULT_LAUNCHER_MODULE.to_string(),
            use_env: true,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            working_dir: None,
        }
    }
}

/// A fully resolved launch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchSpec {
    pub arch: String,
    pub gpus: u32,
    pub master_port: u16,
    /// Forwarded verbatim, in order, after the fixed flags.
    pub extra_args: Vec<String>,
    pub training: TrainingSettings,
    pub launcher: LauncherSettings,
    /// Extra child environment, applied after `NCCL_LL_THRESHOLD`.
    pub environment: BTreeMap<String, String>,
}

impl LaunchSpec {
    pub fn new(arch: impl Into<String>, gpus: u32) -> Self {
        Self {
            arch: arch.into(),
            gpus,
            master_port: DEFAULT_MASTER_PORT,
            extra_args: Vec::new(),
            training: TrainingSettings::default(),
            launcher: LauncherSettings::default(),
            environment: BTreeMap::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.master_port = port;
        self
    }

    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl Validate for LaunchSpec {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("arch", &self.arch)?;
        validate_positive_number("gpus", self.gpus as u64, 1)?;
        validate_range("master_port", self.master_port, 1, u16::MAX)?;
        validate_positive_number("training.batch_size", self.training.batch_size as u64, 1)?;
        validate_positive_number("training.epochs", self.training.epochs as u64, 1)?;
        validate_path("training.data_path", &self.training.data_path)?;
        validate_non_empty_string("launcher.python", &self.launcher.python)?;
        validate_non_empty_string("launcher.module", &self.launcher.module)?;
        validate_path("launcher.entry_point", &self.launcher.entry_point)?;
        for key in self.environment.keys() {
            if key.is_empty() || key.contains('=') || key.contains('\0') {
                return Err(crate::utils::error::LaunchError::InvalidConfigValueError {
                    field: "environment".to_string(),
                    value: key.clone(),
                    reason: "Not a valid environment variable name".to_string(),
                });
            }
        }
        Ok(())
    }
}
