use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Config file parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Missing required value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to start '{program}': {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Process,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LaunchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LaunchError::MissingConfigError { .. }
            | LaunchError::InvalidConfigValueError { .. }
            | LaunchError::TomlError(_) => ErrorCategory::Configuration,
            LaunchError::SpawnError { .. } => ErrorCategory::Process,
            LaunchError::IoError(_) | LaunchError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Process => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 退出碼: 設定錯誤 2，其餘 1
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 2,
            ErrorCategory::Process | ErrorCategory::System => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LaunchError::MissingConfigError { field } => {
                format!("Missing required argument: {}", field)
            }
            LaunchError::InvalidConfigValueError { field, value, reason } => {
                format!("Invalid {} '{}': {}", field, value, reason)
            }
            LaunchError::TomlError(e) => format!("Could not parse launch config: {}", e.message()),
            LaunchError::SpawnError { program, .. } => {
                format!("Could not start the training launcher '{}'", program)
            }
            LaunchError::IoError(e) => format!("File system error: {}", e),
            LaunchError::SerializationError(e) => format!("Could not render launch plan: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LaunchError::MissingConfigError { .. } => {
                "Usage: deit-launch <ARCH> <GPUS> [EXTRA_ARGS]... (see --help)"
            }
            LaunchError::InvalidConfigValueError { .. } => {
                "Check the command-line arguments, the PORT variable and the launch config file"
            }
            LaunchError::TomlError(_) => "Make sure the config file is valid TOML",
            LaunchError::SpawnError { .. } => {
                "Make sure the Python interpreter is on PATH or set [launcher].python in the config file"
            }
            LaunchError::IoError(_) => "Check that the file exists and is readable",
            LaunchError::SerializationError(_) => "Retry without --json",
        }
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;
