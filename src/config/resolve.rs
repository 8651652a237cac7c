use crate::config::toml_config::LaunchFile;
use crate::domain::model::{LaunchSpec, DEFAULT_MASTER_PORT};
use crate::utils::error::{LaunchError, Result};
use crate::utils::validation::{parse_port, validate_required_field, Validate};

/// Raw launch inputs before defaults and overrides are applied.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    pub arch: Option<String>,
    pub gpus: Option<String>,
    pub extra_args: Vec<String>,
    pub port_flag: Option<u16>,
    /// Value of the `PORT` environment variable, if any.
    pub port_env: Option<String>,
    pub file: Option<LaunchFile>,
}

impl LaunchRequest {
    /// 優先順序: --port > PORT > [training].master_port > 29501
    pub fn resolve_port(&self) -> Result<u16> {
        if let Some(port) = self.port_flag {
            return Ok(port);
        }
        if let Some(raw) = self.port_env.as_deref().filter(|v| !v.is_empty()) {
            return parse_port("PORT", raw);
        }
        Ok(self
            .file
            .as_ref()
            .and_then(LaunchFile::master_port)
            .unwrap_or(DEFAULT_MASTER_PORT))
    }

    pub fn resolve(self) -> Result<LaunchSpec> {
        let arch = validate_required_field("ARCH", &self.arch)?.clone();
        let gpus_raw = validate_required_field("GPUS", &self.gpus)?;
        let gpus: u32 = gpus_raw
            .trim()
            .parse()
            .map_err(|_| LaunchError::InvalidConfigValueError {
                field: "GPUS".to_string(),
                value: gpus_raw.clone(),
                reason: "GPU count must be a positive integer".to_string(),
            })?;
        let master_port = self.resolve_port()?;

        let mut spec = LaunchSpec::new(arch, gpus)
            .with_port(master_port)
            .with_extra_args(self.extra_args);

        if let Some(file) = self.file {
            file.validate()?;
            if let Some(launcher) = file.launcher {
                if let Some(python) = launcher.python {
                    spec.launcher.python = python;
                }
                if let Some(module) = launcher.module {
                    spec.launcher.module = module;
                }
                if let Some(use_env) = launcher.use_env {
                    spec.launcher.use_env = use_env;
                }
                if let Some(entry_point) = launcher.entry_point {
                    spec.launcher.entry_point = entry_point;
                }
                spec.launcher.working_dir = launcher.working_dir;
            }
            if let Some(training) = file.training {
                if let Some(batch_size) = training.batch_size {
                    spec.training.batch_size = batch_size;
                }
                if let Some(epochs) = training.epochs {
                    spec.training.epochs = epochs;
                }
                if let Some(data_path) = training.data_path {
                    spec.training.data_path = data_path;
                }
            }
            if let Some(environment) = file.environment {
                spec.environment = environment;
            }
        }

        spec.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(arch: &str, gpus: &str) -> LaunchRequest {
        LaunchRequest {
            arch: Some(arch.to_string()),
            gpus: Some(gpus.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_port_defaults() {
        assert_eq!(request("vit_b", "4").resolve_port().unwrap(), 29501);
    }

    #[test]
    fn test_empty_port_env_means_unset() {
        let mut req = request("vit_b", "4");
        req.port_env = Some(String::new());
        assert_eq!(req.resolve_port().unwrap(), 29501);
    }

    #[test]
    fn test_port_precedence() {
        let mut req = request("vit_b", "4");
        req.file = Some(LaunchFile::from_toml_str("[training]\nmaster_port = 30000\n").unwrap());
        assert_eq!(req.resolve_port().unwrap(), 30000);

        req.port_env = Some("29600".to_string());
        assert_eq!(req.resolve_port().unwrap(), 29600);

        req.port_flag = Some(29700);
        assert_eq!(req.resolve_port().unwrap(), 29700);
    }

    #[test]
    fn test_bad_port_env_rejected() {
        let mut req = request("vit_b", "4");
        req.port_env = Some("not-a-port".to_string());
        assert!(req.resolve().is_err());
    }

    #[test]
    fn test_missing_arch() {
        let req = LaunchRequest {
            gpus: Some("4".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            req.resolve(),
            Err(LaunchError::MissingConfigError { field }) if field == "ARCH"
        ));
    }

    #[test]
    fn test_non_numeric_gpus() {
        let err = request("vit_b", "four").resolve().unwrap_err();
        assert!(
            matches!(err, LaunchError::InvalidConfigValueError { ref field, ref reason, .. }
                if field == "GPUS" && reason.contains("positive integer"))
        );
    }

    #[test]
    fn test_file_overrides_template() {
        let mut req = request("vit_b", "2");
        req.file = Some(
            LaunchFile::from_toml_str(
                r#"
[launcher]
python = "python3"

[training]
batch_size = 128
data_path = "/data/in1k"

[environment]
NCCL_DEBUG = "INFO"
"#,
            )
            .unwrap(),
        );

        let spec = req.resolve().unwrap();
        assert_eq!(spec.launcher.python, "python3");
        assert_eq!(spec.training.batch_size, 128);
        assert_eq!(spec.training.epochs, 300);
        assert_eq!(spec.training.data_path, "/data/in1k");
        assert_eq!(spec.environment["NCCL_DEBUG"], "INFO");
    }
}
