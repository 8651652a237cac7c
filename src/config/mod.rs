pub mod resolve;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
pub mod cli {
    use super::resolve::LaunchRequest;
    use super::toml_config::LaunchFile;
    use crate::utils::error::Result;
    use clap::{Parser, ValueEnum};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
    pub enum LogFormat {
        #[default]
        Compact,
        Json,
    }

    #[derive(Debug, Clone, Parser)]
    #[command(name = "deit-launch")]
    #[command(about = "Launch distributed DeiT training with torch.distributed.launch")]
    pub struct CliConfig {
        /// ARCH GPUS [EXTRA]...: model (--model), GPU count (--nproc_per_node),
        /// then arguments appended verbatim to main.py
        #[arg(
            value_name = "ARCH GPUS [EXTRA]",
            trailing_var_arg = true,
            allow_hyphen_values = true,
            num_args = 2..,
            required_unless_present = "list_models"
        )]
        pub argv: Vec<String>,

        /// Master port (overrides PORT)
        #[arg(long)]
        pub port: Option<u16>,

        /// TOML file with launcher/training/environment overrides
        #[arg(short, long)]
        pub config: Option<PathBuf>,

        /// Print the command without running it
        #[arg(long)]
        pub dry_run: bool,

        /// With --dry-run, print the plan as JSON
        #[arg(long, requires = "dry_run")]
        pub json: bool,

        /// List known architectures and exit
        #[arg(long)]
        pub list_models: bool,

        #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
        pub log_format: LogFormat,

        /// Enable verbose output
        #[arg(short, long)]
        pub verbose: bool,
    }

    impl CliConfig {
        pub fn arch(&self) -> Option<&str> {
            self.argv.first().map(String::as_str)
        }

        pub fn gpus(&self) -> Option<&str> {
            self.argv.get(1).map(String::as_str)
        }

        /// 第三個位置參數起全部原樣轉交 main.py
        pub fn extra(&self) -> &[String] {
            self.argv.get(2..).unwrap_or(&[])
        }

        /// 讀取設定檔與 PORT 環境變數，組成待解析的請求
        pub fn to_request(&self) -> Result<LaunchRequest> {
            let file = match &self.config {
                Some(path) => {
                    tracing::info!("📁 Loading launch config from: {}", path.display());
                    Some(LaunchFile::from_file(path)?)
                }
                None => None,
            };

            Ok(LaunchRequest {
                arch: self.arch().map(str::to_string),
                gpus: self.gpus().map(str::to_string),
                extra_args: self.extra().to_vec(),
                port_flag: self.port,
                port_env: std::env::var("PORT").ok(),
                file,
            })
        }
    }

}
