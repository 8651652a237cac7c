pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::resolve::LaunchRequest;
pub use config::toml_config::LaunchFile;
pub use core::command::LaunchCommand;
pub use core::launcher::{LaunchOutcome, Launcher, SystemRunner};
pub use domain::model::LaunchSpec;
pub use domain::ports::ProcessRunner;
pub use utils::error::{LaunchError, Result};
