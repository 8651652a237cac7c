use crate::core::command::LaunchCommand;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Runs a built command to completion and reports the child's exit code.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: &LaunchCommand) -> Result<i32>;
}
