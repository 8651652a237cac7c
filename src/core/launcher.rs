use crate::core::command::LaunchCommand;
use crate::core::registry;
use crate::domain::model::LaunchSpec;
use crate::domain::ports::ProcessRunner;
use crate::utils::error::{LaunchError, Result};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use std::process::ExitStatus;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Dry run: the command that would have been executed.
    Planned(LaunchCommand),
    Completed {
        command: LaunchCommand,
        exit_code: i32,
    },
}

impl LaunchOutcome {
    pub fn command(&self) -> &LaunchCommand {
        match self {
            LaunchOutcome::Planned(command) => command,
            LaunchOutcome::Completed { command, .. } => command,
        }
    }

    /// 乾跑視為成功
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchOutcome::Planned(_) => 0,
            LaunchOutcome::Completed { exit_code, .. } => *exit_code,
        }
    }
}

pub struct Launcher<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> Launcher<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub async fn run(&self, spec: &LaunchSpec, dry_run: bool) -> Result<LaunchOutcome> {
        spec.validate()?;

        match registry::lookup(&spec.arch) {
            Some(info) => tracing::debug!(
                "Architecture {} ({:?}, {}px, patch {}, dim {}, depth {})",
                info.name,
                info.family,
                info.img_size,
                info.patch_size,
                info.embed_dim,
                info.depth
            ),
            None => match registry::suggest(&spec.arch) {
                Some(close) => tracing::warn!(
                    "⚠️ Unknown architecture '{}', did you mean '{}'? Forwarding as-is",
                    spec.arch,
                    close
                ),
                None => tracing::warn!(
                    "⚠️ Architecture '{}' is not in the local catalog, forwarding to timm as-is",
                    spec.arch
                ),
            },
        }

        let command = LaunchCommand::from_spec(spec);
        tracing::info!(
            "🚀 Launching {} on {} GPU(s), master port {}",
            spec.arch,
            spec.gpus,
            spec.master_port
        );
        tracing::info!("🔧 {}", command.render());

        if dry_run {
            tracing::info!("🔍 DRY RUN MODE - training will not be started");
            return Ok(LaunchOutcome::Planned(command));
        }

        let start = Instant::now();
        let exit_code = self.runner.run(&command).await?;
        if exit_code == 0 {
            tracing::info!("✅ Training finished after {:?}", start.elapsed());
        } else {
            tracing::error!(
                "❌ Training exited with code {} after {:?}",
                exit_code,
                start.elapsed()
            );
        }

        Ok(LaunchOutcome::Completed { command, exit_code })
    }
}

/// Spawns the command as a real child process with inherited stdio.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, command: &LaunchCommand) -> Result<i32> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args);
        for (key, value) in command.effective_env() {
            cmd.env(key, value);
        }
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| LaunchError::SpawnError {
            program: command.program.clone(),
            source,
        })?;
        tracing::debug!("Spawned {} (pid {:?})", command.program, child.id());

        // 中斷訊號同樣送達子程序群組，這裡只等待它結束
        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_err() {
                        break child.wait().await?;
                    }
                    tracing::warn!("🛑 Interrupt received, waiting for training processes to exit");
                }
            }
        };

        Ok(exit_code_of(status))
    }
}

/// Child exit code; on Unix a signal death maps to `128 + signal`.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
