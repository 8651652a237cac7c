use crate::domain::model::{LaunchSpec, NCCL_LL_THRESHOLD_VALUE, NCCL_LL_THRESHOLD_VAR};
use serde::Serialize;
use std::path::PathBuf;

/// Program, argv and child environment for one training launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Ordered; later entries win when the same key appears twice.
    pub env: Vec<(String, String)>,
    pub working_dir: Option<PathBuf>,
}

impl LaunchCommand {
    /// Build the `torch.distributed.launch` invocation for `spec`.
    ///
    /// Layout: `<python> -m <module> --nproc_per_node=N --master_port=P [--use_env]
    /// <entry_point> --model ARCH --batch-size B --epochs E --data-path PATH <extra...>`
    pub fn from_spec(spec: &LaunchSpec) -> Self {
        let mut args = vec![
            "-m".to_string(),
            spec.launcher.module.clone(),
            format!("--nproc_per_node={}", spec.gpus),
            format!("--master_port={}", spec.master_port),
        ];
        if spec.launcher.use_env {
            args.push("--use_env".to_string());
        }
        args.push(spec.launcher.entry_point.clone());
        args.extend([
            "--model".to_string(),
            spec.arch.clone(),
            "--batch-size".to_string(),
            spec.training.batch_size.to_string(),
            "--epochs".to_string(),
            spec.training.epochs.to_string(),
            "--data-path".to_string(),
            spec.training.data_path.clone(),
        ]);
        args.extend(spec.extra_args.iter().cloned());

        let mut env = vec![(
            NCCL_LL_THRESHOLD_VAR.to_string(),
            NCCL_LL_THRESHOLD_VALUE.to_string(),
        )];
        env.extend(
            spec.environment
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        Self {
            program: spec.launcher.python.clone(),
            args,
            env,
            working_dir: spec.launcher.working_dir.clone(),
        }
    }

    /// The child environment after later entries override earlier ones.
    pub fn effective_env(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = Vec::with_capacity(self.env.len());
        for (key, value) in &self.env {
            match out.iter_mut().find(|(k, _)| *k == key.as_str()) {
                Some(slot) => slot.1 = value.as_str(),
                None => out.push((key.as_str(), value.as_str())),
            }
        }
        out
    }

    /// One shell-pasteable line: `KEY=VALUE ... program args...`.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = self
            .effective_env()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, shell_quote(v)))
            .collect();
        parts.push(shell_quote(&self.program));
        parts.extend(self.args.iter().map(|a| shell_quote(a)));
        parts.join(" ")
    }
}

fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
