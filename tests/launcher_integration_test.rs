#![cfg(unix)]

use deit_launch::{LaunchCommand, LaunchError, LaunchSpec, Launcher, ProcessRunner, SystemRunner};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::sync::{Mutex, MutexGuard};

// 寫入腳本後立即執行時，並行 fork 可能造成 ETXTBSY，這裡讓測試依序執行
static SPAWN_LOCK: Mutex<()> = Mutex::const_new(());

async fn serial() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().await
}

fn shell(script: &str) -> LaunchCommand {
    LaunchCommand {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        env: vec![("NCCL_LL_THRESHOLD".to_string(), "0".to_string())],
        working_dir: None,
    }
}

/// Stand-in interpreter that records its argv and environment.
fn fake_python(dir: &Path, exit_code: i32) -> PathBuf {
    let path = dir.join("fake-python");
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"$RECORD_DIR/argv\"\n\
         printf '%s\\n' \"$NCCL_LL_THRESHOLD\" > \"$RECORD_DIR/nccl\"\n\
         pwd > \"$RECORD_DIR/cwd\"\nexit {}\n",
        exit_code
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn test_system_runner_propagates_exit_code() {
    let _guard = serial().await;
    assert_eq!(SystemRunner.run(&shell("exit 0")).await.unwrap(), 0);
    assert_eq!(SystemRunner.run(&shell("exit 3")).await.unwrap(), 3);
}

#[tokio::test]
async fn test_system_runner_signal_exit() {
    let _guard = serial().await;
    let code = SystemRunner.run(&shell("kill -TERM $$")).await.unwrap();
    assert_eq!(code, 128 + 15);
}

#[tokio::test]
async fn test_interrupt_waits_for_child() {
    let _guard = serial().await;
    // 子程序對啟動器送出 SIGINT，啟動器應繼續等待並沿用子程序退出碼
    let code = SystemRunner
        .run(&shell("sleep 0.3; kill -INT $PPID; sleep 0.3; exit 5"))
        .await
        .unwrap();
    assert_eq!(code, 5);
}

#[tokio::test]
async fn test_system_runner_sets_child_env() {
    let _guard = serial().await;
    let code = SystemRunner
        .run(&shell("test \"$NCCL_LL_THRESHOLD\" = 0"))
        .await
        .unwrap();
    assert_eq!(code, 0);
}

#[tokio::test]
async fn test_missing_interpreter_is_spawn_error() {
    let _guard = serial().await;
    let mut cmd = shell("exit 0");
    cmd.program = "/nonexistent/deit-launch-python".to_string();

    let err = SystemRunner.run(&cmd).await.unwrap_err();
    assert!(matches!(err, LaunchError::SpawnError { ref program, .. } if program == &cmd.program));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_end_to_end_with_fake_interpreter() {
    let _guard = serial().await;
    let temp_dir = TempDir::new().unwrap();
    let work_dir = TempDir::new().unwrap();
    let python = fake_python(temp_dir.path(), 4);

    let mut spec = LaunchSpec::new("vit_b", 4)
        .with_port(29650)
        .with_extra_args(["--lr", "5e-4", "--output_dir", "out dir"]);
    spec.launcher.python = python.to_string_lossy().into_owned();
    spec.launcher.working_dir = Some(work_dir.path().to_path_buf());
    spec.environment.insert(
        "RECORD_DIR".to_string(),
        temp_dir.path().to_string_lossy().into_owned(),
    );

    let outcome = Launcher::new(SystemRunner).run(&spec, false).await.unwrap();
    assert_eq!(outcome.exit_code(), 4);

    let argv = std::fs::read_to_string(temp_dir.path().join("argv")).unwrap();
    let argv: Vec<&str> = argv.lines().collect();
    assert_eq!(
        argv,
        vec![
            "-m",
            "torch.distributed.launch",
            "--nproc_per_node=4",
            "--master_port=29650",
            "--use_env",
            "main.py",
            "--model",
            "vit_b",
            "--batch-size",
            "16",
            "--epochs",
            "300",
            "--data-path",
            "/path/to/imagenet",
            "--lr",
            "5e-4",
            "--output_dir",
            "out dir",
        ]
    );

    let nccl = std::fs::read_to_string(temp_dir.path().join("nccl")).unwrap();
    assert_eq!(nccl.trim(), "0");

    let cwd = std::fs::read_to_string(temp_dir.path().join("cwd")).unwrap();
    let expected = work_dir.path().canonicalize().unwrap();
    assert_eq!(Path::new(cwd.trim()).canonicalize().unwrap(), expected);
}

#[tokio::test]
async fn test_dry_run_leaves_no_trace() {
    let _guard = serial().await;
    let temp_dir = TempDir::new().unwrap();
    let python = fake_python(temp_dir.path(), 0);

    let mut spec = LaunchSpec::new("deit_tiny_patch16_224", 1);
    spec.launcher.python = python.to_string_lossy().into_owned();
    spec.environment.insert(
        "RECORD_DIR".to_string(),
        temp_dir.path().to_string_lossy().into_owned(),
    );

    let outcome = Launcher::new(SystemRunner).run(&spec, true).await.unwrap();
    assert_eq!(outcome.exit_code(), 0);
    assert!(!temp_dir.path().join("argv").exists());
    assert!(outcome.command().render().contains("--model deit_tiny_patch16_224"));
}
