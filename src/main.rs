use anyhow::Context;
use clap::Parser;
use deit_launch::config::cli::LogFormat;
use deit_launch::core::registry;
use deit_launch::utils::logger;
use deit_launch::{CliConfig, LaunchError, Launcher, SystemRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    match config.log_format {
        LogFormat::Compact => logger::init_cli_logger(config.verbose),
        LogFormat::Json => logger::init_json_logger(),
    }

    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if config.list_models {
        print_models();
        return Ok(());
    }

    let spec = match config.to_request().and_then(|request| request.resolve()) {
        Ok(spec) => spec,
        Err(e) => exit_with(e),
    };

    let launcher = Launcher::new(SystemRunner);
    let outcome = match launcher.run(&spec, config.dry_run).await {
        Ok(outcome) => outcome,
        Err(e) => exit_with(e),
    };

    if config.dry_run {
        if config.json {
            let plan = serde_json::to_string_pretty(outcome.command())
                .context("failed to serialize launch plan")?;
            println!("{}", plan);
        } else {
            println!("{}", outcome.command().render());
        }
        return Ok(());
    }

    // 退出碼沿用訓練程序
    std::process::exit(outcome.exit_code());
}

fn print_models() {
    println!(
        "{:<34} {:<20} {:>5} {:>6} {:>6} {:>6} {:>6}",
        "NAME", "FAMILY", "IMG", "PATCH", "DIM", "DEPTH", "HEADS"
    );
    for arch in registry::KNOWN_ARCHS {
        println!(
            "{:<34} {:<20} {:>5} {:>6} {:>6} {:>6} {:>6}",
            arch.name,
            format!("{:?}", arch.family),
            arch.img_size,
            arch.patch_size,
            arch.embed_dim,
            arch.depth,
            arch.num_heads
        );
    }
}

fn exit_with(e: LaunchError) -> ! {
    tracing::error!(
        "❌ Launch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}
