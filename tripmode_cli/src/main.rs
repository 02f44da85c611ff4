mod cli;
mod commands;
mod error_fmt;
mod logging;
mod sink;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = commands::load_config(&cli.config)?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Replay {
            recording,
            tick_ms,
            ticks,
        } => commands::replay(&cfg, &recording, tick_ms, ticks),
        Commands::Run {
            duration_s,
            activity,
            record,
            interactive,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            commands::install_ctrlc(&shutdown);
            let opts = commands::RunOptions {
                duration_s,
                activity,
                record,
                interactive,
            };
            commands::run_live(&cfg, &opts, shutdown)
        }
        Commands::ExportSvm {
            recording,
            out,
            tick_ms,
        } => commands::export_svm(&cfg, &recording, out.as_deref(), tick_ms),
        Commands::SelfCheck => commands::self_check(&cfg),
    }
}
