use anyhow::Result;
use clap::Parser;
use phcloud::api::{ApiToken, CloudClient};
use phcloud::cli::{Cli, LogLevel};
use phcloud::config::Config;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::MakeWriterExt;

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    else {
        return None;
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("phcloud started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("phcloud").join("phcloud.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".phcloud").join("phcloud.log");
    }
    PathBuf::from("phcloud.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = setup_logging(cli.log_level);

    let config = Config::load();
    let api_url = config.effective_api_url(cli.api_url.as_deref());
    let token = ApiToken::resolve(cli.token.as_deref())?;
    let client = CloudClient::new(token, &api_url)?;

    match phcloud::cli::dispatch(&client, cli.command).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) => {
            tracing::error!("command failed: {err:#}");
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}
