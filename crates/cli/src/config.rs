use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

const APP: (&str, &str, &str) = ("com.pocketledger", "PocketLedger", "pocket-ledger");

pub fn data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let dir = proj.data_dir().to_path_buf();
    fs::create_dir_all(&dir).context("Failed to create data dir")?;
    Ok(dir)
}

/// Where the local cache lives unless `--cache` says otherwise.
pub fn default_cache_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("cache.json"))
}

/// Snapshot of the in-process store used by `--offline`.
pub fn offline_snapshot_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("offline-remote.json"))
}

/// `RUST_LOG` filter (default `pocket_ledger=info`), JSON output when `LOG_FORMAT=json`.
pub fn setup_logging() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "pocket_ledger=info,pocket_ledger_core=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
