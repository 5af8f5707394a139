mod cli;
mod commands;
mod config;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pocket_ledger_core::models::settings::{RemoteSettings, ENV_REMOTE_URL};
use pocket_ledger_core::remote::memory::MemoryStore;
use pocket_ledger_core::remote::traits::RemoteStore;
use pocket_ledger_core::services::gateway_service::{MirrorPolicy, PersistenceGateway};
use pocket_ledger_core::storage::backend::FileKeyValueStore;
use pocket_ledger_core::storage::cache::LocalCache;
use pocket_ledger_core::PocketLedger;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    config::setup_logging();

    let cli = Cli::parse();

    let cache_path = match &cli.cache {
        Some(path) => path.clone(),
        None => config::default_cache_path()?,
    };
    let backend = FileKeyValueStore::open(&cache_path)
        .with_context(|| format!("Failed to open local cache at {}", cache_path.display()))?;
    let cache = LocalCache::new(Arc::new(backend));
    let policy = if cli.invalidate_mirror {
        MirrorPolicy::Invalidate
    } else {
        MirrorPolicy::WriteThrough
    };

    let offline = if cli.offline {
        let path = config::offline_snapshot_path()?;
        Some((Arc::new(load_snapshot(&path)?), path))
    } else {
        None
    };

    let mut app = match &offline {
        Some((store, _)) => {
            let remote: Arc<dyn RemoteStore> = store.clone();
            PocketLedger::new(PersistenceGateway::with_policy(remote, cache, policy))
        }
        None => {
            let Some(settings) = RemoteSettings::from_env()? else {
                bail!("{ENV_REMOTE_URL} is not set; configure the remote store or pass --offline");
            };
            tracing::debug!(url = %settings.url, "Using hosted store");
            PocketLedger::connect(&settings, cache, policy)?
        }
    };

    app.restore().await;
    let outcome = commands::run(&mut app, cli.command).await;

    if let Some((store, path)) = &offline {
        save_snapshot(store, path)?;
    }
    outcome
}

fn load_snapshot(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        return Ok(MemoryStore::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed offline snapshot at {}", path.display()))?;
    Ok(MemoryStore::from_snapshot(&value)?)
}

fn save_snapshot(store: &MemoryStore, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&store.snapshot()?)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
