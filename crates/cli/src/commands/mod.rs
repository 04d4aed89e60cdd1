//! Command implementations for kioskctl

pub mod history;
pub mod menu;
pub mod profile;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use kiosk_profile::{EngineConfig, ProfileEngine};
use kiosk_profile_repository::{CommitId, StorageBackend};
use serde_json::Value;
use tracing::debug;

use crate::error::CliError;

/// Store directory used when neither `--store` nor a config file names one.
pub const DEFAULT_STORE_DIR: &str = "kiosk-data";

/// Global options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub json: bool,
    pub store: Option<PathBuf>,
    pub source: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Resolve the engine configuration: config file first, then flags.
pub async fn engine_config(ctx: &Context) -> Result<EngineConfig> {
    let mut config = match &ctx.config {
        Some(path) => EngineConfig::load(path)
            .await
            .map_err(|e| CliError::InvalidConfiguration(format!("{}: {e}", path.display())))?,
        None => EngineConfig::default(),
    };

    if let Some(dir) = &ctx.store {
        config.repository.backend = StorageBackend::File { dir: dir.clone() };
    } else if ctx.config.is_none() {
        config.repository.backend = StorageBackend::File {
            dir: PathBuf::from(DEFAULT_STORE_DIR),
        };
    }
    if let Some(source) = &ctx.source {
        config.source = Some(source.clone());
    }
    Ok(config)
}

/// Open and initialize the profile engine.
pub async fn open_engine(ctx: &Context) -> Result<ProfileEngine> {
    let config = engine_config(ctx).await?;
    debug!(backend = ?config.repository.backend, source = ?config.source, "Opening profile store");
    let mut engine = ProfileEngine::from_config(&config).await;
    engine
        .initialize()
        .await
        .context("Failed to open the profile store")?;
    Ok(engine)
}

/// Close the engine, flushing the repository.
pub async fn close_engine(mut engine: ProfileEngine) -> Result<()> {
    engine
        .destroy()
        .await
        .context("Failed to close the profile store")
}

/// Find the commit whose id equals `reference` or starts with it.
pub async fn resolve_commit(engine: &ProfileEngine, reference: &str) -> Result<CommitId> {
    if reference.is_empty() {
        return Err(CliError::InvalidCommitId("empty commit reference".to_string()).into());
    }
    let count = engine.get_commit_count().await?;
    let entries = engine.get_history(count, 0).await?;

    if let Some(exact) = entries.iter().find(|entry| entry.id.as_str() == reference) {
        return Ok(exact.id.clone());
    }
    let mut matches = entries
        .iter()
        .filter(|entry| entry.id.as_str().starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Ok(only.id.clone()),
        (Some(_), Some(_)) => Err(CliError::InvalidCommitId(format!(
            "{reference} is ambiguous"
        ))
        .into()),
        (None, _) => Err(CliError::InvalidCommitId(format!("no commit matches {reference}")).into()),
    }
}

/// Read a file as text.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        CliError::ReadInput {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Read a file and parse it as JSON.
pub fn read_json(path: &Path) -> Result<Value> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|e| {
        CliError::ReadInput {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        }
        .into()
    })
}
