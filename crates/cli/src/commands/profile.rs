//! Profile inspection and editing commands

use std::path::Path;

use anyhow::{Context as _, Result};
use kiosk_errors::KioskError;
use kiosk_schemas::ProfileValidator;
use tracing::info;

use super::{Context, close_engine, open_engine, read_json, read_text};
use crate::error::CliError;
use crate::output;

/// Print the committed profile.
pub async fn show(ctx: &Context, full: bool) -> Result<()> {
    let engine = open_engine(ctx).await?;
    output::print_profile(engine.get_profile(true)?, full, ctx.json);
    close_engine(engine).await
}

/// Validate a document on disk without opening the store.
pub async fn validate(ctx: &Context, file: &Path, partial: bool) -> Result<()> {
    let document = read_json(file)?;
    let mut validator = ProfileValidator::new();
    let checked = if partial {
        validator.check_partial(&document)
    } else {
        validator.check(&document)
    };
    checked
        .map_err(KioskError::from)
        .with_context(|| format!("{} is not a valid profile", file.display()))?;

    let kind = if partial { "partial update" } else { "profile" };
    output::print_success(&format!("{} is a valid {kind}", file.display()), ctx.json);
    Ok(())
}

/// Stage a partial update from `file` and commit it.
pub async fn apply(ctx: &Context, file: &Path, message: &str, author: Option<&str>) -> Result<()> {
    let patch = read_json(file)?;
    let mut engine = open_engine(ctx).await?;
    engine
        .stage_json(&patch)
        .with_context(|| format!("Cannot apply {}", file.display()))?;
    let commit = engine.commit_changes(message, author).await?;
    info!(commit_id = %commit.id, file = %file.display(), "Applied partial update");
    output::print_commit("Committed", &commit.entry(), ctx.json);
    close_engine(engine).await
}

/// Replace the profile with the document in `file` and commit it.
pub async fn import(ctx: &Context, file: &Path, message: &str, author: Option<&str>) -> Result<()> {
    let text = read_text(file)?;
    let mut engine = open_engine(ctx).await?;
    engine
        .import_profile(&text)
        .with_context(|| format!("Cannot import {}", file.display()))?;
    let commit = engine.commit_changes(message, author).await?;
    info!(commit_id = %commit.id, file = %file.display(), "Imported profile");
    output::print_commit("Committed", &commit.entry(), ctx.json);
    close_engine(engine).await
}

/// Write the committed profile to `destination`, or stdout.
pub async fn export(ctx: &Context, destination: Option<&Path>) -> Result<()> {
    let engine = open_engine(ctx).await?;
    let text = engine.export_profile()?;
    close_engine(engine).await?;

    match destination {
        Some(path) => {
            std::fs::write(path, format!("{text}\n")).map_err(|source| CliError::WriteOutput {
                path: path.to_path_buf(),
                source,
            })?;
            output::print_success(&format!("Profile written to {}", path.display()), ctx.json);
        }
        None => println!("{text}"),
    }
    Ok(())
}
