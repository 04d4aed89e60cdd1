//! Commit history commands

use anyhow::Result;
use tracing::info;

use super::{Context, close_engine, open_engine, resolve_commit};
use crate::output;

/// List commits, newest first.
pub async fn log(ctx: &Context, limit: usize, offset: usize) -> Result<()> {
    let engine = open_engine(ctx).await?;
    let entries = engine.get_history(limit, offset).await?;
    let total = engine.get_commit_count().await?;
    output::print_history(&entries, total, ctx.json);
    close_engine(engine).await
}

/// Show the operations turning commit `from` into commit `to`.
pub async fn diff(ctx: &Context, from: &str, to: &str) -> Result<()> {
    let engine = open_engine(ctx).await?;
    let from = resolve_commit(&engine, from).await?;
    let to = resolve_commit(&engine, to).await?;
    let diff = engine.get_diff(&from, &to).await?;
    output::print_changes(Some(&from), &to, &diff.describe(), ctx.json);
    close_engine(engine).await
}

/// Describe a single commit.
pub async fn summary(ctx: &Context, commit: &str) -> Result<()> {
    let engine = open_engine(ctx).await?;
    let id = resolve_commit(&engine, commit).await?;
    let lines = engine.get_commit_summary(&id).await?;
    output::print_changes(None, &id, &lines, ctx.json);
    close_engine(engine).await
}

/// Restore the profile recorded at `commit`.
pub async fn rollback(ctx: &Context, commit: &str, author: Option<&str>) -> Result<()> {
    let mut engine = open_engine(ctx).await?;
    let target = resolve_commit(&engine, commit).await?;
    let created = engine.rollback(&target, author).await?;
    info!(target = %target, commit_id = %created.id, "Rolled back");
    output::print_commit("Rolled back with", &created.entry(), ctx.json);
    close_engine(engine).await
}

/// Apply the retention limit now.
pub async fn prune(ctx: &Context) -> Result<()> {
    let engine = open_engine(ctx).await?;
    let removed = engine.prune_history().await?;
    let remaining = engine.get_commit_count().await?;
    output::print_success(
        &format!("Pruned {removed} commits, {remaining} remaining"),
        ctx.json,
    );
    close_engine(engine).await
}
