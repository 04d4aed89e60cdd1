//! Orderable menu command

use anyhow::Result;

use super::{Context, close_engine, open_engine};
use crate::output;

/// Print the committed menu as customers can order from it.
pub async fn show(ctx: &Context) -> Result<()> {
    let engine = open_engine(ctx).await?;
    let menu = engine.get_menu_for_llm(true)?;
    output::print_menu(&menu, ctx.json);
    close_engine(engine).await
}
