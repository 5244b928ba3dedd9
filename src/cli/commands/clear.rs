//! clear command - Remove stored documents

use crate::cli::Context;
use crate::persistor::Persistor;
use anyhow::{Context as _, Result};

/// Clear every selected source.
pub fn clear(ctx: &Context, key: Option<&str>) -> Result<()> {
    let groups = ctx.sources(key)?;
    let count = groups.distinct().len();

    Persistor::clear(groups.into()).context("Failed to clear sources")?;

    ctx.output().status(format!("Cleared {} source(s).", count));
    Ok(())
}
