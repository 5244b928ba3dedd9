//! sources command - List the configured registry

use super::describe;
use crate::cli::Context;
use crate::ui::output;
use anyhow::Result;

/// List every configured source, grouped by key.
pub fn sources(ctx: &Context) -> Result<()> {
    let groups = ctx.sources(None)?;

    if groups.is_empty() {
        ctx.output().status("No sources configured.");
        return Ok(());
    }

    let out = ctx.output();
    for (key, handles) in groups.iter() {
        let described: Vec<String> = handles.iter().map(describe).collect();
        out.data(output::source_listing(key, &described));
    }

    Ok(())
}
