//! show command - Print stored documents

use super::describe;
use crate::cli::Context;
use anyhow::{Context as _, Result};

/// Print the stored document of each source.
///
/// Unreadable sources are reported and skipped.
pub fn show(ctx: &Context, key: Option<&str>) -> Result<()> {
    let groups = ctx.sources(key)?;
    let out = ctx.output();

    for (key, handles) in groups.iter() {
        for handle in handles {
            out.status(format!("# {}: {}", key, describe(handle)));

            let data = match handle.borrow().read_data_from_source() {
                Ok(data) => data,
                Err(e) => {
                    out.warn(format!("cannot read {}: {}", describe(handle), e));
                    continue;
                }
            };

            match data {
                Some(data) => {
                    let rendered = serde_json::to_string_pretty(&data)
                        .context("Failed to format document")?;
                    out.data(rendered);
                }
                None => out.status("(no data)"),
            }
        }
    }

    Ok(())
}
