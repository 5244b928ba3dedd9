//! get command - Print a stored value by path

use super::describe;
use crate::cli::Context;
use crate::sources::document;
use anyhow::{bail, Context as _, Result};
use serde_json::Value;

/// Print the stored node at `path` from the first source that has it.
///
/// A setting prints its `value` as compact JSON; a group prints its whole
/// stored node.
pub fn get(ctx: &Context, path: &str, key: Option<&str>) -> Result<()> {
    let groups = ctx.sources(key)?;
    let out = ctx.output();

    for handle in groups.sources() {
        let data = match handle.borrow().read_data_from_source() {
            Ok(Some(data)) => data,
            Ok(None) => continue,
            Err(e) => {
                out.warn(format!("cannot read {}: {}", describe(handle), e));
                continue;
            }
        };

        let node = match document::find_path(&data, path) {
            Ok(Some(node)) => node,
            Ok(None) => continue,
            Err(e) => {
                out.warn(format!("skipping {}: {}", describe(handle), e));
                continue;
            }
        };

        out.detail(format!("found '{}' in {}", path, describe(handle)));
        let rendered = match node.get("value") {
            Some(value) => serde_json::to_string(value),
            None => serde_json::to_string_pretty(&Value::Object(node.clone())),
        }
        .context("Failed to format value")?;
        out.data(rendered);
        return Ok(());
    }

    bail!("No stored value for '{}'", path)
}
