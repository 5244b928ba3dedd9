//! check command - Report the state of each source

use super::describe;
use crate::cli::Context;
use crate::sources::HasData;
use crate::ui::output;
use anyhow::{bail, Result};

/// Print `key<TAB>source<TAB>state` for each source.
///
/// Fails if any source holds a malformed document or cannot be read.
pub fn check(ctx: &Context, key: Option<&str>) -> Result<()> {
    let groups = ctx.sources(key)?;
    let out = ctx.output();
    let mut problems = 0;

    for (key, handles) in groups.iter() {
        for handle in handles {
            let state = handle.borrow().has_data();
            match state {
                Ok(state) => {
                    if state == HasData::InvalidFormat {
                        problems += 1;
                    }
                    out.data(format_args!("{}\t{}\t{}", key, describe(handle), state.as_str()));
                }
                Err(e) => {
                    problems += 1;
                    out.data(format_args!("{}\t{}\terror", key, describe(handle)));
                    output::error(format!("{}: {}", describe(handle), e));
                }
            }
        }
    }

    if problems > 0 {
        bail!("{} source(s) need attention", problems);
    }
    Ok(())
}
