//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler loads the registry through [`Context::sources`], works on
//! the sources' stored documents and formats the result.

mod check;
mod clear;
mod get;
mod show;
mod sources;

pub use check::check;
pub use clear::clear;
pub use get::get;
pub use show::show;
pub use sources::sources;

use crate::cli::args::Command;
use crate::cli::Context;
use crate::sources::SourceHandle;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Sources => sources::sources(ctx),
        Command::Show { key } => show::show(ctx, key.as_deref()),
        Command::Check { key } => check::check(ctx, key.as_deref()),
        Command::Get { path, key } => get::get(ctx, &path, key.as_deref()),
        Command::Clear { key } => clear::clear(ctx, key.as_deref()),
    }
}

/// Display name of a source that may be borrowed elsewhere.
fn describe(handle: &SourceHandle) -> String {
    match handle.try_borrow() {
        Ok(source) => source.describe(),
        Err(_) => "<in use>".to_string(),
    }
}
