//! settree binary entry point.

use std::process::ExitCode;

use settree::cli::{self, Cli};
use settree::ui::output;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Cli::parse_args();
    init_tracing(args.debug);

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Install the log subscriber: `RUST_LOG` if set, else `debug` with
/// `--debug`, else warnings only.
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "settree=debug" } else { "settree=warn" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
