mod cli;
mod credentials;
mod helpers;
mod ingestion;
mod instrumentation;
mod reporter;
mod runtime;

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    instrumentation::tracing::init_tracing();
    instrumentation::tracing::init_panic_handler();

    // Main entrypoint simply delegates control to CLI layer.
    // The CLI parses user commands and then calls into the appropriate logic
    cli::cli::run().await
}
