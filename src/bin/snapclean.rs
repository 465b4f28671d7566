//! SnapClean CLI Tool
//!
//! Command-line interface for submitting photos to a SnapClean background-removal
//! server and browsing recent edits.

#[cfg(feature = "cli")]
use snapclean::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<std::process::ExitCode> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
