use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bam::cli;

#[derive(Parser)]
#[command(name = "bam")]
#[command(about = "Manifest and worklog tracking for bioimage-analysis projects")]
struct Cli {
    /// Project root containing manifest.yaml
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: cli::Command,
}

/// Initialize tracing to stderr, keeping stdout clean for the JSON envelope.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "bam=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing();

    let code = cli::run(&args.project, args.command);
    std::process::exit(code);
}
