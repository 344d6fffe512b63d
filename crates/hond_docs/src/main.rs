use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use clap::Parser;
use hond_docs::Outcome;

/// Regenerate the appliance feature tables in the README
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Markdown file containing an "## Appliance Features" section
    #[arg(long, default_value = "README.md")]
    readme: PathBuf,

    /// Only report whether the file is up to date
    #[arg(long)]
    check: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let outcome = hond_docs::update_file(&args.readme, args.check)
        .with_context(|| format!("Failed to update {}", args.readme.display()))?;

    match outcome {
        Outcome::Unchanged => tracing::info!("{} is up to date", args.readme.display()),
        Outcome::Updated => tracing::info!("Updated {}", args.readme.display()),
        Outcome::Stale => bail!(
            "{} is out of date, run hond-docs to regenerate it",
            args.readme.display()
        ),
    }

    Ok(())
}
