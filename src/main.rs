use anyhow::Context;
use clap::Parser;
use compute::Categories;
use config::Config;
use fetch::download_file;
use read::read_violations_file;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use write::write_summaries;

mod compute;
mod config;
mod data;
mod fetch;
mod read;
mod write;

fn main() {
    // Logs go to stderr, stdout is for the report only.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    // Usage errors and --help are handled (and exited on) by clap.
    let config = Config::parse();
    if let Err(e) = run(config) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), anyhow::Error> {
    let path = download_file(&config.url, &config.download_dir)
        .context("unable to download the violations file")?;

    let mut categories = Categories::new();
    let stats = read_violations_file(&path, &mut categories, config.row_policy())
        .context("unable to build the data set")?;
    if categories.is_empty() {
        warn!("{} holds no violations", path.display());
    }
    info!(
        "{} violations in {} categories ({} rows skipped)",
        categories.total(),
        categories.len(),
        stats.skipped
    );

    // Everything is in memory at this point: only now do we start writing.
    write_summaries(std::io::stdout().lock(), &categories)?;
    Ok(())
}
