use crate::read::RowPolicy;
use clap::Parser;
use std::path::PathBuf;

pub(crate) const DEFAULT_URL: &str =
    "http://forever.codeforamerica.org/fellowship-2015-tech-interview/Violations-2012.csv";
pub(crate) const URL_VAR: &str = "VIOLATIONS_URL";
pub(crate) const DIR_VAR: &str = "VIOLATIONS_DIR";

/// Command line wins over environment, which wins over the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "violations",
    about = "Per-category summary of a CSV of inspection violations",
    long_about = "Download a CSV of violations and print, per category, the earliest and latest violation and the total count."
)]
pub(crate) struct Config {
    #[arg(
        env = URL_VAR,
        default_value = DEFAULT_URL,
        help = "CSV file to fetch"
    )]
    pub url: String,
    #[arg(
        long = "dir",
        value_name = "DIR",
        env = DIR_VAR,
        default_value = ".",
        help = "Directory receiving the local copy of the file"
    )]
    pub download_dir: PathBuf,
    #[arg(
        long,
        help = "Fail on the first malformed row instead of skipping it"
    )]
    pub strict: bool,
}

impl Config {
    pub fn row_policy(&self) -> RowPolicy {
        if self.strict {
            RowPolicy::Abort
        } else {
            RowPolicy::Skip
        }
    }
}
