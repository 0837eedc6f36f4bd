use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::platform::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "reconnoiter")]
#[command(about = "Submit a repository comparison and follow it to the result")]
#[command(version)]
pub struct Cli {
    /// What to compare, e.g. "background job libraries for rails"
    #[arg(trailing_var_arg = true, required = true)]
    pub query: Vec<String>,

    /// RON settings file (defaults to ./reconnoiter.ron when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub api_url: Option<String>,

    #[arg(long)]
    pub ws_url: Option<String>,

    /// Site that hosts finished comparisons
    #[arg(long)]
    pub site_url: Option<String>,

    /// Session credential; enables the realtime channel
    #[arg(long)]
    pub token: Option<String>,

    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn query(&self) -> String {
        self.query.join(" ")
    }

    pub fn level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
