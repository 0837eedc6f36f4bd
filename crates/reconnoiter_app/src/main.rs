mod cli;
mod platform;

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = cli::Cli::parse();
    platform::logging::initialize(cli.log, cli.level());
    platform::app::run_app(cli).await
}
