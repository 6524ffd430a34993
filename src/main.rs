mod clean;
mod cli;
mod eda;
mod eda_statistics;
mod error;
mod load_clean;
mod merge;
mod models;

use clap::Parser;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    cli.run()
}
