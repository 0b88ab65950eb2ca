//! sunpath - sun position, clear-sky irradiance and shadow calculations.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "sunpath",
    version,
    about = "Solar position, irradiance and shadow toolkit"
)]
struct Cli {
    #[command(flatten)]
    settings: sunpath_cmd::Settings,

    #[command(subcommand)]
    command: sunpath_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("cache ttl {} s, {} batch workers", cli.settings.cache_ttl_secs, cli.settings.batch_workers);
    sunpath_cmd::run(cli.command, cli.settings).await
}
