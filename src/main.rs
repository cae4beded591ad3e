use clap::Parser;
use syncdaemon::config::Cli;
use syncdaemon::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Validation happens here, before the process detaches
    let config = Config::try_from(cli)?;

    syncdaemon::commands::daemon::run(config)?;
    Ok(())
}
