use anyhow::Result;
use clap::Parser;
use tfa_lib::cli::Cli;
use tfa_lib::config::ShellConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tfa_lib::logging::init(&cli.log_level)?;

    let config = ShellConfig::from_cli(&cli)?;
    tracing::debug!(?config, "starting");

    tfa_lib::run(config).await
}
