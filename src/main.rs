use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rev_gateway::Config;
use rev_gateway::api::ApiServer;

/// Rev - voice-chat gateway for the Revolt Motors assistant
#[derive(Parser)]
#[command(name = "rev", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "REV_PORT", default_value = "3000")]
    port: u16,

    /// Path to a TOML config file
    #[arg(long, env = "REV_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of static web assets to serve
    #[arg(long, env = "REV_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,rev_gateway=info",
        1 => "info,rev_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.port = cli.port;
    if cli.static_dir.is_some() {
        config.static_dir = cli.static_dir;
    }

    tracing::info!(
        port = config.port,
        model = %config.model,
        "starting rev gateway"
    );

    ApiServer::new(config).run().await?;

    Ok(())
}
