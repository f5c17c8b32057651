use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use inkcast_core::config::{Config, LoggingConfig};
use inkcast_hub::Hub;

#[derive(Parser)]
#[command(
    name = "inkcast",
    about = "Real-time broadcast relay for shared drawing sessions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Port to listen on (default: 1234)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,

        /// WebSocket endpoint path (default: /test)
        #[arg(long)]
        path: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Validate the configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;

    init_logging(config.logging.as_ref(), cli.verbose);

    match cli.command {
        Commands::Serve { port, bind, path } => {
            let mut server = config.server();
            if let Some(port) = port {
                server.port = port;
            }
            if let Some(bind) = bind {
                server.bind = bind;
            }
            if let Some(path) = path {
                server.path = path;
            }
            config.server = Some(server.clone());

            let (warnings, errors) = config.validate();
            for w in &warnings {
                tracing::warn!("{w}");
            }
            if !errors.is_empty() {
                for e in &errors {
                    tracing::error!("{e}");
                }
                anyhow::bail!("invalid configuration ({} error(s))", errors.len());
            }

            tracing::info!(port = server.port, path = %server.path, "Starting Inkcast relay");
            let hub = Arc::new(Hub::new());
            inkcast_hub::start_server(hub, &server).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                config.server = Some(config.server());
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Check => {
                println!("Config: {}", config_path.display());
                let (warnings, errors) = config.validate();
                for w in &warnings {
                    println!("warning: {w}");
                }
                for e in &errors {
                    println!("error: {e}");
                }
                if !errors.is_empty() {
                    anyhow::bail!("configuration has {} error(s)", errors.len());
                }
                println!("OK");
            }
        },
    }

    Ok(())
}

/// Build the subscriber from `RUST_LOG`, else the logging config, else
/// `info` (`debug` with `--verbose`).
fn init_logging(logging: Option<&LoggingConfig>, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match logging.and_then(|l| l.level.as_deref()) {
            Some(level) if !verbose => level,
            _ if verbose => "debug",
            _ => "info",
        };
        let mut directives = vec![level.to_string()];
        if let Some(l) = logging {
            directives.extend(l.filters.iter().cloned());
        }
        EnvFilter::new(directives.join(","))
    });

    let json = logging.is_some_and(|l| l.format == "json");
    let stdout = logging.is_some_and(|l| l.output == "stdout");

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match (json, stdout) {
        (true, true) => builder.json().with_writer(std::io::stdout).init(),
        (true, false) => builder.json().with_writer(std::io::stderr).init(),
        (false, true) => builder.with_writer(std::io::stdout).init(),
        (false, false) => builder.with_writer(std::io::stderr).init(),
    }
}
