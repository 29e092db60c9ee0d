//! Careeragent - answers questions about a person's career, on the web or
//! in the terminal

use careeragent_core::BindMode;
use careeragent_gateway::{
    build_agent, check_health, ctrl_c_interrupts, load_config, run_chat, start_gateway, GatewayState,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "careeragent", about = "Career agent: web chat and terminal chat")]
struct Cli {
    /// Config file (missing file means defaults)
    #[arg(short, long, global = true, env = "CAREERAGENT_CONFIG", default_value = "careeragent.toml")]
    config: PathBuf,
    /// Directory holding the profile summary and career document
    #[arg(long, global = true)]
    profile_dir: Option<PathBuf>,
    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web gateway
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
        /// loopback or lan
        #[arg(short, long)]
        bind: Option<BindMode>,
    },
    /// Chat with the agent in the terminal
    Chat,
    /// Query a running gateway's health endpoint
    Health {
        #[arg(short, long, default_value = "7860")]
        port: u16,
    },
    /// Print the effective configuration (secrets omitted)
    Config,
    /// Show version
    Version,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "careeragent=info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Some(Commands::Serve { port, bind }) => {
            let mut config = load_config(&cli.config, cli.profile_dir)?;
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if let Some(bind) = bind {
                config.gateway.bind = bind;
            }
            let service = build_agent(&config).await?;
            start_gateway(&config.gateway, Arc::new(GatewayState::new(service))).await?;
        }

        Some(Commands::Health { port }) => {
            let health = check_health(port).await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }

        Some(Commands::Config) => {
            let config = load_config(&cli.config, cli.profile_dir)?;
            print!("{}", config.to_toml());
        }

        Some(Commands::Version) => {
            println!("careeragent v{}", env!("CARGO_PKG_VERSION"));
        }

        // No subcommand = chat
        Some(Commands::Chat) | None => {
            let config = load_config(&cli.config, cli.profile_dir)?;
            let service = build_agent(&config).await?;
            run_chat(
                service.agent,
                &service.profile_name,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
                ctrl_c_interrupts(),
            )
            .await?;
        }
    }

    Ok(())
}
