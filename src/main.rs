use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mib_poller::config::AppConfig;
use mib_poller::connector::{PollScope, build_connector, collect_report};
use mib_poller::formatter::JsonFormatter;
use mib_poller::routes::create_router;
use mib_poller::snmp::SnmpTransport;

#[derive(Parser)]
#[command(name = "mib-poller", version, about = "SNMP MIB poller")]
struct Cli {
    /// YAML файл конфигурации
    #[arg(short, long, env = "MIB_POLLER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Однократный опрос устройства, JSON в stdout
    Poll {
        /// properties | metrics | all
        #[arg(long, default_value = "all")]
        only: PollScope,

        /// Компактный JSON
        #[arg(long)]
        compact: bool,
    },
    /// HTTP сервер с POST /poll
    Serve {
        #[arg(long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_ref())?;
    config.debug_config();

    match cli.command {
        Command::Poll { only, compact } => poll_once(&config, only, compact).await,
        Command::Serve { listen } => {
            let listen = listen.unwrap_or_else(|| config.settings.server.listen.clone());
            serve(config, &listen).await
        }
    }
}

async fn poll_once(config: &AppConfig, scope: PollScope, compact: bool) -> Result<()> {
    let device = config.get_target();
    let auth = config.authentication();

    let transport =
        SnmpTransport::connect(&device, &auth, config.poll_options(), config.max_repetitions())
            .await
            .context(format!("Не удалось подключиться к {}", device))?;

    let mut connector = build_connector(config.get_connector(), transport).await;
    let report = collect_report(connector.as_mut(), scope).await;

    let json = if compact {
        JsonFormatter::to_json_compact(&report)?
    } else {
        JsonFormatter::to_json_string(&report)?
    };
    println!("{}", json);

    if report.properties.is_none() && report.metrics.is_none() {
        anyhow::bail!("Опрос {} не удался", device);
    }
    Ok(())
}

async fn serve(config: AppConfig, listen: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .context(format!("Не удалось открыть {}", listen))?;
    info!(listen = %listen, "HTTP server started");

    axum::serve(listener, create_router(config))
        .await
        .context("HTTP сервер завершился с ошибкой")
}
