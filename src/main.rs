use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::time;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostwatch::config;
use hostwatch::hub::{self, StatusHub};
use hostwatch::http::HttpServer;
use hostwatch::lifecycle::{signals, Shutdown};
use hostwatch::monitor::{self, IcmpProber, Prober};

/// Live host reachability monitor with WebSocket streaming.
#[derive(Parser)]
#[command(
    name = "hostwatch",
    version,
    about = "Probes configured hosts and streams live status changes",
    after_help = "Probes are unprivileged ICMP datagrams. On Linux these must be enabled with:\n    sudo sysctl -w net.ipv4.ping_group_range=\"0 2147483647\""
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostwatch=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match config::load_config(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };

    let hosts = hub::materialize_hosts(&config.hosts, &config.probe);
    tracing::info!(
        hosts = hosts.len(),
        bind_address = %config.listener.bind_address,
        updates = ?config.stream.updates,
        "configuration loaded"
    );

    let prober: Arc<dyn Prober> = match IcmpProber::new() {
        Ok(prober) => Arc::new(prober),
        Err(error) => {
            tracing::error!(%error, "cannot open ICMP sockets");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let hub = Arc::new(StatusHub::new(hosts.clone()));

    let records = monitor::spawn_monitors(hosts, prober, config.stream.updates, &shutdown);
    tokio::spawn(Arc::clone(&hub).run(records, shutdown.subscribe()));

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(
                %error,
                address = %config.listener.bind_address,
                "cannot bind listener"
            );
            return ExitCode::FAILURE;
        }
    };

    let server = HttpServer::new(&config, Arc::clone(&hub));
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tracing::info!("server started");

    signals::termination_signal().await;
    tracing::info!("shutting down");

    // A second signal from here on forces the process down.
    signals::arm_forced_exit();
    shutdown.trigger();

    let grace = Duration::from_secs(config.shutdown.grace_secs);
    match time::timeout(grace, server_task).await {
        Ok(Ok(Ok(()))) => {
            tracing::info!("server stopped");
            ExitCode::SUCCESS
        }
        Ok(Ok(Err(error))) => {
            tracing::error!(%error, "server error during shutdown");
            ExitCode::FAILURE
        }
        Ok(Err(error)) => {
            tracing::error!(%error, "server task failed");
            ExitCode::FAILURE
        }
        Err(_) => {
            tracing::error!("shutdown drain deadline exceeded");
            ExitCode::FAILURE
        }
    }
}
