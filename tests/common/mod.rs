//! Shared utilities for integration testing.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use hostwatch::config::AppConfig;
use hostwatch::hub::{materialize_hosts, StatusHub};
use hostwatch::lifecycle::Shutdown;
use hostwatch::monitor::{spawn_monitors, ProbeError, ProbeReport, Prober};
use hostwatch::HttpServer;

/// Prober driven by a test-controlled script. An exhausted script reads as
/// transport errors, which monitors treat as skipped samples.
pub struct ScriptedProber {
    script: Mutex<VecDeque<Result<ProbeReport, ProbeError>>>,
}

impl ScriptedProber {
    pub fn new(script: Vec<Result<ProbeReport, ProbeError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
        })
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(
        &self,
        _addr: &str,
        _count: u32,
        _payload_size: usize,
        _timeout: Duration,
    ) -> Result<ProbeReport, ProbeError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProbeError::Transport("script exhausted".to_string())))
    }
}

#[allow(dead_code)]
pub fn ok_report(sent: u32, received: u32) -> Result<ProbeReport, ProbeError> {
    Ok(ProbeReport {
        sent,
        received,
        avg_rtt: Duration::from_millis(10),
    })
}

/// A fully wired server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub hub: Arc<StatusHub>,
    pub shutdown: Shutdown,
    pub server_task: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    #[allow(dead_code)]
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Bring up monitors, hub, and HTTP server for a config, with probing backed
/// by the given prober.
pub async fn start_server(config: AppConfig, prober: Arc<dyn Prober>) -> TestServer {
    let hosts = materialize_hosts(&config.hosts, &config.probe);
    let shutdown = Shutdown::new();
    let hub = Arc::new(StatusHub::new(hosts.clone()));

    let records = spawn_monitors(hosts, prober, config.stream.updates, &shutdown);
    tokio::spawn(Arc::clone(&hub).run(records, shutdown.subscribe()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(&config, Arc::clone(&hub));
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        hub,
        shutdown,
        server_task,
    }
}
