// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod error;
mod http;
mod listener;
mod presence;
mod scheduler;
mod store;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use rgbctrl_app::init_logging;
use rgbctrl_core::{DynResult, PendingQueue};
use rgbctrl_protocol::SharedKeyValidator;
use rgbctrl_sinks::{register_builtin_sinks_on, SinkAccess, SinkRegistry};

use config::ServerConfig;
use listener::{ListenerContext, QuietWindow};
use presence::PresenceConfig;
use scheduler::SchedulerConfig;
use store::ConfigStore;

#[derive(Parser, Debug)]
#[command(name = "rgbctrl-server", about = "Networked 4-channel addressable-LED controller")]
struct Cli {
    /// Load configuration from this file instead of searching default paths.
    #[arg(long = "config", short = 'C')]
    config: Option<PathBuf>,

    /// Print an example combined `rgbctrl.toml` section and exit.
    #[arg(long = "print-config")]
    print_config: bool,

    /// Override [listen].addr.
    #[arg(long = "listen")]
    listen: Option<std::net::IpAddr>,

    /// Override [listen].port.
    #[arg(long = "port", short = 'p')]
    port: Option<u16>,

    /// Override [listen].psk.
    #[arg(long = "psk")]
    psk: Option<String>,

    /// Override [sink].backend ("dummy" or "serial").
    #[arg(long = "sink")]
    sink: Option<String>,
}

/// Derives a locally-administered MAC from `device_name` when none is
/// configured explicitly, so `discover` always has something stable to
/// report.
fn resolve_mac(explicit: Option<&str>, device_name: &str) -> String {
    if let Some(mac) = explicit {
        return mac.to_string();
    }
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in device_name.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    let bytes = hash.to_be_bytes();
    format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        (bytes[2] & 0xFE) | 0x02,
        bytes[3],
        bytes[4],
        bytes[5],
        bytes[6],
        bytes[7]
    )
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_combined_toml());
        return Ok(());
    }

    let (mut cfg, config_path) = if let Some(ref path) = cli.config {
        (ServerConfig::load_from_file(path)?, Some(path.clone()))
    } else {
        ServerConfig::load_from_default_paths()?
    };

    if let Some(addr) = cli.listen {
        cfg.listen.addr = addr;
    }
    if let Some(port) = cli.port {
        cfg.listen.port = port;
    }
    if let Some(psk) = cli.psk.clone() {
        cfg.listen.psk = Some(psk);
    }
    if let Some(sink) = cli.sink.clone() {
        cfg.sink.backend = sink;
    }

    cfg.validate()
        .map_err(|e| format!("invalid server configuration: {e}"))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(path) = &config_path {
        info!("loaded configuration from {}", path.display());
    }

    let mut sink_registry = SinkRegistry::new();
    register_builtin_sinks_on(&mut sink_registry);
    let access = match cfg.sink.backend.as_str() {
        "serial" => SinkAccess::Serial {
            path: cfg
                .sink
                .serial_path
                .clone()
                .ok_or("sink.serial_path must be set for the serial backend")?,
            baud: cfg.sink.serial_baud,
        },
        _ => SinkAccess::Dummy,
    };
    let sink = sink_registry.build_sink(&cfg.sink.backend, access)?;

    let store = Arc::new(ConfigStore::load(&cfg.storage.db_path));
    let pending = Arc::new(PendingQueue::new());
    let mac = resolve_mac(cfg.general.mac.as_deref(), &cfg.general.device_name);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles = Vec::new();

    let sched_cfg = SchedulerConfig {
        store: store.clone(),
        pending: pending.clone(),
    };
    let sched_shutdown = shutdown_rx.clone();
    handles.push(tokio::spawn(async move {
        scheduler::run_scheduler(sched_cfg, sink, sched_shutdown).await;
    }));

    let auth = Arc::new(SharedKeyValidator::new(cfg.listen.psk.clone()));
    let listen_addr = SocketAddr::new(cfg.listen.addr, cfg.listen.port);
    let listener_ctx = ListenerContext {
        store: store.clone(),
        pending: pending.clone(),
        auth,
        quiet: Arc::new(QuietWindow::new()),
        device_name: cfg.general.device_name.clone(),
        mac: mac.clone(),
        port: cfg.listen.port,
    };
    let listener_shutdown = shutdown_rx.clone();
    handles.push(tokio::spawn(async move {
        if let Err(e) = listener::run_listener(listener_ctx, listen_addr, listener_shutdown).await {
            error!("UDP listener error: {}", e);
        }
    }));

    let presence_cfg = PresenceConfig {
        device_name: cfg.general.device_name.clone(),
        mac,
        port: cfg.listen.port,
    };
    let presence_shutdown = shutdown_rx.clone();
    handles.push(tokio::spawn(async move {
        presence::run_presence(presence_cfg, presence_shutdown).await;
    }));

    info!(
        "rgbctrl-server started (device: \"{}\", listening on {})",
        cfg.general.device_name, listen_addr
    );

    signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}
