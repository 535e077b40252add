// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Presence advertisement: broadcasts the discover JSON (and its
//! plain-text variant) to the LAN after associating, at a fast cadence
//! for the first few announces and a slow cadence after that. A change
//! in the detected local IP re-arms the fast cadence and reannounces
//! immediately.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

const FAST_INTERVAL: Duration = Duration::from_secs(3);
const SLOW_INTERVAL: Duration = Duration::from_secs(15);
const FAST_ANNOUNCE_COUNT: u32 = 3;
const BROADCAST_ADDR: &str = "255.255.255.255";
const PLAIN_DISCOVER_PREFIX: &str = "RGBDISC! ";

pub struct PresenceConfig {
    pub device_name: String,
    pub mac: String,
    pub port: u16,
}

pub async fn run_presence(cfg: PresenceConfig, mut shutdown_rx: watch::Receiver<bool>) {
    let socket = match UdpSocket::bind(("0.0.0.0", 0)).await {
        Ok(s) => s,
        Err(e) => {
            warn!("presence socket bind failed: {}", e);
            return;
        }
    };
    if let Err(e) = socket.set_broadcast(true) {
        warn!("failed to enable broadcast on presence socket: {}", e);
        return;
    }

    let mut announces: u32 = 0;
    let mut last_ip: Option<IpAddr> = None;

    loop {
        if *shutdown_rx.borrow() {
            return;
        }

        let ip = detect_local_ip().ok();
        if ip != last_ip {
            info!("local IP changed to {:?}, re-arming fast presence cadence", ip);
            last_ip = ip;
            announces = 0;
        }

        if let Some(ip) = ip {
            announce(&socket, &cfg, ip).await;
        }
        announces += 1;

        let interval = if announces <= FAST_ANNOUNCE_COUNT {
            FAST_INTERVAL
        } else {
            SLOW_INTERVAL
        };
        tokio::select! {
            _ = sleep(interval) => {}
            _ = shutdown_rx.changed() => {}
        }
    }
}

async fn announce(socket: &UdpSocket, cfg: &PresenceConfig, ip: IpAddr) {
    let reply = serde_json::json!({
        "ok": true,
        "op": "discover",
        "name": cfg.device_name,
        "ver": env!("CARGO_PKG_VERSION"),
        "port": cfg.port,
        "ip": ip.to_string(),
        "mac": cfg.mac,
    });
    let dest = SocketAddr::new(BROADCAST_ADDR.parse().unwrap(), cfg.port);

    let Ok(json_bytes) = serde_json::to_vec(&reply) else {
        return;
    };
    let _ = socket.send_to(&json_bytes, dest).await;

    let mut text = PLAIN_DISCOVER_PREFIX.as_bytes().to_vec();
    text.extend(&json_bytes);
    let _ = socket.send_to(&text, dest).await;
}

/// Finds the address the OS would route outbound traffic from, by
/// "connecting" a scratch UDP socket without sending anything. Used as a
/// cheap stand-in for "are we Wi-Fi associated, and under which address".
fn detect_local_ip() -> std::io::Result<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:80")?;
    Ok(socket.local_addr()?.ip())
}
