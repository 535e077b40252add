// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! UDP control plane: classifies each datagram, authenticates JSON ops
//! against the pre-shared key, and enqueues mutating ops onto the
//! [`PendingQueue`] rather than applying them inline. Reads (`get`,
//! `discover`) are cheap enough to answer directly from the config store.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use rgbctrl_core::{ConfigPatch, PendingOp, PendingQueue};
use rgbctrl_protocol::{PskValidator, RawRequest};

use crate::store::ConfigStore;

const MAX_DATAGRAM: usize = 1600;
const QUIET_POLL_INTERVAL_MS: u64 = 25;
const PLAIN_DISCOVER_PROBE: &str = "RGBDISC?";
const PLAIN_DISCOVER_PREFIX: &str = "RGBDISC! ";

/// Monotonic deadline (epoch ms) past which the listener stops JSON-parsing
/// and applying requests, driven by whatever component owns the quiet
/// window (a telemetry bus driver, in the original firmware; nothing in
/// this build sets it outside of tests). Single-writer/single-reader, so a
/// bare atomic is enough.
pub struct QuietWindow {
    deadline_ms: AtomicU64,
}

impl QuietWindow {
    pub fn new() -> Self {
        QuietWindow {
            deadline_ms: AtomicU64::new(0),
        }
    }

    pub fn enter_quiet_us(&self, dur_us: u64) {
        let deadline = now_ms() + dur_us / 1_000;
        self.deadline_ms.store(deadline, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        now_ms() < self.deadline_ms.load(Ordering::Relaxed)
    }
}

impl Default for QuietWindow {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

struct Deferred {
    bytes: Vec<u8>,
    peer: SocketAddr,
}

pub struct ListenerContext {
    pub store: Arc<ConfigStore>,
    pub pending: Arc<PendingQueue>,
    pub auth: Arc<dyn PskValidator>,
    pub quiet: Arc<QuietWindow>,
    pub device_name: String,
    pub mac: String,
    pub port: u16,
}

pub async fn run_listener(
    ctx: ListenerContext,
    addr: SocketAddr,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let socket = UdpSocket::bind(addr).await?;
    info!("UDP control plane listening on {}", addr);

    let mut buf = vec![0u8; MAX_DATAGRAM];
    let deferred: Mutex<Option<Deferred>> = Mutex::new(None);
    let mut poll = interval(Duration::from_millis(QUIET_POLL_INTERVAL_MS));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            res = socket.recv_from(&mut buf) => {
                let (n, peer) = res?;
                let bytes = buf[..n].to_vec();
                handle_datagram(&ctx, &socket, &deferred, bytes, peer).await;
            }
            _ = poll.tick() => {
                if !ctx.quiet.is_active() {
                    let ready = deferred.lock().expect("deferred mutex poisoned").take();
                    if let Some(d) = ready {
                        handle_datagram(&ctx, &socket, &deferred, d.bytes, d.peer).await;
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("UDP listener shutting down");
                    return Ok(());
                }
            }
        }
    }
}

fn looks_like_json(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|&b| b == b'{')
        .unwrap_or(false)
}

async fn handle_datagram(
    ctx: &ListenerContext,
    socket: &UdpSocket,
    deferred: &Mutex<Option<Deferred>>,
    bytes: Vec<u8>,
    peer: SocketAddr,
) {
    // Plain-text discovery is answered immediately regardless of the
    // quiet window; it never touches the config record.
    if !looks_like_json(&bytes) {
        reply_plain_text(ctx, socket, &bytes, peer).await;
        return;
    }

    if ctx.quiet.is_active() {
        let mut slot = deferred.lock().expect("deferred mutex poisoned");
        *slot = Some(Deferred { bytes, peer });
        debug!("deferred JSON datagram from {} during quiet window", peer);
        return;
    }

    dispatch_json(ctx, socket, &bytes, peer).await;
}

async fn reply_plain_text(ctx: &ListenerContext, socket: &UdpSocket, bytes: &[u8], peer: SocketAddr) {
    let text = String::from_utf8_lossy(bytes);
    if text.trim() == PLAIN_DISCOVER_PROBE {
        let reply = discover_reply(ctx);
        let mut out = PLAIN_DISCOVER_PREFIX.as_bytes().to_vec();
        if let Ok(json_bytes) = serde_json::to_vec(&reply) {
            out.extend(json_bytes);
        }
        send_raw(socket, peer, &out).await;
    } else {
        send_json(
            socket,
            peer,
            &serde_json::json!({"ok": false, "op": "raw", "err": "unknown text"}),
        )
        .await;
    }
}

fn discover_reply(ctx: &ListenerContext) -> serde_json::Value {
    let ip = detect_local_ip(ctx.port)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|_| "0.0.0.0".to_string());
    serde_json::json!({
        "ok": true,
        "op": "discover",
        "name": ctx.device_name,
        "ver": env!("CARGO_PKG_VERSION"),
        "port": ctx.port,
        "ip": ip,
        "mac": ctx.mac,
    })
}

/// Finds the address the OS would route outbound traffic from, by
/// "connecting" a scratch UDP socket without sending anything.
fn detect_local_ip(_port: u16) -> std::io::Result<std::net::IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:80")?;
    Ok(socket.local_addr()?.ip())
}

async fn dispatch_json(ctx: &ListenerContext, socket: &UdpSocket, bytes: &[u8], peer: SocketAddr) {
    let req: RawRequest = match serde_json::from_slice(bytes) {
        Ok(r) => r,
        Err(e) => {
            send_json(
                socket,
                peer,
                &serde_json::json!({"ok": false, "op": "parse", "err": e.to_string()}),
            )
            .await;
            return;
        }
    };

    let Some(op) = req.op.as_deref() else {
        send_json(
            socket,
            peer,
            &serde_json::json!({"ok": false, "op": "op", "err": "missing op"}),
        )
        .await;
        return;
    };

    if op != "discover" && ctx.auth.validate(&req.auth).is_err() {
        send_json(
            socket,
            peer,
            &serde_json::json!({"ok": false, "op": "auth", "err": "bad key"}),
        )
        .await;
        return;
    }

    let reply = match op {
        "discover" => discover_reply(ctx),
        "get" => {
            let snapshot = ctx.store.snapshot();
            serde_json::json!({"ok": true, "op": "get", "cfg": snapshot})
        }
        "preview" => enqueue_cfg(ctx, &req.body, false, "preview"),
        "save" => enqueue_cfg(ctx, &req.body, true, "save"),
        "reset" => {
            ctx.pending.push(PendingOp::Reset);
            serde_json::json!({"ok": true, "op": "reset"})
        }
        "setCounts" => handle_set_counts(ctx, &req.body),
        _ => serde_json::json!({"ok": false, "op": "op", "err": "unknown op"}),
    };
    send_json(socket, peer, &reply).await;
}

fn enqueue_cfg(ctx: &ListenerContext, body: &serde_json::Value, persist: bool, op: &str) -> serde_json::Value {
    match ConfigPatch::from_request_body(body) {
        Ok(patch) => {
            ctx.pending.push(PendingOp::Cfg { patch, persist });
            serde_json::json!({"ok": true, "op": op})
        }
        Err(e) => serde_json::json!({"ok": false, "op": op, "err": e.to_string()}),
    }
}

fn handle_set_counts(ctx: &ListenerContext, body: &serde_json::Value) -> serde_json::Value {
    let counts = body
        .get("c")
        .and_then(|v| v.as_array())
        .filter(|a| a.len() >= 4)
        .and_then(|a| {
            let mut out = [0u8; 4];
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = a[i].as_u64()?.min(u8::MAX as u64) as u8;
            }
            Some(out)
        });

    match counts {
        Some(counts) => {
            ctx.pending.push(PendingOp::Counts(counts));
            serde_json::json!({"ok": true, "op": "setCounts"})
        }
        None => serde_json::json!({"ok": false, "op": "setCounts", "err": "need 4 ints"}),
    }
}

async fn send_json(socket: &UdpSocket, peer: SocketAddr, value: &serde_json::Value) {
    if let Ok(bytes) = serde_json::to_vec(value) {
        send_raw(socket, peer, &bytes).await;
    }
}

async fn send_raw(socket: &UdpSocket, peer: SocketAddr, bytes: &[u8]) {
    if let Err(e) = socket.send_to(bytes, peer).await {
        warn!("failed to send UDP reply to {}: {}", peer, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_window_reports_active_immediately_after_entering() {
        let quiet = QuietWindow::new();
        assert!(!quiet.is_active());
        quiet.enter_quiet_us(50_000);
        assert!(quiet.is_active());
    }

    #[test]
    fn looks_like_json_ignores_leading_whitespace() {
        assert!(looks_like_json(b"  \t{\"op\":\"get\"}"));
        assert!(!looks_like_json(b"RGBDISC?"));
    }

    #[test]
    fn set_counts_rejects_short_arrays() {
        let body = serde_json::json!({"c": [1, 2, 3]});
        assert!(body.get("c").and_then(|v| v.as_array()).unwrap().len() < 4);
    }
}
