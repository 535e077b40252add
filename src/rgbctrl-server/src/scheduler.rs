// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Scheduler / frame loop: paces rendering off `speed`, drains at most one
//! pending control-plane op per frame, and owns the boot fade-in. The
//! sleep between frames is rebuilt every iteration from the current
//! `speed`, so a mid-animation speed change is felt on the very next
//! frame rather than waiting out a stale timer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

use rgbctrl_core::config::playlist::PlaylistEngine;
use rgbctrl_core::effects::{render_ring, EffectState};
use rgbctrl_core::{Config, FrameBuffer, Mode, PendingOp, PendingQueue, Rgb8, RingMapper};
use rgbctrl_sinks::Transmit;

use crate::store::ConfigStore;

/// Time to ramp transmitted brightness from 0 up to the configured target
/// after the process starts.
const BOOT_FADE_MS: u64 = 3_200;

pub struct SchedulerConfig {
    pub store: Arc<ConfigStore>,
    pub pending: Arc<PendingQueue>,
}

pub async fn run_scheduler(
    cfg: SchedulerConfig,
    mut sink: Box<dyn Transmit>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut current = cfg.store.current();
    let mut mapper = RingMapper::build(current.count, current.reverse);
    let mut effect_state = EffectState::new(mapper.len());
    let mut frame_buf = FrameBuffer::new();
    let mut playlist = PlaylistEngine::parse(&current.custom_seq, now_ms());
    let mut last_custom_seq = current.custom_seq.clone();

    let boot_start = Instant::now();
    let mut last_tick = Instant::now();

    loop {
        if *shutdown_rx.borrow() {
            info!("scheduler shutting down");
            return;
        }

        if let Some(applied) = process_pending(&cfg) {
            current = applied;
            mapper = RingMapper::build(current.count, current.reverse);
            effect_state.resize(mapper.len());
        }

        if current.custom_seq != last_custom_seq {
            playlist = PlaylistEngine::parse(&current.custom_seq, now_ms());
            last_custom_seq = current.custom_seq.clone();
        }

        let now = Instant::now();
        let dt_ms = now.duration_since(last_tick).as_millis().max(1) as u64;
        last_tick = now;

        let scratch;
        let (render_cfg, effective_mode): (&Config, Mode) = if current.mode == Mode::Custom {
            playlist.tick(now_ms(), current.custom_loop);
            match playlist.current() {
                Some(step) => {
                    scratch = step.scratch_config(&current);
                    (&scratch, step.mode)
                }
                None => (&current, Mode::Solid),
            }
        } else {
            (&current, current.mode)
        };

        let ring_len = mapper.len();
        let colors = render_ring(render_cfg, effective_mode, &mut effect_state, dt_ms, ring_len);

        for (logical, &color) in colors.iter().enumerate() {
            if let Some(addr) = mapper.physical(logical) {
                frame_buf.set(addr.channel, addr.index, Rgb8::from_u32(color));
            }
        }
        frame_buf.set_brightness(boot_fade_brightness(current.brightness, boot_start.elapsed().as_millis() as u64));

        if let Err(e) = sink.show(frame_buf.rendered()).await {
            warn!("pixel sink transmit failed: {}", e);
        }

        let frame_ms = 10 + (255u32.saturating_sub(current.speed as u32)) / 2;
        tokio::select! {
            _ = sleep(Duration::from_millis(frame_ms as u64)) => {}
            _ = shutdown_rx.changed() => {}
        }
    }
}

/// Ramps transmitted brightness from 0 to `target` over `BOOT_FADE_MS`;
/// once `target` is nonzero the floor is 1 so the ramp is visibly moving
/// rather than staying dark the whole way through.
fn boot_fade_brightness(target: u8, elapsed_ms: u64) -> u8 {
    if target == 0 || elapsed_ms >= BOOT_FADE_MS {
        return target;
    }
    let ramp = elapsed_ms as f32 / BOOT_FADE_MS as f32;
    ((target as f32 * ramp) as u8).max(1)
}

/// Pops and applies at most one pending op, in strict priority order
/// (raw-deferred, then reset, then counts, then cfg). Returns the config
/// that resulted from applying it, if anything was applied.
fn process_pending(cfg: &SchedulerConfig) -> Option<Config> {
    let op = cfg.pending.pop_highest_priority()?;
    let applied = match op {
        PendingOp::Reset => cfg.store.reset(),
        PendingOp::Counts(counts) => cfg.store.set_counts(counts),
        PendingOp::Cfg { patch, persist } => {
            if persist {
                cfg.store.apply_save(&patch)
            } else {
                cfg.store.apply_preview(&patch)
            }
        }
        PendingOp::RawDeferred(_) => {
            // The UDP listener owns the peer address needed to reply to a
            // quiet-window-deferred datagram, so it drains and reapplies
            // these itself rather than routing them through here.
            return None;
        }
    };
    Some(applied)
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_fade_ramps_then_settles_at_target() {
        assert_eq!(boot_fade_brightness(180, 0), 1);
        assert!(boot_fade_brightness(180, 1_600) < 180);
        assert_eq!(boot_fade_brightness(180, BOOT_FADE_MS), 180);
        assert_eq!(boot_fade_brightness(180, BOOT_FADE_MS + 500), 180);
    }

    #[test]
    fn boot_fade_stays_dark_when_target_is_zero() {
        assert_eq!(boot_fade_brightness(0, 0), 0);
        assert_eq!(boot_fade_brightness(0, BOOT_FADE_MS), 0);
    }

    #[test]
    fn frame_ms_formula_is_weakly_monotonic_in_speed() {
        let frame_ms = |speed: u8| 10 + (255u32.saturating_sub(speed as u32)) / 2;
        let mut prev = frame_ms(0);
        for speed in 1..=255u8 {
            let next = frame_ms(speed);
            assert!(next <= prev);
            prev = next;
        }
    }
}
