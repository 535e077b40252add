// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Effect Library: the 14 built-in animation modes, plus the master-off
//! short-circuit. Every mode is a pure function of `(Config, EffectState,
//! tick_ms, ring_len)` down to its logical ring colors; the caller (the
//! scheduler) is responsible for resolving `Mode::Custom` to a concrete
//! underlying mode via the playlist engine before calling in here.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::{blend_u32, dim, hsv_to_rgb, motion_color, Palette};
use crate::config::{Config, Mode};

struct Meteor {
    pos: f32,
    vel: f32,
    len: f32,
}

/// Per-ring animation state carried across frames. Rebuilt (resized) by
/// the scheduler whenever `ring_len` changes.
pub struct EffectState {
    phase: f32,
    breathe_lp: f32,
    head_pos: f32,
    larson_pos: f32,
    larson_dir: f32,
    twinkle_phase: Vec<f32>,
    fire_heat: Vec<f32>,
    meteors: Vec<Meteor>,
    prev_frame: Vec<u32>,
    rng: StdRng,
    len: usize,
}

impl EffectState {
    pub fn new(ring_len: usize) -> Self {
        let mut s = EffectState {
            phase: 0.0,
            breathe_lp: 0.0,
            head_pos: 0.0,
            larson_pos: 0.0,
            larson_dir: 1.0,
            twinkle_phase: Vec::new(),
            fire_heat: Vec::new(),
            meteors: Vec::new(),
            prev_frame: Vec::new(),
            rng: StdRng::seed_from_u64(0xC0FFEE),
            len: 0,
        };
        s.resize(ring_len);
        s
    }

    pub fn resize(&mut self, ring_len: usize) {
        if ring_len == self.len {
            return;
        }
        self.len = ring_len;
        self.twinkle_phase = vec![0.0; ring_len];
        self.fire_heat = vec![0.0; ring_len];
        self.prev_frame = vec![0; ring_len];
        self.meteors.clear();
        self.larson_pos = 0.0;
        self.larson_dir = 1.0;
    }
}

fn palette(cfg: &Config) -> Palette {
    Palette {
        stops: [cfg.color_a, cfg.color_b, cfg.color_c, cfg.color_d],
        count: cfg.palette_count,
    }
}

/// Samples a color to animate a "head" pixel with: the real palette when
/// more than one stop is live, otherwise three hue-rotated companions of
/// `colorA` so single-color configs still get visible motion.
fn motion_palette_color(cfg: &Config, pal: &Palette, phase: f32) -> u32 {
    if cfg.palette_count > 1 {
        pal.sample(phase, cfg.intensity)
    } else {
        motion_color(cfg.color_a, phase)
    }
}

fn meteor_velocity(rng: &mut StdRng, speed: u8) -> f32 {
    let base = rng.gen_range(0.35..=1.60);
    let speed_factor = 0.5 + (speed as f32 / 255.0) * 2.0;
    base * speed_factor
}

/// Renders one frame of logical ring colors, `ring_len` entries long.
/// `effective_mode` overrides `cfg.mode`, letting the playlist engine pick
/// the concrete mode while `Custom` stays the config's persisted value.
pub fn render_ring(
    cfg: &Config,
    effective_mode: Mode,
    state: &mut EffectState,
    tick_ms: u64,
    ring_len: usize,
) -> Vec<u32> {
    if cfg.master_off || ring_len == 0 {
        return vec![0; ring_len];
    }
    state.resize(ring_len);

    let dt_sec = tick_ms as f32 / 1000.0;
    let speed_hz = 0.15 + (cfg.speed as f32 / 255.0) * 2.0;
    state.phase = (state.phase + speed_hz * dt_sec).rem_euclid(1.0);

    let head_speed = 2.0 + (cfg.speed as f32 / 255.0) * 18.0;
    state.head_pos = (state.head_pos + head_speed * dt_sec).rem_euclid(ring_len as f32);

    let max_pos = ring_len.saturating_sub(1) as f32;
    let mut larson_pos = state.larson_pos + head_speed * dt_sec * state.larson_dir;
    if larson_pos < 0.0 {
        larson_pos = -larson_pos;
        state.larson_dir = 1.0;
    } else if larson_pos > max_pos {
        larson_pos = 2.0 * max_pos - larson_pos;
        state.larson_dir = -1.0;
    }
    state.larson_pos = larson_pos;

    let pal = palette(cfg);

    let colors = match effective_mode {
        Mode::Solid => vec![cfg.color_a; ring_len],
        Mode::Breathe => render_breathe(cfg, state, ring_len),
        Mode::ColorWipe => render_color_wipe(cfg, &pal, state, ring_len),
        Mode::Larson => render_larson(cfg, &pal, state, ring_len),
        Mode::Rainbow => render_rainbow(state, ring_len),
        Mode::TheaterChase => render_theater_chase(cfg, &pal, state, ring_len),
        Mode::Twinkle => render_twinkle(cfg, state, ring_len),
        Mode::Comet => render_comet(cfg, &pal, state, ring_len),
        Mode::Meteor => render_meteor(cfg, &pal, state, ring_len),
        Mode::ClockSpin => render_clock_spin(cfg, state, ring_len),
        Mode::Plasma => render_plasma(cfg, state, ring_len),
        Mode::Fire => render_fire(cfg, state, ring_len),
        Mode::PaletteCycle => render_palette_cycle(cfg, &pal, state, ring_len),
        Mode::PaletteChase => render_palette_chase(cfg, &pal, state, ring_len),
        // Reached only if the scheduler fails to resolve Custom via the
        // playlist engine; holds the base color rather than rendering
        // nothing.
        Mode::Custom => vec![cfg.color_a; ring_len],
    };

    state.prev_frame = colors.clone();
    colors
}

fn render_breathe(cfg: &Config, state: &mut EffectState, ring_len: usize) -> Vec<u32> {
    let raw = (state.phase * std::f32::consts::TAU).sin() * 0.5 + 0.5;
    let target = 0.10 + raw * 0.90;
    state.breathe_lp += (target - state.breathe_lp) * 0.2;
    vec![dim(cfg.color_a, state.breathe_lp); ring_len]
}

fn render_color_wipe(cfg: &Config, pal: &Palette, state: &EffectState, ring_len: usize) -> Vec<u32> {
    let width = cfg.width.max(1) as f32;
    let head_color = motion_palette_color(cfg, pal, state.phase);
    (0..ring_len)
        .map(|i| {
            let mut behind = state.head_pos - i as f32;
            if behind < 0.0 {
                behind += ring_len as f32;
            }
            if behind < width {
                dim(head_color, 1.0 - behind / width)
            } else {
                0
            }
        })
        .collect()
}

fn render_larson(cfg: &Config, pal: &Palette, state: &EffectState, ring_len: usize) -> Vec<u32> {
    let width = cfg.width.max(1) as f32;
    let trail_factor = 0.55 + (1.0 - cfg.intensity as f32 / 255.0) * 0.35;
    let head_color = pal.sample(0.0, cfg.intensity);
    (0..ring_len)
        .map(|i| {
            let dist = (state.larson_pos - i as f32).abs();
            let head = if dist <= width {
                dim(head_color, 1.0 - dist / (width + 1.0))
            } else {
                0
            };
            if head != 0 {
                head
            } else {
                dim(state.prev_frame.get(i).copied().unwrap_or(0), trail_factor)
            }
        })
        .collect()
}

fn render_rainbow(state: &EffectState, ring_len: usize) -> Vec<u32> {
    (0..ring_len)
        .map(|i| hsv_to_rgb(state.phase + i as f32 / ring_len as f32, 1.0, 1.0))
        .collect()
}

fn render_theater_chase(cfg: &Config, pal: &Palette, state: &EffectState, ring_len: usize) -> Vec<u32> {
    let gap = cfg.width.max(1) as usize;
    let offset = (state.phase * ring_len as f32) as usize;
    (0..ring_len)
        .map(|i| {
            if (i + offset) % gap == 0 {
                pal.sample(0.0, cfg.intensity)
            } else {
                dim(state.prev_frame.get(i).copied().unwrap_or(0), 0.5)
            }
        })
        .collect()
}

fn render_twinkle(cfg: &Config, state: &mut EffectState, ring_len: usize) -> Vec<u32> {
    let rate = 1.0 + (cfg.intensity as f32 * ring_len as f32) / (255.0 * 30.0);
    let spawn_chance = (rate / ring_len as f32).min(1.0);
    let advance = (0.02 + (cfg.speed as f32 / 255.0) * 0.08) / cfg.width.max(1) as f32;
    let EffectState { twinkle_phase, rng, .. } = state;
    for slot in twinkle_phase.iter_mut() {
        if *slot <= 0.0 {
            if rng.gen::<f32>() < spawn_chance {
                *slot = 1e-4;
            }
        } else {
            *slot += advance;
            if *slot >= 1.0 {
                *slot = 0.0;
            }
        }
    }
    twinkle_phase
        .iter()
        .take(ring_len)
        .map(|&phase| {
            if phase <= 0.0 {
                0
            } else {
                let curve = (phase * std::f32::consts::PI).sin().powi(3).abs();
                dim(cfg.color_a, curve)
            }
        })
        .collect()
}

fn render_comet(cfg: &Config, pal: &Palette, state: &EffectState, ring_len: usize) -> Vec<u32> {
    let width = cfg.width.max(1) as f32;
    let tail = 2.0 + 2.0 * width;
    let head_color = motion_palette_color(cfg, pal, state.phase);
    (0..ring_len)
        .map(|i| {
            let mut behind = state.head_pos - i as f32;
            if behind < 0.0 {
                behind += ring_len as f32;
            }
            let comet = if behind < tail {
                dim(head_color, (1.0 - (behind / tail).powi(2)).max(0.0))
            } else {
                0
            };
            if comet != 0 {
                comet
            } else {
                dim(state.prev_frame.get(i).copied().unwrap_or(0), 0.85)
            }
        })
        .collect()
}

fn render_meteor(cfg: &Config, pal: &Palette, state: &mut EffectState, ring_len: usize) -> Vec<u32> {
    let len_f = ring_len as f32;
    let desired = (1 + (cfg.intensity as usize * 7) / 255).max(1);
    if state.meteors.len() != desired {
        let mut meteors = Vec::with_capacity(desired);
        for i in 0..desired {
            let vel = meteor_velocity(&mut state.rng, cfg.speed);
            let len = state.rng.gen_range(2.0..6.0);
            meteors.push(Meteor {
                pos: i as f32 * len_f / desired as f32,
                vel,
                len,
            });
        }
        state.meteors = meteors;
    }

    let speed = cfg.speed;
    let EffectState { meteors, rng, .. } = state;
    for m in meteors.iter_mut() {
        if rng.gen::<f32>() < 0.015 {
            m.vel = meteor_velocity(rng, speed);
            m.len = rng.gen_range(2.0..6.0);
        }
        m.pos = (m.pos + m.vel).rem_euclid(len_f);
    }

    let intensity = cfg.intensity;
    (0..ring_len)
        .map(|i| {
            let mut best = 0u32;
            for m in meteors.iter() {
                let mut behind = m.pos - i as f32;
                if behind < 0.0 {
                    behind += len_f;
                }
                if behind < m.len {
                    let c = dim(pal.sample(0.0, intensity), 1.0 - behind / m.len);
                    if c > best {
                        best = c;
                    }
                }
            }
            best
        })
        .collect()
}

fn render_clock_spin(cfg: &Config, state: &EffectState, ring_len: usize) -> Vec<u32> {
    let arc_len = 2 * cfg.width.max(1) as usize + 1;
    let offset = (state.phase * ring_len as f32) as usize % ring_len;
    (0..ring_len)
        .map(|i| {
            let rel = (i + ring_len - offset) % ring_len;
            if rel < arc_len {
                cfg.color_a
            } else {
                cfg.color_b
            }
        })
        .collect()
}

fn render_plasma(cfg: &Config, state: &EffectState, ring_len: usize) -> Vec<u32> {
    let t = state.phase * std::f32::consts::TAU;
    let intensity = (cfg.intensity as f32 / 255.0).clamp(0.0, 1.0);
    (0..ring_len)
        .map(|i| {
            let angle = i as f32 / ring_len as f32 * std::f32::consts::TAU;
            let f1 = (angle + t).sin();
            let f2 = (angle * 2.0 - t * 1.3).sin();
            let f3 = (angle * 3.0 + t * 0.7).sin();
            let hue = (f1 + f2 + f3) * 0.5 + 0.5;
            let sparkle = ((angle * 9.0 + t * 4.0).sin() * 0.5 + 0.5) * intensity;
            let value = (0.6 + sparkle).min(1.0);
            hsv_to_rgb(hue, intensity.max(0.15), value)
        })
        .collect()
}

fn render_fire(cfg: &Config, state: &mut EffectState, ring_len: usize) -> Vec<u32> {
    let cool = (50.0 - cfg.intensity as f32 * 36.0 / 255.0).max(0.0);
    let sparks = 1 + cfg.speed as usize / 64;
    let EffectState { fire_heat, rng, .. } = state;

    for h in fire_heat.iter_mut() {
        *h = (*h - rng.gen_range(0.0..=cool)).max(0.0);
    }

    let len = fire_heat.len();
    if len > 0 {
        let snapshot = fire_heat.clone();
        for i in 0..len {
            let prev = snapshot[(i + len - 1) % len];
            let next = snapshot[(i + 1) % len];
            fire_heat[i] = (prev + snapshot[i] + next) / 3.0;
        }
        for _ in 0..sparks {
            let idx = rng.gen_range(0..len);
            fire_heat[idx] = (fire_heat[idx] + rng.gen_range(180.0..=275.0)).min(255.0);
        }
    }

    fire_heat.iter().take(ring_len).map(|&h| fire_color(h)).collect()
}

/// Maps a heat value (0..255, already diffused/cooled) to a color: a red
/// ramp from black, red-to-yellow, then yellow-to-white.
fn fire_color(heat: f32) -> u32 {
    let v = (heat + 65.0).clamp(0.0, 255.0);
    if v < 35.0 {
        dim(0xFF0000, v / 35.0)
    } else if v < 160.0 {
        blend_u32(0xFF0000, 0xFFFF00, (v - 35.0) / 125.0)
    } else {
        blend_u32(0xFFFF00, 0xFFFFFF, (v - 160.0) / 95.0)
    }
}

fn render_palette_cycle(cfg: &Config, pal: &Palette, state: &EffectState, ring_len: usize) -> Vec<u32> {
    (0..ring_len)
        .map(|i| pal.sample(i as f32 / ring_len as f32 + state.phase, cfg.intensity))
        .collect()
}

fn render_palette_chase(cfg: &Config, pal: &Palette, state: &EffectState, ring_len: usize) -> Vec<u32> {
    let width = cfg.width.max(1) as usize;
    let n = pal.count.clamp(1, 4) as usize;
    let offset = (state.phase * ring_len as f32) as usize;
    (0..ring_len)
        .map(|i| {
            let shifted = (i + offset) % ring_len;
            let block = shifted / width;
            let color = pal.stops[block % n];
            let within = shifted % width;
            let edge_dist = within.min(width.saturating_sub(1).saturating_sub(within));
            let soften = (cfg.intensity as f32 / 255.0) * (1.0 - edge_dist as f32 / width as f32);
            dim(color, (1.0 - soften).max(0.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_off_is_all_black() {
        let mut cfg = Config::default();
        cfg.master_off = true;
        let mut state = EffectState::new(10);
        let frame = render_ring(&cfg, Mode::Rainbow, &mut state, 16, 10);
        assert!(frame.iter().all(|&c| c == 0));
    }

    #[test]
    fn solid_mode_is_uniform_color_a() {
        let cfg = Config::default();
        let mut state = EffectState::new(5);
        let frame = render_ring(&cfg, Mode::Solid, &mut state, 16, 5);
        assert!(frame.iter().all(|&c| c == cfg.color_a));
    }

    #[test]
    fn render_ring_matches_requested_length() {
        let cfg = Config::default();
        let mut state = EffectState::new(12);
        for mode in [
            Mode::Rainbow,
            Mode::Fire,
            Mode::Twinkle,
            Mode::Meteor,
            Mode::Plasma,
            Mode::ClockSpin,
            Mode::PaletteChase,
        ] {
            let frame = render_ring(&cfg, mode, &mut state, 16, 12);
            assert_eq!(frame.len(), 12);
        }
    }

    #[test]
    fn zero_length_ring_renders_empty() {
        let cfg = Config::default();
        let mut state = EffectState::new(0);
        let frame = render_ring(&cfg, Mode::Rainbow, &mut state, 16, 0);
        assert!(frame.is_empty());
    }

    #[test]
    fn breathe_never_goes_fully_dark() {
        let cfg = Config::default();
        let mut state = EffectState::new(3);
        for tick in 0..40 {
            let frame = render_ring(&cfg, Mode::Breathe, &mut state, tick * 10, 3);
            assert_ne!(frame[0], 0);
        }
    }

    #[test]
    fn fire_color_thresholds_follow_the_ramp() {
        assert_eq!(fire_color(-65.0), 0x000000);
        assert_eq!(fire_color(255.0 - 65.0), 0xFFFFFF);
    }
}
