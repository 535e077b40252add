// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Playlist Engine: advances through the steps encoded in `customSeq` when
//! `mode == Custom`. Driven by caller-supplied timestamps rather than
//! reading the clock itself so it stays deterministic under test.

use serde::{Deserialize, Serialize};

use super::state::{Config, Mode};

/// One entry in a parsed `customSeq`. The override fields apply to a
/// scratch copy of the base config while this step is active; the
/// persisted record itself is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStep {
    pub mode: Mode,
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_a: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_b: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_c: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_d: Option<u32>,
}

impl PlaylistStep {
    /// Applies this step's overrides onto a clone of `base` and clamps the
    /// result; `base` itself is left untouched.
    pub fn scratch_config(&self, base: &Config) -> Config {
        let mut cfg = base.clone();
        if let Some(v) = self.speed {
            cfg.speed = v;
        }
        if let Some(v) = self.intensity {
            cfg.intensity = v;
        }
        if let Some(v) = self.width {
            cfg.width = v;
        }
        if let Some(v) = self.palette_count {
            cfg.palette_count = v;
        }
        if let Some(v) = self.color_a {
            cfg.color_a = v;
        }
        if let Some(v) = self.color_b {
            cfg.color_b = v;
        }
        if let Some(v) = self.color_c {
            cfg.color_c = v;
        }
        if let Some(v) = self.color_d {
            cfg.color_d = v;
        }
        cfg.clamp();
        cfg
    }
}

/// Runtime cursor over a parsed playlist. Holds no reference to the
/// `Config` it was built from; the caller re-derives the active `Mode`
/// from `current()` each frame.
#[derive(Debug, Clone, Default)]
pub struct PlaylistEngine {
    steps: Vec<PlaylistStep>,
    index: usize,
    step_started_ms: u64,
    finished: bool,
}

impl PlaylistEngine {
    /// Parses `customSeq` (a JSON array of `{mode, duration, ...overrides}`
    /// objects). An empty or unparsable sequence yields an engine with no
    /// steps, which `current()` reports as `None`. A step naming `Custom`
    /// as its own mode is coerced to `Solid`, since a playlist step cannot
    /// recurse into the playlist engine.
    pub fn parse(custom_seq: &str, now_ms: u64) -> Self {
        let mut steps: Vec<PlaylistStep> = serde_json::from_str(custom_seq).unwrap_or_default();
        for step in steps.iter_mut() {
            if step.mode == Mode::Custom {
                step.mode = Mode::Solid;
            }
        }
        PlaylistEngine {
            steps,
            index: 0,
            step_started_ms: now_ms,
            finished: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn current(&self) -> Option<PlaylistStep> {
        if self.finished {
            return None;
        }
        self.steps.get(self.index).copied()
    }

    /// Advances the cursor if the current step's duration has elapsed.
    /// When `loop_enabled` is false, the cursor stops (and `current()`
    /// returns `None`) after the last step finishes instead of wrapping.
    pub fn tick(&mut self, now_ms: u64, loop_enabled: bool) {
        if self.steps.is_empty() || self.finished {
            return;
        }
        loop {
            let Some(step) = self.steps.get(self.index) else {
                self.finished = true;
                return;
            };
            let elapsed = now_ms.saturating_sub(self.step_started_ms);
            if elapsed < step.duration as u64 {
                return;
            }
            self.step_started_ms += step.duration as u64;
            self.index += 1;
            if self.index >= self.steps.len() {
                if loop_enabled {
                    self.index = 0;
                } else {
                    self.finished = true;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> String {
        serde_json::json!([
            { "mode": 0, "duration": 100 },
            { "mode": 4, "duration": 100 },
        ])
        .to_string()
    }

    #[test]
    fn empty_sequence_has_no_current_step() {
        let engine = PlaylistEngine::parse("", 0);
        assert!(engine.is_empty());
        assert_eq!(engine.current(), None);
    }

    #[test]
    fn advances_to_next_step_after_duration() {
        let mut engine = PlaylistEngine::parse(&seq(), 0);
        assert_eq!(engine.current().unwrap().mode, Mode::Solid);
        engine.tick(150, true);
        assert_eq!(engine.current().unwrap().mode, Mode::Rainbow);
    }

    #[test]
    fn loops_back_to_first_step_when_enabled() {
        let mut engine = PlaylistEngine::parse(&seq(), 0);
        engine.tick(250, true);
        assert_eq!(engine.current().unwrap().mode, Mode::Solid);
    }

    #[test]
    fn stops_after_last_step_when_loop_disabled() {
        let mut engine = PlaylistEngine::parse(&seq(), 0);
        engine.tick(250, false);
        assert_eq!(engine.current(), None);
    }

    #[test]
    fn malformed_sequence_is_treated_as_empty() {
        let engine = PlaylistEngine::parse("not json", 0);
        assert!(engine.is_empty());
    }

    #[test]
    fn custom_mode_inside_a_step_is_coerced_to_solid() {
        let seq = serde_json::json!([{ "mode": 14, "duration": 100 }]).to_string();
        let engine = PlaylistEngine::parse(&seq, 0);
        assert_eq!(engine.current().unwrap().mode, Mode::Solid);
    }

    #[test]
    fn scratch_config_applies_overrides_without_touching_base() {
        let base = Config::default();
        let step: PlaylistStep =
            serde_json::from_value(serde_json::json!({ "mode": 0, "duration": 100, "colorA": 255 }))
                .unwrap();
        let scratch = step.scratch_config(&base);
        assert_eq!(scratch.color_a, 255);
        assert_eq!(base.color_a, Config::default().color_a);
    }
}
