// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::{Deserialize, Serialize};

use crate::pixel::{CHANNELS, MAX_PER_CHANNEL};

pub const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COPYRIGHT: &str = "rgbctrl contributors";

/// Animation mode, wire-encoded as a plain `u8` (0..=14) rather than a
/// string so the JSON stays compact on the constrained link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Solid = 0,
    Breathe = 1,
    ColorWipe = 2,
    Larson = 3,
    Rainbow = 4,
    TheaterChase = 5,
    Twinkle = 6,
    Comet = 7,
    Meteor = 8,
    ClockSpin = 9,
    Plasma = 10,
    Fire = 11,
    PaletteCycle = 12,
    PaletteChase = 13,
    Custom = 14,
}

impl Mode {
    pub const MAX: u8 = 14;

    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Mode::Solid,
            1 => Mode::Breathe,
            2 => Mode::ColorWipe,
            3 => Mode::Larson,
            4 => Mode::Rainbow,
            5 => Mode::TheaterChase,
            6 => Mode::Twinkle,
            7 => Mode::Comet,
            8 => Mode::Meteor,
            9 => Mode::ClockSpin,
            10 => Mode::Plasma,
            11 => Mode::Fire,
            12 => Mode::PaletteCycle,
            13 => Mode::PaletteChase,
            14 => Mode::Custom,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl Serialize for Mode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Mode {
    /// Clamps an out-of-range `mode` into `0..=MAX` instead of rejecting
    /// the request, matching how every other field in [`Config`] is
    /// handled on parse.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        Ok(Mode::from_u8(raw.min(Mode::MAX)).expect("clamped value is always in range"))
    }
}

/// Persistent configuration record, the same shape that is written to and
/// read back from the config store. Field names mirror the wire protocol
/// via `camelCase` renaming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub count: [u8; CHANNELS],
    pub brightness: u8,
    pub mode: Mode,
    pub speed: u8,
    pub intensity: u8,
    pub width: u8,
    pub color_a: u32,
    pub color_b: u32,
    pub color_c: u32,
    pub color_d: u32,
    pub palette_count: u8,
    pub resume_on_boot: bool,
    pub enable_cpu: bool,
    pub enable_fan: bool,
    pub reverse: [bool; CHANNELS],
    pub master_off: bool,
    pub custom_seq: String,
    pub custom_loop: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            count: [50, 50, 50, 50],
            brightness: 180,
            mode: Mode::Rainbow,
            speed: 128,
            intensity: 128,
            width: 4,
            color_a: 0xFF0000,
            color_b: 0xFFBF00,
            color_c: 0x00FF00,
            color_d: 0x0000FF,
            palette_count: 2,
            resume_on_boot: true,
            enable_cpu: true,
            enable_fan: true,
            reverse: [true, false, false, true],
            master_off: false,
            custom_seq: String::new(),
            custom_loop: true,
        }
    }
}

impl Config {
    /// Clamps every field to its valid range in place. Called after
    /// deserializing from either the wire or the config store, so neither
    /// path can hand the effect engine an out-of-range value.
    pub fn clamp(&mut self) {
        for c in self.count.iter_mut() {
            *c = (*c).min(MAX_PER_CHANNEL as u8);
        }
        self.brightness = self.brightness.max(1);
        self.palette_count = self.palette_count.clamp(1, 4);
        self.width = self.width.max(1);
    }

    pub fn ring_len(&self) -> u32 {
        self.count.iter().map(|&c| c as u32).sum()
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            cfg: self.clone(),
            ring_len: self.ring_len(),
            build_version: BUILD_VERSION.to_string(),
            copyright: COPYRIGHT.to_string(),
            in_preview: false,
        }
    }
}

/// Everything [`Config`] has, plus the derived, display-only fields the
/// full `toJson()` response carries but the persisted record does not.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(flatten)]
    pub cfg: Config,
    pub ring_len: u32,
    pub build_version: String,
    pub copyright: String,
    pub in_preview: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_u8() {
        for raw in 0..=Mode::MAX {
            let m = Mode::from_u8(raw).expect("in range");
            assert_eq!(m.as_u8(), raw);
        }
        assert!(Mode::from_u8(Mode::MAX + 1).is_none());
    }

    #[test]
    fn mode_serializes_as_bare_integer() {
        let json = serde_json::to_string(&Mode::Comet).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn mode_deserialize_clamps_out_of_range_instead_of_rejecting() {
        let m: Mode = serde_json::from_str("999").unwrap();
        assert_eq!(m, Mode::Custom);
    }

    #[test]
    fn clamp_caps_counts_and_palette() {
        let mut cfg = Config {
            count: [200, 0, 0, 0],
            palette_count: 9,
            width: 0,
            brightness: 0,
            ..Config::default()
        };
        cfg.clamp();
        assert_eq!(cfg.count[0], MAX_PER_CHANNEL as u8);
        assert_eq!(cfg.palette_count, 4);
        assert_eq!(cfg.width, 1);
        assert_eq!(cfg.brightness, 1);
    }

    #[test]
    fn config_round_trips_camel_case_json() {
        let cfg = Config::default();
        let json = serde_json::to_value(&cfg).unwrap();
        assert!(json.get("colorA").is_some());
        assert!(json.get("paletteCount").is_some());
        assert!(json.get("resumeOnBoot").is_some());
        assert!(json.get("customSeq").is_some());
        let back: Config = serde_json::from_value(json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn snapshot_adds_derived_fields_only() {
        let cfg = Config::default();
        let snap = cfg.snapshot();
        let json = serde_json::to_value(&snap).unwrap();
        assert!(json.get("ringLen").is_some());
        assert!(json.get("buildVersion").is_some());
        assert!(json.get("copyright").is_some());
        assert!(json.get("colorA").is_some());
    }
}
