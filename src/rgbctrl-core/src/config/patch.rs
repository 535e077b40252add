// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::{Deserialize, Serialize};

use super::state::{Config, Mode};

/// Partial update to a [`Config`]: every field is optional so a `preview`
/// or `save` request only needs to carry the keys it actually changes.
/// Unknown keys are accepted and ignored rather than rejected, since the
/// same struct parses both the nested `{"cfg": {...}}` shape and a flat
/// top-level body once the caller has unwrapped the envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<[u8; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_a: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_b: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_c: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_d: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette_count: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_on_boot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_cpu: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_fan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<[bool; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_off: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_seq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_loop: Option<bool>,

    /// Catches unrecognized keys instead of failing deserialization; the
    /// control plane logs these at debug level rather than rejecting the
    /// whole request over one typo'd field.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ConfigPatch {
    /// Applies every `Some` field onto `cfg`, then clamps the result.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(v) = self.count {
            cfg.count = v;
        }
        if let Some(v) = self.brightness {
            cfg.brightness = v;
        }
        if let Some(v) = self.mode {
            cfg.mode = v;
        }
        if let Some(v) = self.speed {
            cfg.speed = v;
        }
        if let Some(v) = self.intensity {
            cfg.intensity = v;
        }
        if let Some(v) = self.width {
            cfg.width = v;
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
        if let Some(v) = self.palette_count {
            cfg.palette_count = v;
        }
        if let Some(v) = self.resume_on_boot {
            cfg.resume_on_boot = v;
        }
        if let Some(v) = self.enable_cpu {
            cfg.enable_cpu = v;
        }
        if let Some(v) = self.enable_fan {
            cfg.enable_fan = v;
        }
        if let Some(v) = self.reverse {
            cfg.reverse = v;
        }
        if let Some(v) = self.master_off {
            cfg.master_off = v;
        }
        if let Some(v) = self.custom_seq.clone() {
            cfg.custom_seq = v;
        }
        if let Some(v) = self.custom_loop {
            cfg.custom_loop = v;
        }
        cfg.clamp();
    }

    /// Unwraps the `{"cfg": {...}}` envelope some requests use, falling
    /// back to treating the whole body as a flat patch.
    pub fn from_request_body(body: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let target = body.get("cfg").unwrap_or(body);
        serde_json::from_value(target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_only_present_fields() {
        let mut cfg = Config::default();
        let before_speed = cfg.speed;
        let patch = ConfigPatch {
            brightness: Some(42),
            ..Default::default()
        };
        patch.apply(&mut cfg);
        assert_eq!(cfg.brightness, 42);
        assert_eq!(cfg.speed, before_speed);
    }

    #[test]
    fn accepts_nested_cfg_envelope() {
        let body = serde_json::json!({ "cfg": { "brightness": 7 } });
        let patch = ConfigPatch::from_request_body(&body).unwrap();
        assert_eq!(patch.brightness, Some(7));
    }

    #[test]
    fn accepts_flat_top_level_body() {
        let body = serde_json::json!({ "brightness": 7, "maskedFromFuture": true });
        let patch = ConfigPatch::from_request_body(&body).unwrap();
        assert_eq!(patch.brightness, Some(7));
        assert!(patch.extra.contains_key("maskedFromFuture"));
    }

    #[test]
    fn apply_clamps_after_merge() {
        let mut cfg = Config::default();
        let patch = ConfigPatch {
            palette_count: Some(99),
            ..Default::default()
        };
        patch.apply(&mut cfg);
        assert_eq!(cfg.palette_count, 4);
    }
}
