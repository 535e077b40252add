// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Transport DTOs for the UDP control-plane JSON protocol.

use serde::{Deserialize, Serialize};

use rgbctrl_core::ConfigSnapshot;

/// Presence broadcast and reply to a `discover` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverReply {
    pub id: String,
    pub ip: String,
    pub name: String,
    pub build_version: String,
    pub ring_len: u32,
}

/// One incoming request, still tagged by its raw `op` string and an
/// unparsed body. `op` is optional at this layer (rather than failing
/// deserialization outright) so the control plane can reply with the
/// specific "missing op" error the wire protocol documents instead of a
/// generic parse failure. The control plane resolves `op` to behavior and
/// only then asks `rgbctrl-core` to parse the body into a [`ConfigPatch`],
/// mirroring how the wire accepts both a nested `cfg` object and a flat
/// top-level body for the same request.
///
/// [`ConfigPatch`]: rgbctrl_core::ConfigPatch
#[derive(Debug, Clone, Deserialize)]
pub struct RawRequest {
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default, rename = "key")]
    pub auth: Option<String>,
    #[serde(flatten)]
    pub body: serde_json::Value,
}

/// Reply envelope for every JSON op. `data` carries the op-specific
/// payload (a [`ConfigSnapshot`] for `get`/`preview`/`save`/`reset`, a
/// [`DiscoverReply`] for `discover`) serialized ahead of time so this type
/// stays payload-agnostic.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyEnvelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplyEnvelope {
    pub fn ok_snapshot(snapshot: &ConfigSnapshot) -> Self {
        ReplyEnvelope {
            ok: true,
            data: serde_json::to_value(snapshot).ok(),
            error: None,
        }
    }

    pub fn ok_discover(reply: &DiscoverReply) -> Self {
        ReplyEnvelope {
            ok: true,
            data: serde_json::to_value(reply).ok(),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        ReplyEnvelope {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_request_parses_flat_body() {
        let raw: RawRequest =
            serde_json::from_str(r#"{"op":"preview","brightness":5}"#).unwrap();
        assert_eq!(raw.op.as_deref(), Some("preview"));
        assert_eq!(raw.body["brightness"], 5);
    }

    #[test]
    fn raw_request_parses_nested_cfg_body() {
        let raw: RawRequest =
            serde_json::from_str(r#"{"op":"save","cfg":{"brightness":5}}"#).unwrap();
        assert_eq!(raw.body["cfg"]["brightness"], 5);
    }

    #[test]
    fn raw_request_reads_key_field_into_auth() {
        let raw: RawRequest =
            serde_json::from_str(r#"{"op":"save","key":"secret"}"#).unwrap();
        assert_eq!(raw.auth.as_deref(), Some("secret"));
    }

    #[test]
    fn raw_request_missing_op_parses_as_none() {
        let raw: RawRequest = serde_json::from_str(r#"{"brightness":5}"#).unwrap();
        assert!(raw.op.is_none());
    }

    #[test]
    fn err_reply_omits_data() {
        let reply = ReplyEnvelope::err("bad key");
        let json = serde_json::to_value(&reply).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["error"], "bad key");
    }
}
