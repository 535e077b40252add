// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Packet classification for the UDP control plane: a datagram is either a
//! JSON op envelope or a legacy plain-text discovery probe.

use crate::types::RawRequest;

/// The plain-text probe older/minimal clients send to find a controller
/// without speaking JSON at all.
pub const DISCOVER_PROBE: &str = "DISCOVER_RGBCTRL";

#[derive(Debug, Clone)]
pub enum Packet {
    Json(RawRequest),
    PlainDiscover,
    Invalid(String),
}

/// Classifies a raw datagram. JSON is recognized by a leading `{` (after
/// trimming whitespace); anything else falls back to the plain-text
/// discovery probe, and anything that is neither is reported as invalid so
/// the caller can decide whether to log or silently drop it.
pub fn classify(bytes: &[u8]) -> Packet {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => return Packet::Invalid("non-utf8 datagram".to_string()),
    };
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        match serde_json::from_str::<RawRequest>(trimmed) {
            Ok(req) => Packet::Json(req),
            Err(e) => Packet::Invalid(format!("bad json: {e}")),
        }
    } else if trimmed == DISCOVER_PROBE {
        Packet::PlainDiscover
    } else {
        Packet::Invalid(format!("unrecognized datagram: {trimmed:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_json_envelope() {
        match classify(br#"{"op":"get"}"#) {
            Packet::Json(req) => assert_eq!(req.op, "get"),
            other => panic!("expected Json, got {other:?}"),
        }
    }

    #[test]
    fn classifies_plain_discover_probe() {
        assert!(matches!(
            classify(DISCOVER_PROBE.as_bytes()),
            Packet::PlainDiscover
        ));
    }

    #[test]
    fn trims_whitespace_before_classifying() {
        assert!(matches!(
            classify(b"  DISCOVER_RGBCTRL\r\n"),
            Packet::PlainDiscover
        ));
    }

    #[test]
    fn unrecognized_text_is_invalid() {
        assert!(matches!(classify(b"hello"), Packet::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_invalid() {
        assert!(matches!(classify(b"{not json"), Packet::Invalid(_)));
    }
}
