// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! HTTP fallback surface. The core never binds its own HTTP listener or
//! router — an externally owned HTTP server is expected to call these
//! pure handlers from its own route table. Mirrors the same four
//! operations the UDP control plane exposes: read the config page, read
//! the config JSON, preview a patch, save a patch, and reset.

use rgbctrl_core::{ConfigPatch, CtrlError, PendingOp, PendingQueue};

use crate::store::ConfigStore;

/// `GET <base>`: a minimal HTML page embedding the current config JSON.
pub fn get_page_html(store: &ConfigStore) -> String {
    let cfg_json = get_config_json(store);
    format!(
        "<!DOCTYPE html><html><head><title>rgbctrl</title></head><body>\
         <script>window.__RGBCTRL_CONFIG__ = {cfg_json};</script></body></html>"
    )
}

/// `GET <base>/api/ledconfig`: the full config JSON. Callers should send
/// this with `Cache-Control: no-store`.
pub fn get_config_json(store: &ConfigStore) -> serde_json::Value {
    serde_json::to_value(store.snapshot()).unwrap_or(serde_json::Value::Null)
}

/// `POST <base>/api/ledpreview`: same body shape as the UDP `preview` op.
pub fn post_preview(pending: &PendingQueue, body: &serde_json::Value) -> Result<(), CtrlError> {
    enqueue_patch(pending, body, false)
}

/// `POST <base>/api/ledsave`: same body shape as the UDP `save` op.
pub fn post_save(pending: &PendingQueue, body: &serde_json::Value) -> Result<(), CtrlError> {
    enqueue_patch(pending, body, true)
}

/// `POST <base>/api/ledreset`: erases the persisted record and applies
/// defaults.
pub fn post_reset(pending: &PendingQueue) {
    pending.push(PendingOp::Reset);
}

fn enqueue_patch(
    pending: &PendingQueue,
    body: &serde_json::Value,
    persist: bool,
) -> Result<(), CtrlError> {
    let patch = ConfigPatch::from_request_body(body).map_err(|e| CtrlError::BadJson(e.to_string()))?;
    pending.push(PendingOp::Cfg { patch, persist });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_preview_enqueues_a_cfg_op() {
        let pending = PendingQueue::new();
        let body = serde_json::json!({ "brightness": 42 });
        post_preview(&pending, &body).unwrap();
        assert!(!pending.is_empty());
    }

    #[test]
    fn post_reset_enqueues_a_reset_op() {
        let pending = PendingQueue::new();
        post_reset(&pending);
        assert!(matches!(pending.pop_highest_priority(), Some(PendingOp::Reset)));
    }

    #[test]
    fn post_save_clamps_out_of_range_mode_instead_of_rejecting() {
        let pending = PendingQueue::new();
        let body = serde_json::json!({ "mode": 999 });
        assert!(post_save(&pending, &body).is_ok());
        match pending.pop_highest_priority() {
            Some(PendingOp::Cfg { patch, persist: true }) => {
                assert_eq!(patch.mode, Some(rgbctrl_core::Mode::Custom));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
