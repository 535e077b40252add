// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Config Store: owns the one authoritative [`Config`] record, applies
//! patches under a single lock, and persists the subset that survives a
//! restart to a pickledb file. Render and listener code only ever reads
//! through `current()`/`snapshot()`; every mutation funnels through here.

use std::path::Path;
use std::sync::Mutex;

use pickledb::{PickleDb, PickleDbDumpPolicy, SerializationMethod};
use tracing::warn;

use rgbctrl_core::{Config, ConfigPatch, ConfigSnapshot};

const DB_KEY: &str = "config";

struct State {
    cfg: Config,
    in_preview: bool,
    db: PickleDb,
}

pub struct ConfigStore {
    state: Mutex<State>,
}

impl ConfigStore {
    /// Opens (or creates) the pickledb file at `path`, overlaying any
    /// persisted record onto the compiled-in defaults.
    pub fn load(path: &Path) -> Self {
        let db = PickleDb::load(
            path,
            PickleDbDumpPolicy::AutoDump,
            SerializationMethod::Json,
        )
        .unwrap_or_else(|_| {
            PickleDb::new(path, PickleDbDumpPolicy::AutoDump, SerializationMethod::Json)
        });

        let mut cfg = db.get::<Config>(DB_KEY).unwrap_or_default();
        cfg.clamp();

        ConfigStore {
            state: Mutex::new(State {
                cfg,
                in_preview: false,
                db,
            }),
        }
    }

    pub fn current(&self) -> Config {
        self.state.lock().expect("config store mutex poisoned").cfg.clone()
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        let state = self.state.lock().expect("config store mutex poisoned");
        let mut snap = state.cfg.snapshot();
        snap.in_preview = state.in_preview;
        snap
    }

    /// Applies a patch to the live record without persisting it, and
    /// marks the record as an unsaved preview.
    pub fn apply_preview(&self, patch: &ConfigPatch) -> Config {
        let mut state = self.state.lock().expect("config store mutex poisoned");
        patch.apply(&mut state.cfg);
        state.in_preview = true;
        state.cfg.clone()
    }

    /// Applies a patch and persists the record. A write failure is logged
    /// but not surfaced to the caller: the in-memory apply has already
    /// succeeded by the time persistence is attempted, and the control
    /// plane reports success on that basis.
    pub fn apply_save(&self, patch: &ConfigPatch) -> Config {
        let mut state = self.state.lock().expect("config store mutex poisoned");
        patch.apply(&mut state.cfg);
        state.in_preview = false;
        if let Err(e) = state.db.set(DB_KEY, &state.cfg) {
            warn!("failed to persist config: {}", e);
        }
        state.cfg.clone()
    }

    /// Erases the persisted record and restores compiled-in defaults.
    pub fn reset(&self) -> Config {
        let mut state = self.state.lock().expect("config store mutex poisoned");
        if let Err(e) = state.db.rem(DB_KEY) {
            warn!("failed to erase persisted config: {}", e);
        }
        state.cfg = Config::default();
        state.in_preview = false;
        state.cfg.clone()
    }

    /// Applies only the per-channel pixel counts, used by `setCounts`.
    pub fn set_counts(&self, counts: [u8; 4]) -> Config {
        let mut state = self.state.lock().expect("config store mutex poisoned");
        state.cfg.count = counts;
        state.cfg.clamp();
        state.cfg.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_path(label: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "rgbctrl-store-test-{}-{}.db",
            label,
            std::process::id()
        ))
    }

    #[test]
    fn round_trips_a_save_across_reload() {
        let path = temp_db_path("roundtrip");
        {
            let store = ConfigStore::load(&path);
            let patch: ConfigPatch =
                serde_json::from_value(serde_json::json!({"brightness": 77})).unwrap();
            store.apply_save(&patch);
        }
        let reloaded = ConfigStore::load(&path);
        assert_eq!(reloaded.current().brightness, 77);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn preview_does_not_persist() {
        let path = temp_db_path("preview");
        {
            let store = ConfigStore::load(&path);
            let patch: ConfigPatch =
                serde_json::from_value(serde_json::json!({"brightness": 5})).unwrap();
            store.apply_preview(&patch);
            assert!(store.snapshot().in_preview);
        }
        let reloaded = ConfigStore::load(&path);
        assert_ne!(reloaded.current().brightness, 5);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn reset_restores_defaults() {
        let path = temp_db_path("reset");
        let store = ConfigStore::load(&path);
        let patch: ConfigPatch =
            serde_json::from_value(serde_json::json!({"brightness": 5})).unwrap();
        store.apply_save(&patch);
        store.reset();
        assert_eq!(store.current().brightness, Config::default().brightness);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn set_counts_clamps_out_of_range_values() {
        let path = temp_db_path("counts");
        let store = ConfigStore::load(&path);
        let cfg = store.set_counts([100, 0, 51, 50]);
        assert_eq!(cfg.count, [50, 0, 50, 50]);
        std::fs::remove_file(&path).ok();
    }
}
