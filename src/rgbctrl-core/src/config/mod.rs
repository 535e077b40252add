// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod patch;
pub mod playlist;
pub mod state;

pub use patch::ConfigPatch;
pub use state::{Config, ConfigSnapshot, Mode};
