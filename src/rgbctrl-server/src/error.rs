// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Binary-level error alias. The individual crates (`rgbctrl-core`,
//! `rgbctrl-protocol`, `rgbctrl-sinks`) define their own typed errors
//! where a caller might want to match on a variant; `main` and the task
//! wiring just need a boxed error it can bubble up to the process exit.

pub use rgbctrl_core::DynResult;
