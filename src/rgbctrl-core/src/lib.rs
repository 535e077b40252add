// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod color;
pub mod config;
pub mod effects;
pub mod error;
pub mod pending;
pub mod pixel;
pub mod ring;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use config::{Config, ConfigPatch, ConfigSnapshot, Mode};
pub use error::{CtrlError, CtrlResult};
pub use pending::{PendingOp, PendingQueue};
pub use pixel::{Frame, FrameBuffer, Rgb8};
pub use ring::RingMapper;
