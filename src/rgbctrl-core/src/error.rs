// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

/// Error taxonomy shared by the config store and the control plane.
///
/// Each variant corresponds to one reply envelope the wire protocol can
/// produce; see `rgbctrl-protocol` for how these map onto JSON.
#[derive(Debug, Clone, Error)]
pub enum CtrlError {
    #[error("bad json: {0}")]
    BadJson(String),
    #[error("missing op")]
    MissingOp,
    #[error("unknown op: {0}")]
    UnknownOp(String),
    #[error("bad key")]
    BadKey,
    #[error("need 4 ints")]
    BadCounts,
    #[error("persistence error: {0}")]
    Persistence(String),
}

pub type CtrlResult<T> = Result<T, CtrlError>;
