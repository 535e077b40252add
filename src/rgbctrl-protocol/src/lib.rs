// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Wire-level JSON protocol for the UDP control plane: packet
//! classification, request/reply DTOs, and pre-shared-key auth.

pub mod auth;
pub mod codec;
pub mod types;

pub use auth::{NoAuthValidator, PskValidator, SharedKeyValidator};
pub use codec::{classify, Packet, DISCOVER_PROBE};
pub use types::{DiscoverReply, RawRequest, ReplyEnvelope};
