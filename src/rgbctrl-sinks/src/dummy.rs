// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! In-memory transmit backend for development and tests. Records every
//! frame it is asked to show instead of touching any hardware.

use std::future::Future;
use std::pin::Pin;

use rgbctrl_core::{DynResult, Frame};

use crate::Transmit;

pub struct RecordingSink {
    pub frames: Vec<Frame>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink { frames: Vec::new() }
    }

    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmit for RecordingSink {
    fn show<'a>(
        &'a mut self,
        frame: &'a Frame,
    ) -> Pin<Box<dyn Future<Output = DynResult<()>> + Send + 'a>> {
        self.frames.push(frame.clone());
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_every_shown_frame() {
        let mut sink = RecordingSink::new();
        sink.show(&Frame::black()).await.unwrap();
        sink.show(&Frame::black()).await.unwrap();
        assert_eq!(sink.frames.len(), 2);
    }
}
