// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Serial transmit backend, speaking the Adalight frame protocol: a
//! `"Ada"` magic, big-endian pixel count minus one, a checksum byte, then
//! the raw RGB triples for every physical pixel across all four channels
//! in channel order.

use std::future::Future;
use std::pin::Pin;

use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use rgbctrl_core::pixel::{CHANNELS, MAX_PER_CHANNEL};
use rgbctrl_core::{DynResult, Frame};

use crate::{SinkAccess, Transmit};

const MAGIC: &[u8; 3] = b"Ada";
const TOTAL_PIXELS: usize = CHANNELS * MAX_PER_CHANNEL;

pub struct SerialSink {
    port: SerialStream,
}

impl SerialSink {
    pub fn open(path: &str, baud: u32) -> DynResult<Self> {
        let port = tokio_serial::new(path, baud).open_native_async()?;
        Ok(SerialSink { port })
    }

    fn encode(frame: &Frame) -> Vec<u8> {
        let count_minus_one = (TOTAL_PIXELS - 1) as u16;
        let hi = (count_minus_one >> 8) as u8;
        let lo = (count_minus_one & 0xFF) as u8;
        let checksum = hi ^ lo ^ 0x55;

        let mut buf = Vec::with_capacity(6 + TOTAL_PIXELS * 3);
        buf.extend_from_slice(MAGIC);
        buf.push(hi);
        buf.push(lo);
        buf.push(checksum);
        for channel in frame.channels.iter() {
            for pixel in channel.iter() {
                buf.push(pixel.r);
                buf.push(pixel.g);
                buf.push(pixel.b);
            }
        }
        buf
    }
}

impl Transmit for SerialSink {
    fn show<'a>(
        &'a mut self,
        frame: &'a Frame,
    ) -> Pin<Box<dyn Future<Output = DynResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let buf = Self::encode(frame);
            self.port.write_all(&buf).await?;
            self.port.flush().await?;
            Ok(())
        })
    }
}

pub(crate) fn serial_factory(access: SinkAccess) -> DynResult<Box<dyn Transmit>> {
    match access {
        SinkAccess::Serial { path, baud } => Ok(Box::new(SerialSink::open(&path, baud)?)),
        SinkAccess::Dummy => Err("serial backend requires a Serial access descriptor".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_encodes_pixel_count_minus_one() {
        let frame = Frame::black();
        let buf = SerialSink::encode(&frame);
        assert_eq!(&buf[0..3], MAGIC);
        let count_minus_one = ((buf[3] as u16) << 8) | buf[4] as u16;
        assert_eq!(count_minus_one as usize, TOTAL_PIXELS - 1);
        assert_eq!(buf[5], buf[3] ^ buf[4] ^ 0x55);
    }

    #[test]
    fn payload_length_matches_total_pixels() {
        let frame = Frame::black();
        let buf = SerialSink::encode(&frame);
        assert_eq!(buf.len(), 6 + TOTAL_PIXELS * 3);
    }
}
