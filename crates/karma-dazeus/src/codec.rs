//! DaZeus wire codec.
//!
//! Every frame is the decimal byte length of a JSON document followed
//! directly by the document: `30{"do":"subscribe","params":[]}`. Whitespace
//! between frames is skipped.

use bytes::{Buf, BufMut, BytesMut};
use karma_core::error::{KarmaError, KarmaResult};
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

/// Largest JSON document we accept from the core.
pub const MAX_FRAME_LENGTH: usize = 1024 * 1024;

/// Length-prefixed JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaZeusCodec;

impl DaZeusCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for DaZeusCodec {
    type Item = Value;
    type Error = KarmaError;

    fn decode(&mut self, src: &mut BytesMut) -> KarmaResult<Option<Value>> {
        let skip = src
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        src.advance(skip);

        let digits = src.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == src.len() {
            // Length prefix may continue in the next read.
            return Ok(None);
        }
        if digits == 0 {
            return Err(KarmaError::protocol(format!(
                "expected frame length, found byte 0x{:02x}",
                src[0]
            )));
        }

        let length: usize = std::str::from_utf8(&src[..digits])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| KarmaError::protocol("frame length out of range"))?;
        if length > MAX_FRAME_LENGTH {
            return Err(KarmaError::protocol(format!(
                "frame of {} bytes exceeds limit of {}",
                length, MAX_FRAME_LENGTH
            )));
        }

        if src.len() < digits + length {
            src.reserve(digits + length - src.len());
            return Ok(None);
        }

        src.advance(digits);
        let body = src.split_to(length);
        let value = serde_json::from_slice(&body)
            .map_err(|e| KarmaError::protocol(format!("invalid JSON frame: {}", e)))?;
        Ok(Some(value))
    }
}

impl Encoder<Value> for DaZeusCodec {
    type Error = KarmaError;

    fn encode(&mut self, item: Value, dst: &mut BytesMut) -> KarmaResult<()> {
        let body = serde_json::to_vec(&item)?;
        let length = body.len().to_string();
        dst.reserve(length.len() + body.len());
        dst.put_slice(length.as_bytes());
        dst.put_slice(&body);
        Ok(())
    }
}
