// ── Stream framing ──
//
// OVSDB speaks JSON-RPC over a raw byte stream with no length prefix or
// delimiter: messages are JSON texts written back to back. The decoder
// parses one complete value at a time and leaves trailing partial input
// in the buffer until more bytes arrive.

use bytes::{Buf, BytesMut};
use serde_json::Value as Json;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::Error;

/// Refuse to buffer a single message larger than this.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Codec for a stream of concatenated JSON values.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Decoder for JsonCodec {
    type Item = Json;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Json>, Error> {
        let Some(start) = src.iter().position(|b| !b.is_ascii_whitespace()) else {
            src.clear();
            return Ok(None);
        };
        src.advance(start);

        let mut values = serde_json::Deserializer::from_slice(src).into_iter::<Json>();
        match values.next() {
            Some(Ok(value)) => {
                let consumed = values.byte_offset();
                src.advance(consumed);
                Ok(Some(value))
            }
            Some(Err(e)) if e.is_eof() => {
                if src.len() > MAX_FRAME_BYTES {
                    return Err(Error::Protocol(format!(
                        "message exceeds {MAX_FRAME_BYTES} bytes"
                    )));
                }
                Ok(None)
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }
}

impl Encoder<Json> for JsonCodec {
    type Error = Error;

    fn encode(&mut self, item: Json, dst: &mut BytesMut) -> Result<(), Error> {
        let encoded = serde_json::to_vec(&item)?;
        dst.reserve(encoded.len());
        dst.extend_from_slice(&encoded);
        Ok(())
    }
}
