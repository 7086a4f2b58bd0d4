use std::time::Instant;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FramingError;
use crate::escape;
use crate::frame::Frame;
use crate::parser::StompParser;
use crate::spec::{self, Version};

/// Items produced or consumed by the codec.
///
/// A `StompItem` is either a frame or a heart-beat marker, so a heart-beat
/// can never be mistaken for an empty frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StompItem {
    Frame(Frame),
    Heartbeat,
}

/// Serialize a frame into `dst` for the given protocol version.
///
/// Layout is `command LF (name ":" value LF)* LF body NUL`, with no
/// trailing EOL. Header names and values are escaped per version unless the
/// command is escape-excluded (CONNECT, STOMP, CONNECTED, and everything
/// under 1.0). Duplicate header names are written in insertion order. The
/// serializer never invents headers; `content-length` is the SEND
/// constructor's business, which is what lets encode/parse round-trip
/// exactly.
pub fn encode_frame(frame: &Frame, version: Version, dst: &mut BytesMut) {
    dst.extend_from_slice(frame.command.as_bytes());
    dst.put_u8(b'\n');

    let excluded = spec::escape_excluded(version, &frame.command);
    for (name, value) in &frame.headers {
        if excluded {
            dst.extend_from_slice(name.as_bytes());
            dst.put_u8(b':');
            dst.extend_from_slice(value.as_bytes());
        } else {
            dst.extend_from_slice(escape::escape(version, name).as_bytes());
            dst.put_u8(b':');
            dst.extend_from_slice(escape::escape(version, value).as_bytes());
        }
        dst.put_u8(b'\n');
    }

    dst.put_u8(b'\n');
    dst.extend_from_slice(&frame.body);
    dst.put_u8(0);
}

/// Convenience wrapper around [`encode_frame`] returning an owned buffer.
pub fn encode_to_vec(frame: &Frame, version: Version) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_frame(frame, version, &mut buf);
    buf.to_vec()
}

/// `StompCodec` implements `tokio_util::codec::{Decoder, Encoder}` for the
/// STOMP wire protocol, so it drops straight into a `Framed` transport.
/// Decoding is delegated to the incremental [`StompParser`]; the codec
/// itself holds no extra buffering.
pub struct StompCodec {
    parser: StompParser,
}

impl StompCodec {
    pub fn new(version: Version) -> Self {
        Self {
            parser: StompParser::new(version),
        }
    }

    pub fn version(&self) -> Version {
        self.parser.version()
    }

    /// Switch protocol tables after version negotiation. Affects both
    /// directions.
    pub fn set_version(&mut self, version: Version) {
        self.parser.set_version(version);
    }

    /// When the last inbound byte was seen; hosts poll this to enforce the
    /// incoming heart-beat interval.
    pub fn last_received_at(&self) -> Option<Instant> {
        self.parser.last_received_at()
    }
}

impl Default for StompCodec {
    fn default() -> Self {
        Self::new(Version::V1_2)
    }
}

impl Decoder for StompCodec {
    type Item = StompItem;
    type Error = FramingError;

    /// Decode one item out of `src`.
    ///
    /// All available bytes are moved into the internal parser, then a
    /// single completed item (if any) is returned; call again to fetch the
    /// rest. `Ok(None)` means more bytes are required. A framing error is
    /// terminal: the parser stays poisoned and every later call fails with
    /// the same error.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.parser.pop() {
            return Ok(Some(item));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let chunk = src.split_to(src.len());
        self.parser.feed(&chunk)?;
        Ok(self.parser.pop())
    }
}

impl Encoder<StompItem> for StompCodec {
    type Error = FramingError;

    fn encode(&mut self, item: StompItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            StompItem::Heartbeat => dst.put_u8(b'\n'),
            StompItem::Frame(frame) => encode_frame(&frame, self.version(), dst),
        }
        Ok(())
    }
}
