use crate::codec::body::chunked_encoder::ChunkedEncoder;
use crate::codec::body::length_encoder::LengthEncoder;
use crate::protocol::{PayloadItem, PayloadSize, SendError};
use bytes::{Buf, BytesMut};

use tokio_util::codec::Encoder;
use tracing::warn;

/// Body encoder selected by the response framing. It is finished once the
/// end of body item went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
    eof: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Length(LengthEncoder),
    Chunked(ChunkedEncoder),
    NoBody,
}

impl PayloadEncoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody, eof: false }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new()), eof: false }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)), eof: false }
    }

    pub fn is_finish(&self) -> bool {
        self.eof
    }
}

impl From<PayloadSize> for PayloadEncoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(size) => Self::fix_length(size),
            PayloadSize::Chunked => Self::chunked(),
            PayloadSize::Empty => Self::empty(),
        }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let is_eof = item.is_eof();
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(item, dst)?,
            Kind::Chunked(encoder) => encoder.encode(item, dst)?,
            Kind::NoBody => {
                if let PayloadItem::Chunk(bytes) = &item {
                    if bytes.has_remaining() {
                        warn!(size = bytes.remaining(), "drop data of a response without body");
                    }
                }
            }
        }

        if is_eof {
            self.eof = true;
        }
        Ok(())
    }
}
