//! Encoder for bodies framed by `content-length`.

use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

/// Copies exactly `length` bytes. Data past the declared length is dropped,
/// an end of body before it is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    length: u64,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { length }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(bytes) => {
                let size = bytes.remaining() as u64;
                if size == 0 {
                    return Ok(());
                }

                if size > self.length {
                    warn!(size, remaining = self.length, "body longer than content-length, truncated");
                }

                let mut limited = bytes.take(self.length.min(size) as usize);
                dst.reserve(limited.remaining());
                while limited.has_remaining() {
                    let chunk = limited.chunk();
                    let len = chunk.len();
                    dst.extend_from_slice(chunk);
                    limited.advance(len);
                }
                self.length -= self.length.min(size);
                Ok(())
            }
            PayloadItem::Eof if self.length > 0 => {
                Err(SendError::invalid_body(format!("body ended with {} bytes left of content-length", self.length)))
            }
            PayloadItem::Eof => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::body::LengthDecoder;
    use bytes::Bytes;
    use tokio_util::codec::Decoder;

    #[test]
    fn decodes_back() {
        let data = Bytes::from((0..20_000u32).map(|i| (i % 251) as u8).collect::<Vec<_>>());
        let mut encoder = LengthEncoder::new(data.len() as u64);
        let mut dst = BytesMut::new();

        for piece in data.chunks(4096) {
            encoder.encode(PayloadItem::Chunk(Bytes::copy_from_slice(piece)), &mut dst).unwrap();
        }
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
        dst.extend_from_slice(b"GET / HTTP/1.1\r\n");

        let mut decoder = LengthDecoder::new(data.len() as u64);
        let mut decoded = vec![];
        while let Some(PayloadItem::Chunk(bytes)) = decoder.decode(&mut dst).unwrap() {
            decoded.extend_from_slice(&bytes);
        }
        assert_eq!(decoded, data);
        assert_eq!(&dst[..], b"GET / HTTP/1.1\r\n");
    }

    #[test]
    fn writes_exact_length() {
        let mut encoder = LengthEncoder::new(5);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hel")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"lo")), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"hello");
    }

    #[test]
    fn truncates_excess() {
        let mut encoder = LengthEncoder::new(3);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hello")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"more")), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"hel");
    }

    #[test]
    fn short_body_fails() {
        let mut encoder = LengthEncoder::new(10);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hello")), &mut dst).unwrap();
        let result = encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst);
        assert!(matches!(result, Err(SendError::InvalidBody { .. })));
    }
}
