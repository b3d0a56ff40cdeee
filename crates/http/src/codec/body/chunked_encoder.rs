//! Encoder for the chunked transfer coding.

use crate::codec::header::FastWrite;
use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BytesMut};
use std::io::Write;

use tokio_util::codec::Encoder;

/// Writes every non-empty data item as one `<hex>\r\n<data>\r\n` chunk and
/// the end of body as `0\r\n\r\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false }
    }
}

impl Default for ChunkedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(mut bytes) => {
                let size = bytes.remaining();
                // a zero sized chunk would end the body
                if size == 0 {
                    return Ok(());
                }

                write!(FastWrite(dst), "{size:x}\r\n")?;
                dst.reserve(size + 2);
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(len);
                }
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::body::ChunkedDecoder;
    use bytes::Bytes;
    use tokio_util::codec::Decoder;

    fn encode(items: Vec<PayloadItem>) -> BytesMut {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();
        for item in items {
            encoder.encode(item, &mut dst).unwrap();
        }
        dst
    }

    #[test]
    fn hello_world() {
        let dst = encode(vec![PayloadItem::Chunk(Bytes::from_static(b"Hello World")), PayloadItem::Eof]);
        assert_eq!(&dst[..], b"b\r\nHello World\r\n0\r\n\r\n");
    }

    #[test]
    fn empty_data_is_skipped() {
        let dst = encode(vec![PayloadItem::Chunk(Bytes::new()), PayloadItem::Chunk(Bytes::from_static(b"a")), PayloadItem::Eof]);
        assert_eq!(&dst[..], b"1\r\na\r\n0\r\n\r\n");
    }

    #[test]
    fn nothing_after_eof() {
        let dst = encode(vec![PayloadItem::Eof, PayloadItem::Chunk(Bytes::from_static(b"late")), PayloadItem::Eof]);
        assert_eq!(&dst[..], b"0\r\n\r\n");
    }

    #[test]
    fn decodes_back() {
        for size in [0usize, 1, 9 * 1024] {
            let data = Bytes::from(vec![b'z'; size]);
            let mut dst = encode(vec![PayloadItem::Chunk(data.clone()), PayloadItem::Eof]);

            let mut decoder = ChunkedDecoder::new(u64::MAX);
            let mut decoded = vec![];
            while let Some(PayloadItem::Chunk(bytes)) = decoder.decode(&mut dst).unwrap() {
                decoded.extend_from_slice(&bytes);
            }
            assert_eq!(decoded, data, "size {size}");
            assert!(dst.is_empty());
        }
    }
}
