//! Response head encoding: the status line, the framing headers derived
//! from the body, then every remaining header.

use crate::protocol::{PayloadSize, ResponseHead, SendError, reason_phrase};

use bytes::{BufMut, BytesMut};

use http::{HeaderValue, Version, header};
use std::io;
use std::io::{ErrorKind, Write};
use tokio_util::codec::Encoder;
use tracing::error;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

const CHUNKED: HeaderValue = HeaderValue::from_static("chunked");

/// Encoder for response heads implementing the [`Encoder`] trait.
///
/// The framing headers always follow `payload_size`, overriding whatever the
/// handler set: `content-length` and `transfer-encoding` never appear
/// together.
#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut header, payload_size) = item;

        let version = match header.version() {
            Version::HTTP_11 => "HTTP/1.1",
            Version::HTTP_10 => "HTTP/1.0",
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(ErrorKind::Unsupported).into());
            }
        };

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "{} {} {}\r\n", version, header.status().as_str(), reason_phrase(&header))?;

        let headers = header.headers_mut();
        match payload_size {
            PayloadSize::Length(n) => {
                headers.remove(header::TRANSFER_ENCODING);
                headers.insert(header::CONTENT_LENGTH, n.into());
            }
            PayloadSize::Chunked => {
                headers.remove(header::CONTENT_LENGTH);
                headers.insert(header::TRANSFER_ENCODING, CHUNKED);
            }
            PayloadSize::Empty => {
                headers.remove(header::TRANSFER_ENCODING);
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
            }
        }

        for (header_name, header_value) in header.headers().iter() {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// `io::Write` over a `BytesMut`, for `write!` formatting.
pub(crate) struct FastWrite<'a>(pub(crate) &'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReasonPhrase;
    use http::{Response, StatusCode};

    fn encode(head: ResponseHead, payload_size: PayloadSize) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((head, payload_size), &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn fixed_length_head() {
        let head = Response::builder().status(StatusCode::OK).header("content-type", "text/plain").body(()).unwrap();

        let text = encode(head, PayloadSize::Length(5));

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("content-length: 5\r\n"));
        assert!(text.contains("content-type: text/plain\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn chunked_removes_content_length() {
        let head = Response::builder().header("content-length", "42").body(()).unwrap();

        let text = encode(head, PayloadSize::Chunked);

        assert!(text.contains("transfer-encoding: chunked\r\n"));
        assert!(!text.contains("content-length"));
    }

    #[test]
    fn length_removes_transfer_encoding() {
        let head = Response::builder().header("transfer-encoding", "chunked").body(()).unwrap();

        let text = encode(head, PayloadSize::Length(3));

        assert!(text.contains("content-length: 3\r\n"));
        assert!(!text.contains("transfer-encoding"));
    }

    #[test]
    fn empty_body_has_zero_length() {
        let head = Response::builder().status(StatusCode::NO_CONTENT).body(()).unwrap();
        let text = encode(head, PayloadSize::Empty);
        assert_eq!(text, "HTTP/1.1 204 No Content\r\ncontent-length: 0\r\n\r\n");
    }

    #[test]
    fn echoes_http10_and_custom_reason() {
        let head = Response::builder()
            .version(Version::HTTP_10)
            .status(StatusCode::OK)
            .extension(ReasonPhrase::new("All Good"))
            .body(())
            .unwrap();

        let text = encode(head, PayloadSize::Empty);
        assert!(text.starts_with("HTTP/1.0 200 All Good\r\n"));
    }

    #[test]
    fn unknown_status_text() {
        let head = Response::builder().status(599).body(()).unwrap();
        assert!(encode(head, PayloadSize::Empty).starts_with("HTTP/1.1 599 Unknown\r\n"));
    }

    #[test]
    fn http2_unsupported() {
        let head = Response::builder().version(Version::HTTP_2).body(()).unwrap();
        let mut dst = BytesMut::new();
        assert!(HeaderEncoder.encode((head, PayloadSize::Empty), &mut dst).is_err());
    }
}
