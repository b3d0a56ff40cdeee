use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};
use tokio::io::AsyncRead;
use tokio_util::io::poll_read_buf;

use crate::protocol::PayloadSize;

/// Size of the buffer a streamed body is read through. Every read of an
/// unknown length body becomes one chunk on the wire.
pub const CHUNK_SIZE: usize = 8 * 1024;

type BoxReader = Pin<Box<dyn AsyncRead + Send>>;

/// The body of a response.
///
/// The variant decides the framing: a known length is sent with
/// `content-length`, an unknown length with chunked transfer encoding, and
/// an empty body with `content-length: 0`.
pub struct ResponseBody {
    kind: Kind,
}

enum Kind {
    Empty,
    Full(Option<Bytes>),
    Sized { remaining: u64, reader: BoxReader },
    Stream { reader: BoxReader, eof: bool },
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self { kind: Kind::Empty }
    }

    /// A body held in memory.
    pub fn full<B: Into<Bytes>>(bytes: B) -> Self {
        Self { kind: Kind::Full(Some(bytes.into())) }
    }

    /// A streamed body whose length is known up front.
    ///
    /// Exactly `length` bytes are sent; a reader that ends early fails the
    /// response, anything past `length` is never sent.
    pub fn sized<R>(length: u64, reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self { kind: Kind::Sized { remaining: length, reader: Box::pin(reader) } }
    }

    /// A streamed body of unknown length, sent chunked.
    pub fn stream<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self { kind: Kind::Stream { reader: Box::pin(reader), eof: false } }
    }

    /// The framing this body is sent with.
    pub fn payload_size(&self) -> PayloadSize {
        match &self.kind {
            Kind::Empty | Kind::Full(None) => PayloadSize::Empty,
            Kind::Full(Some(bytes)) => PayloadSize::Length(bytes.len() as u64),
            Kind::Sized { remaining, .. } => PayloadSize::Length(*remaining),
            Kind::Stream { .. } => PayloadSize::Chunked,
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Empty => f.write_str("ResponseBody::Empty"),
            Kind::Full(bytes) => f.debug_tuple("ResponseBody::Full").field(bytes).finish(),
            Kind::Sized { remaining, .. } => f.debug_struct("ResponseBody::Sized").field("remaining", remaining).finish(),
            Kind::Stream { eof, .. } => f.debug_struct("ResponseBody::Stream").field("eof", eof).finish(),
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<()> for ResponseBody {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::full(bytes)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(vec: Vec<u8>) -> Self {
        Self::full(vec)
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::full(value)
    }
}

impl From<&'static str> for ResponseBody {
    fn from(value: &'static str) -> Self {
        if value.is_empty() { Self::empty() } else { Self::full(value) }
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            Kind::Empty => Poll::Ready(None),
            Kind::Full(option_bytes) => Poll::Ready(option_bytes.take().filter(|b| !b.is_empty()).map(|b| Ok(Frame::data(b)))),

            Kind::Sized { remaining, reader } => {
                if *remaining == 0 {
                    return Poll::Ready(None);
                }

                let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
                let n = ready!(poll_read_buf(reader.as_mut(), cx, &mut buf))?;
                if n == 0 {
                    return Poll::Ready(Some(Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("body ended with {remaining} bytes left of its declared length"),
                    ))));
                }

                let take = usize::try_from(*remaining).map_or(n, |r| r.min(n));
                buf.truncate(take);
                *remaining -= take as u64;
                Poll::Ready(Some(Ok(Frame::data(buf.freeze()))))
            }

            Kind::Stream { reader, eof } => {
                if *eof {
                    return Poll::Ready(None);
                }

                let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
                let n = ready!(poll_read_buf(reader.as_mut(), cx, &mut buf))?;
                if n == 0 {
                    *eof = true;
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Ok(Frame::data(buf.freeze()))))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Empty => true,
            Kind::Full(option_bytes) => option_bytes.as_ref().is_none_or(Bytes::is_empty),
            Kind::Sized { remaining, .. } => *remaining == 0,
            Kind::Stream { eof, .. } => *eof,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self.payload_size() {
            PayloadSize::Length(n) => SizeHint::with_exact(n),
            PayloadSize::Empty => SizeHint::with_exact(0),
            PayloadSize::Chunked => SizeHint::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn check_send<T: Send>() {}

    #[test]
    fn is_send() {
        check_send::<ResponseBody>();
    }

    #[tokio::test]
    async fn test_string_body() {
        let mut body = ResponseBody::from("Hello world".to_string());

        assert_eq!(body.payload_size(), PayloadSize::Length(11));
        assert!(!body.is_end_stream());

        let bytes = body.frame().await.unwrap().unwrap().into_data().unwrap();
        assert_eq!(bytes, Bytes::from("Hello world"));

        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_body() {
        let mut body = ResponseBody::from("");

        assert!(body.is_end_stream());
        assert_eq!(body.payload_size(), PayloadSize::Empty);
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn test_sized_body_truncates() {
        let body = ResponseBody::sized(5, &b"hello world"[..]);
        assert_eq!(body.payload_size(), PayloadSize::Length(5));

        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_sized_body_short() {
        let mut body = ResponseBody::sized(20, &b"hello"[..]);

        let first = body.frame().await.unwrap().unwrap().into_data().unwrap();
        assert_eq!(&first[..], b"hello");

        let err = body.frame().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_stream_body_reads_in_buffer_sized_pieces() {
        let data = vec![b'x'; CHUNK_SIZE * 2 + 10];
        let mut body = ResponseBody::stream(std::io::Cursor::new(data));
        assert_eq!(body.payload_size(), PayloadSize::Chunked);

        let mut sizes = vec![];
        while let Some(frame) = body.frame().await {
            sizes.push(frame.unwrap().into_data().unwrap().len());
        }

        assert!(sizes.iter().all(|size| *size <= CHUNK_SIZE));
        assert_eq!(sizes.iter().sum::<usize>(), CHUNK_SIZE * 2 + 10);
        assert!(body.is_end_stream());
    }
}
