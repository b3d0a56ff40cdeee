use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use bytes::Bytes;

use futures::channel::{mpsc, oneshot};
use futures::{FutureExt, Stream, StreamExt};

use http_body::{Body, Frame, SizeHint};
use tokio::time::timeout;
use tracing::{debug, error};

use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHeader};

type PayloadResult = Result<PayloadItem, ParseError>;

/// The request body as seen by a handler.
///
/// The bytes live in the connection's read buffer, so `ReqBody` does not read
/// the socket itself: every poll asks the connection side ([`ReqBodySender`])
/// for the next piece over a channel. The connection drives the sender
/// concurrently with the handler and drains whatever the handler leaves
/// unread, which keeps the next request on the connection parseable.
#[derive(Debug)]
pub struct ReqBody {
    signal: mpsc::Sender<oneshot::Sender<PayloadResult>>,
    receiving: Option<oneshot::Receiver<PayloadResult>>,
    payload_size: PayloadSize,
    received: u64,
    eof: bool,
}

impl ReqBody {
    fn new(signal: mpsc::Sender<oneshot::Sender<PayloadResult>>, payload_size: PayloadSize) -> Self {
        let eof = matches!(payload_size, PayloadSize::Empty | PayloadSize::Length(0));
        Self { signal, receiving: None, payload_size, received: 0, eof }
    }

    /// A body that is already exhausted.
    pub fn empty() -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self::new(tx, PayloadSize::Empty)
    }

    /// Creates the handler side and the connection side of one request body.
    pub fn body_channel<S>(payload_stream: &mut S, payload_size: PayloadSize, read_timeout: Duration) -> (ReqBody, ReqBodySender<'_, S>)
    where
        S: Stream + Unpin,
    {
        let (tx, receiver) = mpsc::channel(16);

        let req_body = ReqBody::new(tx, payload_size);

        let body_sender = ReqBodySender { payload_stream, receiver, read_timeout, eof: false, failed: false };

        (req_body, body_sender)
    }

    /// The body size declared by the request headers.
    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }
}

/// Reads body pieces from the connection on behalf of a [`ReqBody`].
#[derive(Debug)]
pub struct ReqBodySender<'conn, S>
where
    S: Stream + Unpin,
{
    payload_stream: &'conn mut S,
    receiver: mpsc::Receiver<oneshot::Sender<PayloadResult>>,
    read_timeout: Duration,
    eof: bool,
    failed: bool,
}

impl<S> ReqBodySender<'_, S>
where
    S: Stream<Item = Result<Message<RequestHeader>, ParseError>> + Unpin,
{
    /// Answers body requests from the [`ReqBody`] until the body ends, the
    /// body is dropped, or reading fails.
    ///
    /// A read failure is forwarded to the handler and returned.
    pub async fn send_body(&mut self) -> Result<(), ParseError> {
        while !self.eof {
            let Some(sender) = self.receiver.next().await else {
                // the handler dropped its body, leftovers are drained later
                return Ok(());
            };

            match self.read_payload().await {
                Ok(payload_item) => {
                    if payload_item.is_eof() {
                        self.eof = true;
                    }
                    // the handler may have stopped waiting, that is fine
                    let _ = sender.send(Ok(payload_item));
                }
                Err(e) => {
                    self.failed = true;
                    let _ = sender.send(Err(ParseError::invalid_body(&e)));
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Consumes what the handler left unread, up to the end of the body.
    pub async fn skip_body(&mut self) -> Result<(), ParseError> {
        if self.failed {
            return Err(ParseError::invalid_body("request body failed while the handler read it"));
        }

        let mut size: usize = 0;
        while !self.eof {
            match self.read_payload().await {
                Ok(PayloadItem::Chunk(bytes)) => size += bytes.len(),
                Ok(PayloadItem::Eof) => self.eof = true,
                Err(e) => {
                    self.failed = true;
                    return Err(e);
                }
            }
        }

        if size > 0 {
            debug!(size, "skip unread request body");
        }
        Ok(())
    }

    async fn read_payload(&mut self) -> Result<PayloadItem, ParseError> {
        match timeout(self.read_timeout, self.payload_stream.next()).await {
            Err(_) => Err(ParseError::timeout()),
            Ok(Some(Ok(Message::Payload(payload_item)))) => Ok(payload_item),
            Ok(Some(Ok(Message::Header(_)))) => {
                error!("received header from receive body phase");
                Err(ParseError::invalid_body("received header from receive body phase"))
            }
            Ok(Some(Err(e))) => Err(e),
            Ok(None) => Err(ParseError::IncompleteRead),
        }
    }
}

impl Body for ReqBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.eof {
            return Poll::Ready(None);
        }

        loop {
            if let Some(oneshot_receiver) = &mut this.receiving {
                let result = ready!(oneshot_receiver.poll_unpin(cx));
                this.receiving = None;

                return match result {
                    Ok(Ok(PayloadItem::Chunk(bytes))) => {
                        this.received += bytes.len() as u64;
                        Poll::Ready(Some(Ok(Frame::data(bytes))))
                    }
                    Ok(Ok(PayloadItem::Eof)) => {
                        this.eof = true;
                        Poll::Ready(None)
                    }
                    Ok(Err(e)) => {
                        this.eof = true;
                        Poll::Ready(Some(Err(e)))
                    }
                    Err(_) => {
                        this.eof = true;
                        Poll::Ready(Some(Err(ParseError::invalid_body("parse body canceled"))))
                    }
                };
            }

            if let Err(e) = ready!(this.signal.poll_ready(cx)) {
                this.eof = true;
                return Poll::Ready(Some(Err(ParseError::invalid_body(e))));
            }

            let (tx, rx) = oneshot::channel();
            if let Err(e) = this.signal.start_send(tx) {
                this.eof = true;
                return Poll::Ready(Some(Err(ParseError::invalid_body(e))));
            }
            this.receiving = Some(rx);
        }
    }

    fn is_end_stream(&self) -> bool {
        self.eof
    }

    fn size_hint(&self) -> SizeHint {
        match self.payload_size {
            PayloadSize::Length(n) => SizeHint::with_exact(n.saturating_sub(self.received)),
            PayloadSize::Empty => SizeHint::with_exact(0),
            PayloadSize::Chunked => SizeHint::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RequestDecoder;
    use http_body_util::BodyExt;
    use tokio_util::codec::FramedRead;

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn framed(input: &'static [u8]) -> (RequestHeader, FramedRead<&'static [u8], RequestDecoder>) {
        let mut framed_read = FramedRead::new(input, RequestDecoder::default());
        match framed_read.next().await {
            Some(Ok(Message::Header(header))) => (header, framed_read),
            other => panic!("expect header, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_body_needs_no_sender() {
        let body = ReqBody::empty();
        assert!(body.is_end_stream());
        assert!(body.collect().await.unwrap().to_bytes().is_empty());
    }

    #[tokio::test]
    async fn handler_reads_chunked_body() {
        let (header, mut framed_read) =
            framed(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nb\r\nHello World\r\n0\r\n\r\n").await;

        let (body, mut sender) = ReqBody::body_channel(&mut framed_read, header.payload_size(), TIMEOUT);

        let (collected, sent) = tokio::join!(body.collect(), sender.send_body());
        sent.unwrap();
        assert_eq!(&collected.unwrap().to_bytes()[..], b"Hello World");
        sender.skip_body().await.unwrap();
    }

    #[tokio::test]
    async fn unread_body_is_skipped() {
        let (header, mut framed_read) =
            framed(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhelloGET /next HTTP/1.1\r\n\r\n").await;

        {
            let (body, mut sender) = ReqBody::body_channel(&mut framed_read, header.payload_size(), TIMEOUT);
            drop(body);
            sender.send_body().await.unwrap();
            sender.skip_body().await.unwrap();
        }

        match framed_read.next().await {
            Some(Ok(Message::Header(next))) => assert_eq!(next.path(), "/next"),
            other => panic!("expect next header, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn broken_body_reaches_handler() {
        let (header, mut framed_read) =
            framed(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\nHello\r\n0\r\n\r\n").await;

        let (body, mut sender) = ReqBody::body_channel(&mut framed_read, header.payload_size(), TIMEOUT);

        let (collected, sent) = tokio::join!(body.collect(), sender.send_body());
        assert!(matches!(sent, Err(ParseError::InvalidChunkSize { .. })));
        assert!(collected.is_err());
        assert!(sender.skip_body().await.is_err());
    }
}
