use std::sync::Arc;

use bytes::Bytes;

use futures::{SinkExt, StreamExt};
use http::header::CONNECTION;
use http::{HeaderName, HeaderValue, Response, StatusCode};
use http_body_util::BodyExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio::time::timeout;

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::config::ServerConfig;
use crate::connection::KeepAliveSession;
use crate::handler::Handler;
use crate::protocol::body::{ReqBody, ResponseBody};
use crate::protocol::{HttpError, Message, ParseError, PayloadItem, PayloadSize, RequestHeader, ResponseHead, SendError, error_response};

use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, warn};

const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// One client connection: reads requests, hands them to a [`Handler`] and
/// writes the responses back, one exchange at a time.
///
/// The connection owns its keep-alive state. It stops when the client asks
/// to close, when keep-alive rules say so, or on the first failure.
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    config: Arc<ServerConfig>,
    session: KeepAliveSession,
}

impl<R, W> std::fmt::Debug for HttpConnection<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnection").field("config", &self.config).field("session", &self.session).finish_non_exhaustive()
    }
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, config: Arc<ServerConfig>) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::from_config(&config), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            session: KeepAliveSession::new(&config),
            config,
        }
    }

    /// Serves requests until the connection should close.
    ///
    /// Returns `Ok` when the connection ended normally: the client closed it,
    /// asked to close, went idle, or used up its request budget.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            if !self.session.can_continue() {
                debug!(requests = self.session.request_count(), "keep-alive session over, connection shutdown");
                return Ok(());
            }

            let header = match timeout(self.session.head_timeout(), self.framed_read.next()).await {
                Ok(Some(Ok(Message::Header(header)))) => header,

                Ok(Some(Ok(Message::Payload(_)))) => {
                    error!("receive body while expecting a request header");
                    return Err(ParseError::invalid_body("need header while receive body").into());
                }

                Ok(Some(Err(e))) => return self.reject(e).await,

                Ok(None) => {
                    info!(requests = self.session.request_count(), "cant read more request, connection shutdown");
                    return Ok(());
                }

                Err(_) => return self.reject(ParseError::timeout()).await,
            };

            self.session.begin_request();
            if !self.do_process(header, &handler).await? {
                debug!(requests = self.session.request_count(), "connection not kept alive, shutdown");
                return Ok(());
            }
            self.session.end_exchange();
        }
    }

    /// Runs one exchange, returning whether the connection stays open.
    async fn do_process<H>(&mut self, header: RequestHeader, handler: &Arc<H>) -> Result<bool, HttpError>
    where
        H: Handler,
    {
        let version = header.version();
        let wants_keep_alive = header.wants_keep_alive();

        if header.expects_continue() {
            self.send_continue().await?;
        }

        let (req_body, mut body_sender) =
            ReqBody::body_channel(&mut self.framed_read, header.payload_size(), self.config.read_timeout());
        let request = header.body(req_body);

        // The handler may wait for body data that only the sender can read
        // from the connection, so both are polled together until the handler
        // is done.
        let response_result = {
            let request_handle_future = handler.call(request);
            let body_sender_future = body_sender.send_body();
            tokio::pin!(request_handle_future, body_sender_future);

            let mut body_done = false;
            loop {
                select! {
                    biased;
                    response = &mut request_handle_future => break response,
                    _ = &mut body_sender_future, if !body_done => body_done = true,
                }
            }
        };

        let mut response = match response_result {
            Ok(response) => response,
            Err(e) => {
                drop(body_sender);
                let e = HttpError::handler_fault(e);
                error!(cause = %e, "handler produced no response");
                self.send_error_response(StatusCode::INTERNAL_SERVER_ERROR).await?;
                return Err(e);
            }
        };

        // whatever the handler left unread must go before the next request
        let body_ok = match body_sender.skip_body().await {
            Ok(()) => true,
            Err(e) => {
                warn!(cause = %e, "request body failed, connection will close");
                false
            }
        };
        drop(body_sender);

        let keep_alive = body_ok && self.session.should_keep_alive(wants_keep_alive, response.headers());

        *response.version_mut() = version;
        let headers = response.headers_mut();
        if keep_alive {
            headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
            headers.insert(KEEP_ALIVE, self.session.keep_alive_value());
        } else {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
            headers.remove(KEEP_ALIVE);
        }

        self.send_response(response).await?;
        Ok(keep_alive)
    }

    /// Handles a request head that could not be read.
    ///
    /// Only the first request of a connection gets an error response, later
    /// failures close silently.
    async fn reject(&mut self, e: ParseError) -> Result<(), HttpError> {
        if !self.session.is_first_request() {
            if e.is_incomplete() || e.is_timeout() {
                debug!(cause = %e, requests = self.session.request_count(), "connection closed by client");
                return Ok(());
            }
            warn!(cause = %e, requests = self.session.request_count(), "can't receive next request, connection shutdown");
            return Err(e.into());
        }

        let status_code = match e {
            ParseError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        warn!(cause = %e, status = status_code.as_u16(), "can't receive request");

        if let Err(send_error) = self.send_error_response(status_code).await {
            debug!(cause = %send_error, "can't send error response");
        }
        Err(e.into())
    }

    async fn send_continue(&mut self) -> Result<(), SendError> {
        let writer = self.framed_write.get_mut();
        let write = async {
            writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await?;
            writer.flush().await
        };

        match timeout(self.config.write_timeout(), write).await {
            Ok(result) => result.map_err(SendError::io)?,
            Err(_) => return Err(SendError::timeout()),
        }
        info!("receive expect request header, sent continue response");
        Ok(())
    }

    async fn send_error_response(&mut self, status_code: StatusCode) -> Result<(), SendError> {
        self.send_response(error_response(status_code)).await
    }

    async fn send_response(&mut self, response: Response<ResponseBody>) -> Result<(), SendError> {
        match timeout(self.config.write_timeout(), self.do_send_response(response)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::timeout()),
        }
    }

    async fn do_send_response(&mut self, response: Response<ResponseBody>) -> Result<(), SendError> {
        let (header_parts, mut body) = response.into_parts();
        let payload_size = body.payload_size();

        let header = Message::<_, Bytes>::Header((ResponseHead::from_parts(header_parts, ()), payload_size));
        // feed only buffers, the whole response is flushed with the end of body
        self.framed_write.feed(header).await?;

        loop {
            match body.frame().await {
                Some(Ok(frame)) => {
                    // trailers are not sent
                    let Ok(data) = frame.into_data() else {
                        continue;
                    };
                    self.framed_write.feed(Message::<(ResponseHead, PayloadSize)>::Payload(PayloadItem::Chunk(data))).await?;
                }
                Some(Err(e)) => return Err(SendError::invalid_body(format!("resolve response body error: {e}"))),
                None => {
                    self.framed_write.send(Message::<(ResponseHead, PayloadSize)>::Payload(PayloadItem::Eof)).await?;
                    return Ok(());
                }
            }
        }
    }
}
