//! Request decoding.
//!
//! [`RequestDecoder`] yields a [`Message::Header`] for every request head,
//! followed by the [`Message::Payload`] items of its body, the last one
//! being [`PayloadItem::Eof`]. Bodies without bytes still yield that single
//! `Eof`, so every request ends the same way.
//!
//! ```
//! use bytes::BytesMut;
//! use rawhttp::codec::RequestDecoder;
//! use rawhttp::protocol::{Message, PayloadItem};
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = RequestDecoder::new(8192, 1024);
//! let mut buffer = BytesMut::from("POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nok");
//!
//! let Some(Message::Header(header)) = decoder.decode(&mut buffer).unwrap() else { panic!() };
//! assert_eq!(header.path(), "/");
//! assert!(matches!(decoder.decode(&mut buffer).unwrap(), Some(Message::Payload(PayloadItem::Chunk(_)))));
//! assert!(matches!(decoder.decode(&mut buffer).unwrap(), Some(Message::Payload(PayloadItem::Eof))));
//! ```

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::config::ServerConfig;
use crate::protocol::{Message, ParseError, PayloadItem, RequestHeader};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for requests, handling both heads and bodies.
///
/// While `payload_decoder` is `None` the decoder is reading a head.
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
    max_request_size: u64,
}

impl RequestDecoder {
    pub fn new(max_header_size: usize, max_request_size: u64) -> Self {
        Self { header_decoder: HeaderDecoder::new(max_header_size, max_request_size), payload_decoder: None, max_request_size }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.max_header_size(), config.max_request_size())
    }

    /// Whether the decoder sits between two requests with nothing consumed.
    pub fn is_idle(&self) -> bool {
        self.payload_decoder.is_none() && self.header_decoder.is_idle()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<RequestHeader>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let message = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    // the body is over, the next bytes belong to the next request
                    self.payload_decoder.take();
                    Some(Message::Payload(item))
                }
                None => None,
            };

            return Ok(message);
        }

        let message = match self.header_decoder.decode(src)? {
            Some(header) => {
                self.payload_decoder = Some(PayloadDecoder::from_payload_size(header.payload_size(), self.max_request_size));
                Some(Message::Header(header))
            }
            None => None,
        };

        Ok(message)
    }

    /// A peer closing between requests ends the stream, closing anywhere
    /// else is an [`ParseError::IncompleteRead`].
    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(message) => Ok(Some(message)),
            None if buf.is_empty() && self.is_idle() => Ok(None),
            None => Err(ParseError::IncompleteRead),
        }
    }
}
