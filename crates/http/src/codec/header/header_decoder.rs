//! Request head decoding.
//!
//! The head is consumed line by line through a [`LineReader`], so a partial
//! head is parsed incrementally as bytes arrive and no body byte is ever
//! taken from the buffer. The whole block, request line and terminating
//! empty line included, counts against `max_header_size`.
//!
//! Framing is decided from the parsed headers, in this order:
//!
//! 1. `content-length` present: a fixed length body, the value must be a
//!    non-negative decimal.
//! 2. `transfer-encoding: chunked`: a chunked body.
//! 3. Otherwise no body.

use std::mem;

use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::line::{LineError, LineReader};
use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, RequestHeader};

/// Decoder for request heads implementing the [`Decoder`] trait.
#[derive(Debug)]
pub struct HeaderDecoder {
    line_reader: LineReader,
    max_request_size: u64,
    request_line: Option<RequestLine>,
    headers: HeaderMap,
}

#[derive(Debug)]
struct RequestLine {
    method: Method,
    path: String,
    version: Version,
}

impl HeaderDecoder {
    pub fn new(max_header_size: usize, max_request_size: u64) -> Self {
        Self { line_reader: LineReader::new(max_header_size), max_request_size, request_line: None, headers: HeaderMap::new() }
    }

    /// Whether no byte of the next head has been consumed yet.
    pub fn is_idle(&self) -> bool {
        self.line_reader.consumed() == 0
    }

    fn reset(&mut self) {
        self.line_reader.reset();
        self.request_line = None;
        self.headers.clear();
    }

    fn finish(&mut self) -> Result<RequestHeader, ParseError> {
        let consumed = self.line_reader.consumed();
        let request_line = self.request_line.take().ok_or_else(|| ParseError::malformed_request_line(""))?;
        let headers = mem::take(&mut self.headers);
        self.line_reader.reset();

        let payload_size = parse_payload(&headers, self.max_request_size)?;
        trace!(header_size = consumed, ?payload_size, "parsed request head");

        Ok(RequestHeader::new(request_line.method, request_line.path, request_line.version, headers, payload_size))
    }

    fn next_line(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, ParseError> {
        self.line_reader
            .read_line(src)
            .map_err(|LineError::TooLong { size, limit }| ParseError::header_too_large(size, limit))
    }
}

impl Default for HeaderDecoder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_HEADER_SIZE, crate::config::DEFAULT_MAX_REQUEST_SIZE)
    }
}

impl Decoder for HeaderDecoder {
    type Item = RequestHeader;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let line = match self.next_line(src) {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(e) => {
                    self.reset();
                    return Err(e);
                }
            };

            if self.request_line.is_none() {
                match parse_request_line(&line) {
                    Ok(request_line) => self.request_line = Some(request_line),
                    Err(e) => {
                        self.reset();
                        return Err(e);
                    }
                }
                continue;
            }

            if line.is_empty() {
                return self.finish().map(Some);
            }

            if let Some((name, value)) = parse_header_line(&line) {
                self.headers.insert(name, value);
            }
        }
    }
}

fn parse_request_line(line: &[u8]) -> Result<RequestLine, ParseError> {
    let malformed = || ParseError::malformed_request_line(String::from_utf8_lossy(line));

    let mut fields = line.split(u8::is_ascii_whitespace).filter(|field| !field.is_empty());
    let (Some(method), Some(path), Some(version), None) = (fields.next(), fields.next(), fields.next(), fields.next()) else {
        return Err(malformed());
    };

    let method = Method::from_bytes(method).map_err(|_| malformed())?;
    // the target is not validated, bytes outside UTF-8 are replaced
    let path = String::from_utf8_lossy(path).into_owned();
    let version = match version {
        b"HTTP/1.1" => Version::HTTP_11,
        b"HTTP/1.0" => Version::HTTP_10,
        v => return Err(ParseError::invalid_version(String::from_utf8_lossy(v))),
    };

    Ok(RequestLine { method, path, version })
}

/// Splits `name: value` on the first colon. Lines that are not a valid
/// header are skipped.
fn parse_header_line(line: &[u8]) -> Option<(HeaderName, HeaderValue)> {
    let colon = line.iter().position(|b| *b == b':')?;
    let name = line[..colon].trim_ascii();
    let value = line[colon + 1..].trim_ascii();

    let name = HeaderName::from_bytes(name).ok()?;
    let value = HeaderValue::from_bytes(value).ok()?;
    Some((name, value))
}

fn parse_payload(headers: &HeaderMap, max_request_size: u64) -> Result<PayloadSize, ParseError> {
    if let Some(cl_value) = headers.get(CONTENT_LENGTH) {
        let cl_str = cl_value.to_str().map_err(|_| ParseError::invalid_content_length("value can't to_str"))?;
        let length = cl_str.parse::<u64>().map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))?;

        ensure!(length <= max_request_size, ParseError::body_too_large(length, max_request_size));
        return Ok(PayloadSize::Length(length));
    }

    if headers.get(TRANSFER_ENCODING).is_some_and(|value| value.as_bytes().trim_ascii().eq_ignore_ascii_case(b"chunked")) {
        return Ok(PayloadSize::Chunked);
    }

    Ok(PayloadSize::Empty)
}
