//! HTTP request types.
//!
//! The request line is kept close to the wire: the method is any token, the
//! path is the raw request target and is never parsed further, bytes outside
//! UTF-8 are replaced with `U+FFFD`. Header names
//! are stored lowercased and a repeated header replaces the earlier value.

use http::header::{CONNECTION, EXPECT};
use http::{HeaderMap, Method, Version};

use crate::protocol::PayloadSize;

/// The parsed head of a request together with its declared body size.
#[derive(Debug, Clone)]
pub struct RequestHeader {
    method: Method,
    path: String,
    version: Version,
    headers: HeaderMap,
    payload_size: PayloadSize,
}

impl RequestHeader {
    pub fn new(method: Method, path: String, version: Version, headers: HeaderMap, payload_size: PayloadSize) -> Self {
        Self { method, path, version, headers, payload_size }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request target exactly as it appeared on the request line.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The body framing announced by the request headers.
    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }

    /// Whether the peer asked for a persistent connection.
    ///
    /// HTTP/1.1 is persistent unless `connection: close` is sent, HTTP/1.0
    /// is not unless `connection: keep-alive` is sent.
    pub fn wants_keep_alive(&self) -> bool {
        let connection = self.headers.get(CONNECTION).and_then(|value| value.to_str().ok()).map(str::trim);
        match self.version {
            Version::HTTP_11 => !connection.is_some_and(|value| value.eq_ignore_ascii_case("close")),
            Version::HTTP_10 => connection.is_some_and(|value| value.eq_ignore_ascii_case("keep-alive")),
            _ => false,
        }
    }

    /// Whether the client waits for `100 Continue` before sending the body.
    pub fn expects_continue(&self) -> bool {
        if self.version != Version::HTTP_11 || self.payload_size.is_empty() {
            return false;
        }

        self.headers.get(EXPECT).is_some_and(|value| {
            let slice = value.as_bytes();
            slice.len() >= 4 && slice[..4].eq_ignore_ascii_case(b"100-")
        })
    }

    /// Attaches a body to this header, converting it into a full [`Request`].
    pub fn body<B>(self, body: B) -> Request<B> {
        Request { header: self, body }
    }
}

/// A request handed to the handler.
///
/// The body is a lazy stream backed by the connection; whatever the handler
/// leaves unread is drained by the connection before the next request.
#[derive(Debug)]
pub struct Request<B> {
    header: RequestHeader,
    body: B,
}

impl<B> Request<B> {
    pub fn header(&self) -> &RequestHeader {
        &self.header
    }

    pub fn method(&self) -> &Method {
        self.header.method()
    }

    pub fn path(&self) -> &str {
        self.header.path()
    }

    pub fn version(&self) -> Version {
        self.header.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.header.headers()
    }

    pub fn payload_size(&self) -> PayloadSize {
        self.header.payload_size()
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }

    pub fn into_parts(self) -> (RequestHeader, B) {
        (self.header, self.body)
    }

    pub fn map<T, F: FnOnce(B) -> T>(self, f: F) -> Request<T> {
        Request { header: self.header, body: f(self.body) }
    }
}
