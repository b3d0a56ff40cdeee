//! HTTP response header handling.

use std::borrow::Cow;

use http::header::{CONNECTION, CONTENT_TYPE};
use http::{HeaderValue, Response, StatusCode};

use crate::protocol::body::ResponseBody;

/// The header portion of a response, before the body is attached.
pub type ResponseHead = Response<()>;

/// Overrides the status text written on the status line.
///
/// Insert it into the response extensions; without it the canonical reason
/// of the status code is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonPhrase(Cow<'static, str>);

impl ReasonPhrase {
    pub fn new<S: Into<Cow<'static, str>>>(reason: S) -> Self {
        Self(reason.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The text to write after the status code.
pub(crate) fn reason_phrase(head: &ResponseHead) -> &str {
    match head.extensions().get::<ReasonPhrase>() {
        Some(reason) => reason.as_str(),
        None => head.status().canonical_reason().unwrap_or("Unknown"),
    }
}

/// A plain text response carrying the reason of `status_code` as its body,
/// marked to close the connection.
pub(crate) fn error_response(status_code: StatusCode) -> Response<ResponseBody> {
    let reason = status_code.canonical_reason().unwrap_or("Error");
    let mut response = Response::new(ResponseBody::from(reason));
    *response.status_mut() = status_code;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
    response
}
