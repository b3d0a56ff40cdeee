use std::error::Error;
use std::io;
use thiserror::Error;

/// Top level error of one connection.
///
/// Every variant is local to the connection it happened on: the connection
/// task logs it and closes, nothing is retried.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    /// The handler is missing or produced no response.
    #[error("handler fault: {reason}")]
    HandlerFault { reason: String },
}

impl HttpError {
    pub fn handler_fault<E: Into<Box<dyn Error + Send + Sync>>>(e: E) -> Self {
        Self::HandlerFault { reason: e.into().to_string() }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    HeaderTooLarge { current_size: usize, max_size: usize },

    #[error("malformed request line: {line:?}")]
    MalformedRequestLine { line: String },

    #[error("invalid http version: {version:?}")]
    InvalidVersion { version: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid chunk size: {reason}")]
    InvalidChunkSize { reason: String },

    #[error("body size {size} exceed the limit {max_size}")]
    BodyTooLarge { size: u64, max_size: u64 },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("connection closed before the message was complete")]
    IncompleteRead,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn header_too_large(current_size: usize, max_size: usize) -> Self {
        Self::HeaderTooLarge { current_size, max_size }
    }

    pub fn malformed_request_line<S: ToString>(line: S) -> Self {
        Self::MalformedRequestLine { line: line.to_string() }
    }

    pub fn invalid_version<S: ToString>(version: S) -> Self {
        Self::InvalidVersion { version: version.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn invalid_chunk_size<S: ToString>(str: S) -> Self {
        Self::InvalidChunkSize { reason: str.to_string() }
    }

    pub fn body_too_large(size: u64, max_size: u64) -> Self {
        Self::BodyTooLarge { size, max_size }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn timeout() -> Self {
        Self::io(io::Error::new(io::ErrorKind::TimedOut, "read timeout"))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Io { source } if source.kind() == io::ErrorKind::TimedOut)
    }

    /// Whether the peer just went away, as opposed to sending garbage.
    pub fn is_incomplete(&self) -> bool {
        match self {
            Self::IncompleteRead => true,
            Self::Io { source } => matches!(
                source.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// Failure while writing a response. No response can be sent for it, the
/// connection is simply closed.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn timeout() -> Self {
        Self::io(io::Error::new(io::ErrorKind::TimedOut, "write timeout"))
    }
}
