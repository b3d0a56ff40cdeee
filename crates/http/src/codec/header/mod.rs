//! Request head decoding and response head encoding.
//!
//! - [`HeaderDecoder`] turns the request line and header block into a
//!   [`RequestHeader`](crate::protocol::RequestHeader) and decides the body
//!   framing
//! - [`HeaderEncoder`] writes the status line and headers, setting the
//!   framing headers to match the response body

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
pub(crate) use header_encoder::FastWrite;
