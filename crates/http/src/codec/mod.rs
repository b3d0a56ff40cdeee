//! Wire codecs for requests and responses.
//!
//! Both directions are `tokio_util` codecs meant to sit inside
//! `FramedRead`/`FramedWrite`:
//!
//! - [`RequestDecoder`]: request heads via [`HeaderDecoder`](header::HeaderDecoder),
//!   then bodies via [`PayloadDecoder`](body::PayloadDecoder)
//! - [`ResponseEncoder`]: response heads via [`HeaderEncoder`](header::HeaderEncoder),
//!   then bodies via [`PayloadEncoder`](body::PayloadEncoder)
//!
//! Every line oriented read goes through the bounded [`LineReader`](line::LineReader).

pub mod body;
pub mod header;
pub mod line;
mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
