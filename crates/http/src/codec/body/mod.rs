//! Body codecs.
//!
//! Request bodies are decoded by [`PayloadDecoder`], which picks a
//! fixed-length, chunked or empty decoder from the declared framing.
//! Response bodies are encoded by [`PayloadEncoder`] the same way.

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkedEncoder;
pub use length_decoder::LengthDecoder;
pub use length_encoder::LengthEncoder;
pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
