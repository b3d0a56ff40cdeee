//! Protocol types shared by the codecs, the connection and handlers.
//!
//! - [`Message`]: what flows through the codecs, a head or a piece of body
//! - [`RequestHeader`] and [`Request`]: the parsed request head and the
//!   request handed to handlers
//! - [`ResponseHead`] and [`ReasonPhrase`]: response head helpers
//! - [`body`]: the request body stream and the response body variants
//! - [`HttpError`], [`ParseError`], [`SendError`]: what can go wrong on a
//!   connection

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::Request;
pub use request::RequestHeader;

mod response;
pub use response::ReasonPhrase;
pub use response::ResponseHead;
pub(crate) use response::{error_response, reason_phrase};

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
