//! Request and response bodies.
//!
//! [`ReqBody`] is the handler's view of a request body. It reads nothing by
//! itself: each poll asks the connection side, a [`ReqBodySender`], for the
//! next piece through a channel. The connection keeps the sender running
//! while the handler works, then drains whatever is left.
//!
//! [`ResponseBody`] is what a handler answers with. Its variant decides how
//! the body is framed on the wire.

mod req_body;
mod response_body;

pub use req_body::ReqBody;
pub use req_body::ReqBodySender;
pub use response_body::CHUNK_SIZE;
pub use response_body::ResponseBody;
