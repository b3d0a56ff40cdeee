//! The per-connection state machine.
//!
//! [`HttpConnection`] runs the request loop of one connection. For every
//! request it reads the head under a deadline, answers `100 Continue` when
//! asked, runs the handler next to the body reader, drains the unread body,
//! and writes the response. [`KeepAliveSession`] decides between two
//! exchanges whether the connection goes on.

mod http_connection;
mod session;

pub use http_connection::HttpConnection;
pub use session::KeepAliveSession;
