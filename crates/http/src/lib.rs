//! A from-scratch HTTP/1.0 and HTTP/1.1 connection engine on top of tokio.
//!
//! The crate turns a byte stream into a sequence of requests and writes the
//! responses back on the same stream. It covers what happens on the wire of
//! one connection and stops there: no routing, no TLS, no HTTP/2.
//!
//! # Example
//!
//! ```no_run
//! use std::convert::Infallible;
//!
//! use http::{Response, StatusCode};
//! use http_body_util::BodyExt;
//! use rawhttp::config::ServerConfig;
//! use rawhttp::handler::make_handler;
//! use rawhttp::protocol::Request;
//! use rawhttp::protocol::body::{ReqBody, ResponseBody};
//! use rawhttp::server::Server;
//!
//! async fn echo(request: Request<ReqBody>) -> Result<Response<ResponseBody>, Box<dyn std::error::Error + Send + Sync>> {
//!     let body = request.into_body().collect().await?.to_bytes();
//!     let response = Response::builder().status(StatusCode::OK).body(ResponseBody::full(body))?;
//!     Ok(response)
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let server = Server::builder()
//!         .config(ServerConfig::default())
//!         .handler(make_handler(echo))
//!         .build();
//!
//!     server.bind("127.0.0.1:8080").await
//! }
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: the wire formats. A bounded line reader, the request head
//!   decoder, the body decoders (`Content-Length` and chunked) and the
//!   response encoders.
//! - [`protocol`]: the request, response and body types the codecs produce
//!   and consume, and the error types.
//! - [`connection`]: the per-connection loop with keep-alive, timeouts and
//!   request budget.
//! - [`handler`]: the application callback.
//! - [`config`]: limits and timeouts, shared by all connections.
//! - [`server`]: an accept loop spawning one task per connection.
//!
//! # Bodies
//!
//! Request bodies are streamed to the handler through [`protocol::body::ReqBody`]
//! and never buffered whole. Whatever the handler leaves unread is drained
//! before the next request is read, so a connection stays usable.
//!
//! Response bodies are [`protocol::body::ResponseBody`] values. A body with a
//! known size goes out with `Content-Length`, a streaming body of unknown size
//! goes out chunked.
//!
//! # Logging
//!
//! The crate logs through `tracing` and never installs a subscriber, that is
//! left to the binary.

pub mod codec;
pub mod config;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
