//! The application side of a connection.
//!
//! A [`Handler`] receives every [`Request`] read from a connection and
//! answers with a [`Response`]. An `Err` means the handler produced no
//! response: the connection answers `500` and closes.
//!
//! Plain async functions become handlers through [`make_handler`]:
//!
//! ```
//! use http::Response;
//! use rawhttp::handler::make_handler;
//! use rawhttp::protocol::Request;
//! use rawhttp::protocol::body::{ReqBody, ResponseBody};
//!
//! async fn hello(_request: Request<ReqBody>) -> Result<Response<ResponseBody>, std::convert::Infallible> {
//!     Ok(Response::new(ResponseBody::from("hello")))
//! }
//!
//! let handler = make_handler(hello);
//! ```

use std::error::Error;

use http::Response;

use crate::protocol::Request;
use crate::protocol::body::{ReqBody, ResponseBody};

#[trait_variant::make(Handler: Send)]
pub trait LocalHandler {
    type Error: Into<Box<dyn Error + Send + Sync>>;

    async fn call(&self, req: Request<ReqBody>) -> Result<Response<ResponseBody>, Self::Error>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<B, Err, F, Fut> Handler for HandlerFn<F>
where
    B: Into<ResponseBody>,
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response<B>, Err>> + Send,
{
    type Error = Err;

    async fn call(&self, req: Request<ReqBody>) -> Result<Response<ResponseBody>, Self::Error> {
        (self.f)(req).await.map(|response| response.map(Into::into))
    }
}

/// Wraps an async function into a [`Handler`].
///
/// The response body can be anything convertible into [`ResponseBody`]:
/// `String`, `&'static str`, `Bytes`, `Vec<u8>` or `ResponseBody` itself.
pub fn make_handler<F, B, Err, Ret>(f: F) -> HandlerFn<F>
where
    B: Into<ResponseBody>,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<Response<B>, Err>>,
    F: Fn(Request<ReqBody>) -> Ret,
{
    HandlerFn { f }
}

/// A handler slot that may be empty. Calling an empty slot fails, which the
/// connection reports as a missing handler.
impl<H> Handler for Option<H>
where
    H: Handler + Sync,
{
    type Error = Box<dyn Error + Send + Sync>;

    async fn call(&self, req: Request<ReqBody>) -> Result<Response<ResponseBody>, Self::Error> {
        match self {
            Some(handler) => handler.call(req).await.map_err(Into::into),
            None => Err("no handler defined".into()),
        }
    }
}
