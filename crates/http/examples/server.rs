//! Echo server: answers every request with its own body.
//!
//! ```sh
//! cargo run --example server
//! curl -v --data 'hello' http://127.0.0.1:8080/
//! ```

use std::error::Error;
use std::time::Duration;

use http::{Response, StatusCode};
use http_body_util::BodyExt;
use rawhttp::config::ServerConfig;
use rawhttp::handler::make_handler;
use rawhttp::protocol::Request;
use rawhttp::protocol::body::{ReqBody, ResponseBody};
use rawhttp::server::Server;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

async fn echo(request: Request<ReqBody>) -> Result<Response<ResponseBody>, Box<dyn Error + Send + Sync>> {
    info!(method = %request.method(), path = request.path(), "receive request");

    let body = request.into_body().collect().await?.to_bytes();
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/octet-stream")
        .body(ResponseBody::full(body))?;

    Ok(response)
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match ServerConfig::builder().keep_alive_timeout(Duration::from_secs(15)).build() {
        Ok(config) => config,
        Err(e) => {
            error!(cause = %e, "invalid config");
            return;
        }
    };

    let server = Server::builder().config(config).handler(make_handler(echo)).build();
    if let Err(e) = server.bind("127.0.0.1:8080").await {
        error!(cause = %e, "server stopped");
    }
}
