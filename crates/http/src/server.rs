//! A thin accept loop: every accepted TCP connection gets its own task
//! running an [`HttpConnection`].

use std::io;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::connection::HttpConnection;
use crate::handler::Handler;

#[derive(Debug)]
pub struct ServerBuilder<H> {
    config: ServerConfig,
    handler: Option<H>,
}

impl<H> ServerBuilder<H> {
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Builds the server. A server without handler answers every request
    /// with `500`.
    pub fn build(self) -> Server<H> {
        Server { config: Arc::new(self.config), handler: Arc::new(self.handler) }
    }
}

#[derive(Debug)]
pub struct Server<H> {
    config: Arc<ServerConfig>,
    handler: Arc<Option<H>>,
}

impl<H> Server<H>
where
    H: Handler + Sync + 'static,
{
    pub fn builder() -> ServerBuilder<H> {
        ServerBuilder { config: ServerConfig::default(), handler: None }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds `address` and serves connections on it.
    pub async fn bind<A: ToSocketAddrs>(self, address: A) -> io::Result<()> {
        let tcp_listener = TcpListener::bind(address).await.inspect_err(|e| error!(cause = %e, "bind server error"))?;
        self.serve(tcp_listener).await;
        Ok(())
    }

    /// Accepts connections from `tcp_listener` forever.
    pub async fn serve(self, tcp_listener: TcpListener) {
        match tcp_listener.local_addr() {
            Ok(address) => info!(%address, "start listening"),
            Err(e) => warn!(cause = %e, "start listening on unknown address"),
        }

        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let handler = Arc::clone(&self.handler);
            let config = Arc::clone(&self.config);

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::new(reader, writer, config);
                match connection.process(handler).await {
                    Ok(()) => info!(%remote_addr, "finished process, connection shutdown"),
                    Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
                }
            });
        }
    }
}
