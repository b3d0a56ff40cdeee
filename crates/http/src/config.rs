//! Server limits and timeouts.
//!
//! A [`ServerConfig`] is built once, validated, and then shared read-only by
//! every connection through an `Arc`.
//!
//! ```
//! use std::time::Duration;
//! use rawhttp::config::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .max_header_size(16 * 1024)
//!     .keep_alive_timeout(Duration::from_secs(5))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.max_header_size(), 16 * 1024);
//! assert_eq!(config.max_request_size(), 1024 * 1024);
//! ```

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MAX_HEADER_SIZE: usize = 8 * 1024;
pub const DEFAULT_MAX_REQUEST_SIZE: u64 = 1024 * 1024;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_KEEP_ALIVE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_KEEP_ALIVE_REQUESTS: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    max_header_size: usize,
    max_request_size: u64,
    read_timeout: Duration,
    write_timeout: Duration,
    keep_alive: bool,
    keep_alive_timeout: Duration,
    max_keep_alive_requests: usize,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder { config: Self::default() }
    }

    /// Ceiling of one request head, request line and terminating empty line
    /// included.
    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }

    /// Ceiling of one request body, declared or decoded.
    pub fn max_request_size(&self) -> u64 {
        self.max_request_size
    }

    /// Deadline of every read while a request is in flight.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Deadline of writing one response.
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// How long an idle connection waits for its next request.
    pub fn keep_alive_timeout(&self) -> Duration {
        self.keep_alive_timeout
    }

    /// Requests served on one connection before it is closed.
    pub fn max_keep_alive_requests(&self) -> usize {
        self.max_keep_alive_requests
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            keep_alive: true,
            keep_alive_timeout: DEFAULT_KEEP_ALIVE_TIMEOUT,
            max_keep_alive_requests: DEFAULT_MAX_KEEP_ALIVE_REQUESTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn max_header_size(mut self, max_header_size: usize) -> Self {
        self.config.max_header_size = max_header_size;
        self
    }

    pub fn max_request_size(mut self, max_request_size: u64) -> Self {
        self.config.max_request_size = max_request_size;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.config.read_timeout = read_timeout;
        self
    }

    pub fn write_timeout(mut self, write_timeout: Duration) -> Self {
        self.config.write_timeout = write_timeout;
        self
    }

    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.config.keep_alive = keep_alive;
        self
    }

    pub fn keep_alive_timeout(mut self, keep_alive_timeout: Duration) -> Self {
        self.config.keep_alive_timeout = keep_alive_timeout;
        self
    }

    pub fn max_keep_alive_requests(mut self, max_keep_alive_requests: usize) -> Self {
        self.config.max_keep_alive_requests = max_keep_alive_requests;
        self
    }

    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let config = self.config;

        check(config.max_header_size > 0, "max_header_size")?;
        check(config.max_request_size > 0, "max_request_size")?;
        check(!config.read_timeout.is_zero(), "read_timeout")?;
        check(!config.write_timeout.is_zero(), "write_timeout")?;
        check(!config.keep_alive_timeout.is_zero(), "keep_alive_timeout")?;
        check(config.max_keep_alive_requests > 0, "max_keep_alive_requests")?;

        Ok(config)
    }
}

fn check(valid: bool, name: &'static str) -> Result<(), ConfigError> {
    if valid { Ok(()) } else { Err(ConfigError::Zero { name }) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.max_header_size(), 8192);
        assert_eq!(config.max_request_size(), 1_048_576);
        assert_eq!(config.read_timeout(), Duration::from_secs(30));
        assert_eq!(config.write_timeout(), Duration::from_secs(30));
        assert!(config.keep_alive());
        assert_eq!(config.keep_alive_timeout(), Duration::from_secs(60));
        assert_eq!(config.max_keep_alive_requests(), 100);

        assert_eq!(ServerConfig::builder().build().unwrap(), config);
    }

    #[test]
    fn zero_values_rejected() {
        assert_eq!(
            ServerConfig::builder().max_header_size(0).build(),
            Err(ConfigError::Zero { name: "max_header_size" })
        );
        assert_eq!(
            ServerConfig::builder().read_timeout(Duration::ZERO).build(),
            Err(ConfigError::Zero { name: "read_timeout" })
        );
        assert_eq!(
            ServerConfig::builder().max_keep_alive_requests(0).build(),
            Err(ConfigError::Zero { name: "max_keep_alive_requests" })
        );
    }

    #[test]
    fn keep_alive_can_be_disabled() {
        let config = ServerConfig::builder().keep_alive(false).build().unwrap();
        assert!(!config.keep_alive());
    }
}
