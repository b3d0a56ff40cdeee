use std::time::Duration;

use http::header::CONNECTION;
use http::{HeaderMap, HeaderValue};
use tokio::time::Instant;

use crate::config::ServerConfig;

/// Keep-alive bookkeeping of one connection.
///
/// Counts the requests served and the time since the last exchange ended,
/// and decides after every exchange whether the connection stays open.
#[derive(Debug, Clone)]
pub struct KeepAliveSession {
    enabled: bool,
    max_requests: usize,
    idle_timeout: Duration,
    read_timeout: Duration,
    request_count: usize,
    idle_since: Instant,
}

impl KeepAliveSession {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            enabled: config.keep_alive(),
            max_requests: config.max_keep_alive_requests(),
            idle_timeout: config.keep_alive_timeout(),
            read_timeout: config.read_timeout(),
            request_count: 0,
            idle_since: Instant::now(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count
    }

    pub fn is_first_request(&self) -> bool {
        self.request_count == 0
    }

    /// Requests still allowed on this connection.
    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.request_count)
    }

    /// Whether another request may be read. The first request always may.
    pub fn can_continue(&self) -> bool {
        if self.is_first_request() {
            return true;
        }

        self.enabled && self.remaining() > 0 && self.idle_since.elapsed() <= self.idle_timeout
    }

    /// Deadline for reading the next request head: the read timeout, capped
    /// by what is left of the idle timeout after the first request.
    pub fn head_timeout(&self) -> Duration {
        if self.is_first_request() {
            self.read_timeout
        } else {
            self.read_timeout.min(self.idle_timeout.saturating_sub(self.idle_since.elapsed()))
        }
    }

    pub fn begin_request(&mut self) {
        self.request_count += 1;
    }

    /// Whether the connection stays open once this exchange is written.
    ///
    /// Call after [`begin_request`](Self::begin_request), with what the request
    /// asked for (see [`RequestHeader::wants_keep_alive`](crate::protocol::RequestHeader::wants_keep_alive)) and the headers the
    /// handler put on its response.
    pub fn should_keep_alive(&self, request_wants_keep_alive: bool, response_headers: &HeaderMap) -> bool {
        let handler_closes = response_headers
            .get(CONNECTION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("close"));

        self.enabled && self.remaining() > 0 && request_wants_keep_alive && !handler_closes
    }

    /// The `keep-alive` header value announcing the idle timeout and the
    /// remaining request budget.
    pub fn keep_alive_value(&self) -> HeaderValue {
        let value = format!("timeout={}, max={}", self.idle_timeout.as_secs(), self.remaining());
        HeaderValue::try_from(value).unwrap_or_else(|_| HeaderValue::from_static("timeout=0, max=0"))
    }

    /// Marks the end of an exchange, the idle timer starts over.
    pub fn end_exchange(&mut self) {
        self.idle_since = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{PayloadSize, RequestHeader};
    use http::{Method, Version};

    fn request(version: Version, connection: Option<&'static str>) -> bool {
        let mut headers = HeaderMap::new();
        if let Some(value) = connection {
            headers.insert(CONNECTION, HeaderValue::from_static(value));
        }
        RequestHeader::new(Method::GET, "/".into(), version, headers, PayloadSize::Empty).wants_keep_alive()
    }

    fn session(config: &ServerConfig) -> KeepAliveSession {
        let mut session = KeepAliveSession::new(config);
        session.begin_request();
        session
    }

    #[test]
    fn keep_alive_matrix() {
        let session = session(&ServerConfig::default());
        let none = HeaderMap::new();

        assert!(session.should_keep_alive(request(Version::HTTP_11, None), &none));
        assert!(session.should_keep_alive(request(Version::HTTP_11, Some("keep-alive")), &none));
        assert!(!session.should_keep_alive(request(Version::HTTP_11, Some("close")), &none));
        assert!(!session.should_keep_alive(request(Version::HTTP_10, None), &none));
        assert!(session.should_keep_alive(request(Version::HTTP_10, Some("keep-alive")), &none));
        assert!(!session.should_keep_alive(request(Version::HTTP_10, Some("close")), &none));
    }

    #[test]
    fn disabled_never_keeps_alive() {
        let config = ServerConfig::builder().keep_alive(false).build().unwrap();
        let session = session(&config);

        assert!(!session.should_keep_alive(request(Version::HTTP_11, None), &HeaderMap::new()));
        assert!(!session.can_continue());
    }

    #[test]
    fn handler_can_close() {
        let session = session(&ServerConfig::default());
        let mut response_headers = HeaderMap::new();
        response_headers.insert(CONNECTION, HeaderValue::from_static("Close"));

        assert!(!session.should_keep_alive(request(Version::HTTP_11, None), &response_headers));
    }

    #[test]
    fn budget_runs_out() {
        let config = ServerConfig::builder().max_keep_alive_requests(2).build().unwrap();
        let mut session = KeepAliveSession::new(&config);
        let req = request(Version::HTTP_11, None);

        assert!(session.can_continue());
        session.begin_request();
        assert!(session.should_keep_alive(req, &HeaderMap::new()));
        assert_eq!(session.keep_alive_value(), "timeout=60, max=1");
        session.end_exchange();

        assert!(session.can_continue());
        session.begin_request();
        assert!(!session.should_keep_alive(req, &HeaderMap::new()));
        assert!(!session.can_continue());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout() {
        let config = ServerConfig::builder().keep_alive_timeout(Duration::from_secs(5)).build().unwrap();
        let mut session = session(&config);
        session.end_exchange();

        assert!(session.can_continue());
        assert_eq!(session.head_timeout(), Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(session.head_timeout(), Duration::from_secs(2));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(!session.can_continue());
    }

    #[tokio::test(start_paused = true)]
    async fn read_timeout_caps_idle_wait() {
        let config = ServerConfig::builder().read_timeout(Duration::from_secs(2)).build().unwrap();
        let mut session = session(&config);
        session.end_exchange();

        assert_eq!(session.head_timeout(), Duration::from_secs(2));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(session.head_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn first_request_uses_read_timeout() {
        let session = KeepAliveSession::new(&ServerConfig::default());
        assert_eq!(session.head_timeout(), Duration::from_secs(30));
    }
}
