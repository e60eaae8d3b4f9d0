use crate::error::ClientError;
use async_trait::async_trait;
use bytes::Bytes;

/// A single outbound request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub endpoint: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TransportRequest {
    pub fn post(endpoint: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: "POST".to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and fully-read body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8; invalid sequences become U+FFFD.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Network dependency of [`crate::QueryClient`].
///
/// Implementations return `Err` only for transport-level failures. A response
/// with any status code, including 4xx and 5xx, is `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, ClientError>;
}
