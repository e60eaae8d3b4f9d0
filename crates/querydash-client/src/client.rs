use crate::error::ClientError;
use crate::http::HttpTransport;
use crate::transport::{Transport, TransportRequest};
use metrics::counter;
use querydash_core::csv;
use querydash_core::types::QueryResult;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Sends one query to the data endpoint and parses the CSV reply.
#[derive(Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn http(endpoint: impl Into<String>, request_timeout: Duration) -> Self {
        Self::new(Arc::new(HttpTransport::new(request_timeout)), endpoint)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Like [`QueryClient::fetch_data`], but a non-2xx reply is reported as
    /// [`ClientError::Status`] instead of an empty result.
    pub async fn try_fetch_data(&self, query: &str) -> Result<QueryResult, ClientError> {
        counter!("query_fetch_total").increment(1);
        let request = TransportRequest::post(self.endpoint.as_str(), query)
            .header("Content-Type", "application/json");
        debug!(endpoint = %self.endpoint, bytes = query.len(), "sending query");
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::Status(response.status));
        }
        let result = csv::parse(&response.text());
        debug!(
            columns = result.headers().len(),
            rows = result.row_count(),
            "query result parsed"
        );
        Ok(result)
    }

    /// Fetches and parses one query result.
    ///
    /// A non-2xx reply yields [`QueryResult::empty`]; only transport failures
    /// are returned as errors.
    pub async fn fetch_data(&self, query: &str) -> Result<QueryResult, ClientError> {
        match self.try_fetch_data(query).await {
            Err(ClientError::Status(status)) => {
                counter!("query_fetch_status_error_total").increment(1);
                warn!(endpoint = %self.endpoint, status, "query rejected by server, returning empty result");
                Ok(QueryResult::empty())
            }
            other => other,
        }
    }
}
