use crate::client::QueryClient;
use metrics::counter;
use querydash_core::types::QueryResult;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info_span, Instrument, Span};
use uuid::Uuid;

/// Runs many queries at once through a shared [`QueryClient`].
#[derive(Debug, Clone)]
pub struct BatchQueryClient {
    client: QueryClient,
    limiter: Option<Arc<Semaphore>>,
}

impl BatchQueryClient {
    pub fn new(client: QueryClient) -> Self {
        Self {
            client,
            limiter: None,
        }
    }

    /// Caps the number of requests in flight. Zero is treated as one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(max_concurrency.max(1))));
        self
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    /// Returns one result per query, in input order.
    ///
    /// All queries are started before any is awaited. A query that fails is
    /// logged and replaced by [`QueryResult::empty`]; the batch itself never
    /// fails. Dropping the returned future aborts the queries still running.
    pub async fn fetch_multiple_data<Q: AsRef<str>>(&self, queries: &[Q]) -> Vec<QueryResult> {
        let batch_id = Uuid::new_v4();
        let span = info_span!("query_batch", %batch_id, size = queries.len());
        let queries: Vec<String> = queries.iter().map(|q| q.as_ref().to_string()).collect();
        self.run(queries).instrument(span).await
    }

    async fn run(&self, queries: Vec<String>) -> Vec<QueryResult> {
        debug!("starting query batch");
        let mut results = vec![QueryResult::empty(); queries.len()];

        let mut tasks = JoinSet::new();
        for (index, query) in queries.into_iter().enumerate() {
            let client = self.client.clone();
            let limiter = self.limiter.clone();
            let task = async move {
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                (index, client.fetch_data(&query).await)
            };
            tasks.spawn(task.instrument(Span::current()));
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(result))) => results[index] = result,
                Ok((index, Err(err))) => {
                    counter!("query_batch_failures_total").increment(1);
                    error!(index, "query failed: {err}");
                }
                Err(err) => {
                    // the slot of a panicked task keeps its empty result
                    counter!("query_batch_failures_total").increment(1);
                    error!("query task aborted: {err}");
                }
            }
        }
        debug!("query batch complete");
        results
    }
}
