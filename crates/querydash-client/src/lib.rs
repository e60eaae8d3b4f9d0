pub mod batch;
pub mod client;
pub mod error;
pub mod http;
pub mod transport;

pub use batch::BatchQueryClient;
pub use client::QueryClient;
pub use error::ClientError;
pub use http::HttpTransport;
pub use transport::{Transport, TransportRequest, TransportResponse};
