pub mod csv;
pub mod error;
pub mod format;
pub mod types;

pub use error::QueryDashError;
pub use format::{format_currency, format_short_number, NumberFormat};
pub use types::{QueryResult, Row};
