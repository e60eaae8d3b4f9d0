use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryDashError {
    #[error("config error: {0}")]
    Config(String),
    #[error("format error: {0}")]
    Format(String),
}
