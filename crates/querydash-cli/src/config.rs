use querydash_core::{NumberFormat, QueryDashError};
use serde::Deserialize;
use std::time::Duration;
use tracing::Level;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub format: FormatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FormatConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_grouping_separator")]
    pub grouping_separator: String,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_grouping_separator() -> String {
    ",".to_string()
}

fn default_decimal_separator() -> String {
    ".".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            client: ClientConfig::default(),
            format: FormatConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/query".to_string(),
            request_timeout_ms: default_request_timeout_ms(),
            max_concurrency: None,
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            grouping_separator: default_grouping_separator(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

impl Config {
    pub fn from_path(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), QueryDashError> {
        if !self.client.endpoint.starts_with("http://") {
            return Err(QueryDashError::Config(format!(
                "endpoint must be an http:// url: {}",
                self.client.endpoint
            )));
        }
        if self.client.request_timeout_ms == 0 {
            return Err(QueryDashError::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.client.max_concurrency == Some(0) {
            return Err(QueryDashError::Config(
                "max_concurrency must be greater than zero".to_string(),
            ));
        }
        self.log_level()?;
        self.number_format()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<Level, QueryDashError> {
        self.log_level
            .parse::<Level>()
            .map_err(|_| QueryDashError::Config(format!("unknown log level: {}", self.log_level)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.client.request_timeout_ms)
    }

    pub fn number_format(&self) -> Result<NumberFormat, QueryDashError> {
        NumberFormat::new(
            self.format.grouping_separator.clone(),
            self.format.decimal_separator.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_full_config_from_file() {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"
log_level = "debug"

[client]
endpoint = "http://10.0.0.5:9000/sql"
request_timeout_ms = 1500
max_concurrency = 4

[format]
currency_symbol = "R$"
grouping_separator = "."
decimal_separator = ","
"#
        )
        .expect("write");
        let config = Config::from_path(file.path().to_str().expect("path")).expect("load");
        assert_eq!(config.client.endpoint, "http://10.0.0.5:9000/sql");
        assert_eq!(config.request_timeout().as_millis(), 1500);
        assert_eq!(config.client.max_concurrency, Some(4));
        assert_eq!(config.format.currency_symbol, "R$");
        assert_eq!(config.log_level().expect("level"), tracing::Level::DEBUG);
        let fmt = config.number_format().expect("format");
        assert_eq!(fmt.grouped(1234.5), "1.234,5");
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = Config::parse("[client]\nendpoint = \"http://localhost/q\"\n").expect("parse");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.client.request_timeout_ms, 30_000);
        assert_eq!(config.client.max_concurrency, None);
        assert_eq!(config.format.currency_symbol, "$");
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            "[client]\nendpoint = \"https://secure/q\"\n",
            "[client]\nendpoint = \"http://h/q\"\nrequest_timeout_ms = 0\n",
            "[client]\nendpoint = \"http://h/q\"\nmax_concurrency = 0\n",
            "log_level = \"loud\"\n",
            "[format]\ngrouping_separator = \".\"\ndecimal_separator = \".\"\n",
        ];
        for case in cases {
            assert!(Config::parse(case).is_err(), "accepted: {case}");
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::from_path("/nonexistent/querydash.toml").is_err());
    }
}
