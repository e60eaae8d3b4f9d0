use crate::config::Config;
use clap::{Parser, Subcommand};
use querydash_client::{BatchQueryClient, QueryClient};
use querydash_core::format::format_currency;
use querydash_core::types::QueryResult;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "querydash", about = "Fetch dashboard query results and format numbers")]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one or more queries against the configured endpoint
    Query {
        #[arg(required = true)]
        sql: Vec<String>,
    },
    /// Abbreviate a number (B/M) or group its digits
    Short {
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Render a currency amount with a K/M/B suffix
    Currency {
        #[arg(allow_negative_numbers = true)]
        value: f64,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub async fn execute(command: Command, config: &Config) -> anyhow::Result<String> {
    match command {
        Command::Query { sql } => run_queries(&sql, config).await,
        Command::Short { value } => Ok(config.number_format()?.short_number(value)),
        Command::Currency { value, symbol } => {
            let symbol = symbol.unwrap_or_else(|| config.format.currency_symbol.clone());
            Ok(format_currency(value, &symbol))
        }
    }
}

async fn run_queries(sql: &[String], config: &Config) -> anyhow::Result<String> {
    let client = QueryClient::http(config.client.endpoint.clone(), config.request_timeout());
    info!(endpoint = %client.endpoint(), queries = sql.len(), "running queries");

    let results = if let [single] = sql {
        vec![client.fetch_data(single).await?]
    } else {
        let mut batch = BatchQueryClient::new(client);
        if let Some(max) = config.client.max_concurrency {
            batch = batch.with_max_concurrency(max);
        }
        batch.fetch_multiple_data(sql).await
    };

    let mut out = String::new();
    for (query, result) in sql.iter().zip(results.iter()) {
        if sql.len() > 1 {
            out.push_str(&format!("-- {query}\n"));
        }
        out.push_str(&render_result(result));
    }
    Ok(out)
}

pub fn render_result(result: &QueryResult) -> String {
    if result.headers().is_empty() {
        return "(no columns)\n".to_string();
    }
    let mut out = result.headers().join("\t");
    out.push('\n');
    for idx in 0..result.row_count() {
        if let Some(values) = result.ordered_values(idx) {
            out.push_str(&values.join("\t"));
            out.push('\n');
        }
    }
    let noun = if result.row_count() == 1 { "row" } else { "rows" };
    out.push_str(&format!("({} {noun})\n", result.row_count()));
    out
}
