mod cli;
mod config;

use clap::Parser;
use cli::Cli;
use config::Config;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level()?)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let output = cli::execute(args.command, &config).await?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
