use clap::Parser;
use todo_web::config::{Args, Config};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args)?;
    let level = if config.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
    todo_web::web::start_web_server(config).await
}
