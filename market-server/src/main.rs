use market_server::core::{Config, Server};
use market_server::utils::logger::init_logger_with_file;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        config.log_dir.as_deref(),
        config.is_production(),
    );

    tracing::info!(
        environment = %config.environment,
        database = %config.database_path,
        "Starting market-server"
    );

    Server::new(config).run().await?;
    Ok(())
}
