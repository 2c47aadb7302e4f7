use juniper_connections_test::app;
use juniper_connections_test::config::AppConfig;
use juniper_connections_test::db::Database;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,juniper_connections=debug")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let db = Arc::new(Database::with_test_data());

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "listening, GraphiQL at /graphiql");
    axum::serve(listener, app(db, config)).await?;

    Ok(())
}
