use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port: u16 = std::env::var("VENDIGO_HTTP_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000);
    let db_path = std::env::var("VENDIGO_DB_PATH").unwrap_or_else(|_| "vendigo.db".to_string());
    info!(
        target: "vendigo",
        "Vendigo starting: RUST_LOG='{}', http_port={}, db_path='{}'",
        rust_log, http_port, db_path
    );

    vendigo::server::run_with_port(http_port, &db_path).await
}
