use dotenv::dotenv;
use scaffold_api::config::Config;
use scaffold_api::state::AppState;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load Config
    let config = Config::from_env();
    let port = config.port;

    // Create AppState with the real publisher/notifier capabilities
    let state = AppState::new(config);
    let app = scaffold_api::app(state);

    // Start Server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Scaffold API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
