use geostream::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = if config::debug_enabled() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let role = std::env::args().nth(1).unwrap_or_default();

    match role.as_str() {
        "gateway" => {
            tracing::info!("Starting gateway");
            geostream::gateway::run().await
        }
        "registry" => {
            tracing::info!("Starting registry");
            geostream::registry::run().await
        }
        "worker" => {
            tracing::info!("Starting worker");
            geostream::worker::run().await
        }
        _ => {
            let binary = std::env::args().next().unwrap_or_else(|| "geostream".to_string());
            eprintln!("Usage: {} <gateway|registry|worker>", binary);
            eprintln!("Example: PORT=8080 {} gateway", binary);
            eprintln!("Example: PORT=50051 REGISTRY_ADDRESS=registry:50051 {} worker", binary);
            std::process::exit(1);
        }
    }
}
