use tracing_subscriber::EnvFilter;

use umbra::{MemoryStore, UmbraError, UmbraServerBuilder};

#[tokio::main]
async fn main() -> Result<(), UmbraError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("UMBRA_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let server = UmbraServerBuilder::new()
        .bind(&addr)
        .build(MemoryStore::new())
        .await?;

    if let Ok(local) = server.local_addr() {
        tracing::info!(%local, "listening");
    }
    server.run().await
}
