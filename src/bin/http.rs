#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use shift_roster::{JsonDirKvStore, KeyValueStore, MemoryKvStore, http_api};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let addr: SocketAddr = std::env::var("SHIFT_ROSTER_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let kv: Arc<dyn KeyValueStore> = match std::env::var("SHIFT_ROSTER_KV_DIR") {
        Ok(dir) => Arc::new(JsonDirKvStore::new(dir)?),
        Err(_) => Arc::new(MemoryKvStore::new()),
    };

    println!("shift-roster key-value API listening on http://{addr}");
    http_api::serve(addr, kv).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
