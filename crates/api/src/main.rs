use anyhow::Context;
use tracing::info;

use voyage_api::{bind_addr, build_app};
use voyage_observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("voyage_api");

    let offline = std::env::var("VOYAGE_OFFLINE").is_ok_and(|v| v != "0" && !v.is_empty());
    let app = build_app(offline);

    let addr = bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, offline, "voyage api listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;
    Ok(())
}
