use std::net::SocketAddr;
use std::path::Path;

use tower_http::trace::TraceLayer;
use vigil::VigilConfig;

use message_service::{build_app, seed_session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    vigil::init_tracing();

    let config = VigilConfig::load_from(Path::new(env!("CARGO_MANIFEST_DIR")), "dev")?;
    let (app, chain) = build_app(&config)?;

    // No login flow: print ready-made sessions for curl usage
    let user = seed_session(&chain, "user", &["USER"]).await?;
    let denied = seed_session(&chain, "denied", &["DENIED"]).await?;
    let cookie = chain.session_cookie_name();
    println!("=== Demo sessions ===");
    println!("USER:   curl -b '{cookie}={user}' localhost:3000/message");
    println!("DENIED: curl -b '{cookie}={denied}' localhost:3000/message");
    println!();

    let port: u16 = config.get_or::<i64>("server.port", 3000)?.try_into()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile = config.profile(), "Message service listening");

    axum::serve(listener, app.layer(TraceLayer::new_for_http())).await?;
    Ok(())
}
