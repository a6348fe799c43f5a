//! Server command implementation

use anyhow::Result;
use spendscope_server::ServerConfig;

use super::Session;

pub async fn cmd_serve(session: Session, host: &str, port: u16) -> Result<()> {
    println!("🚀 Starting spendscope web server...");
    println!("   Listening: http://{}:{}", host, port);
    match session.config.source {
        Some(ref path) => println!("   Config: {}", path.display()),
        None => println!("   Config: built-in defaults"),
    }

    let server = ServerConfig::from_env();
    if !server.allowed_origins.is_empty() {
        println!("   CORS origins: {}", server.allowed_origins.join(", "));
    }
    println!();

    spendscope_server::serve(session.store, session.config, host, port, server).await
}
