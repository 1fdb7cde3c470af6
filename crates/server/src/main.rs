//! Chat Night Server binary
//!
//! Loads configuration from `chatnight.*`, `.env` and `CHATNIGHT__*`
//! variables, then serves until SIGTERM or Ctrl+C.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    server::start_server(config).await?;
    Ok(())
}
