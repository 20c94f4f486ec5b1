use anyhow::{Context, Result};
use pedigree_server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from the optional file and environment variables
    let loaded = ServerConfig::load().context("Failed to load configuration")?;

    // Set up logging, then report what loading found
    pedigree_monitoring::init(loaded.config.monitoring())
        .context("Failed to initialize monitoring")?;
    loaded.log();

    // Run the server using the library's run function
    let result = pedigree_server::run(loaded.config).await.context("Server error");

    pedigree_monitoring::shutdown();
    result
}
