//! `parley serve`: start the HTTP gateway.

use parley_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    if !config.has_api_key() {
        tracing::warn!("No API key configured; model calls will be rejected upstream");
    }

    println!("Parley gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Language:  {}", config.language);

    parley_gateway::start(config).await?;

    Ok(())
}
