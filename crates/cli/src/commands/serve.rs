//! `dialogwire serve`: start the webhook server.

use std::path::Path;
use std::sync::Arc;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
    host_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }
    config.validate()?;

    let agent = dialogwire::demo::build_agent(&config)?;

    println!("🗣️  dialogwire");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Webhook:   POST {}", config.gateway.webhook_path);
    println!("   Intents:   {}", agent.list_handlers().len());
    let bearer = config.gateway.auth_token.as_ref().is_some_and(|t| !t.is_empty());
    let signed = config.gateway.signing_secret.as_ref().is_some_and(|s| !s.is_empty());
    println!(
        "   Auth:      {}",
        match (bearer, signed) {
            (true, true) => "bearer token + signature",
            (true, false) => "bearer token",
            (false, true) => "signature",
            (false, false) => "none",
        }
    );

    dialogwire_gateway::start(&config, Arc::new(agent)).await?;

    Ok(())
}
