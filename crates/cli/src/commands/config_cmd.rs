//! `dialogwire config`: configuration management commands.

use std::path::Path;

use dialogwire_agent::Templates;
use dialogwire_config::AppConfig;

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    let config = match super::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ {e}");
            return Err(e);
        }
    };
    println!("   ✅ Config parsed successfully");

    let mut warnings = Vec::new();

    if config.gateway.auth_token.is_none() && config.gateway.signing_secret.is_none() {
        warnings.push("Webhook is unauthenticated (set gateway.auth_token or gateway.signing_secret)".to_owned());
    }

    if let Some(path) = &config.templates.path {
        match Templates::load(path) {
            Ok(templates) => println!("   ✅ {} templates loaded", templates.len()),
            Err(e) => {
                println!("   ❌ Templates: {e}");
                return Err(e.into());
            }
        }
    }

    if config.agent.log_payloads {
        warnings.push("log_payloads is on, request documents will be logged".to_owned());
    }

    if warnings.is_empty() {
        println!("   ✅ All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   ⚠️  {w}");
        }
    }

    println!();
    println!("   Gateway:    {}:{}", config.gateway.host, config.gateway.port);
    println!("   Webhook:    POST {}", config.gateway.webhook_path);
    println!("   AoG:        version {} (ssml: {})", config.actions_on_google.version, config.actions_on_google.text_to_speech_as_ssml);
    println!("   Fallbacks:  {}", if config.agent.track_fallback_level { "tracked" } else { "not tracked" });

    Ok(())
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&redacted(config))?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", super::config_file(config_path).display());
    Ok(())
}

/// Secrets replaced for display.
fn redacted(mut config: AppConfig) -> AppConfig {
    for secret in [&mut config.gateway.auth_token, &mut config.gateway.signing_secret] {
        if secret.is_some() {
            *secret = Some("[REDACTED]".into());
        }
    }
    config
}
