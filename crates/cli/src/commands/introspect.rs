//! `dialogwire intents|contexts|integrations`: show what the agent has
//! registered.

use std::path::Path;

use dialogwire_agent::Agent;

fn agent(config_path: Option<&Path>) -> Result<Agent, Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    Ok(dialogwire::demo::build_agent(&config)?)
}

pub async fn intents(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let agent = agent(config_path)?;
    let handlers = agent.list_handlers();

    println!("🎯 Intent handlers ({})", handlers.len());
    for (intent, handler) in handlers {
        println!("   {intent:<28} {handler}");
    }
    Ok(())
}

pub async fn contexts(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let agent = agent(config_path)?;
    let contexts = agent.list_contexts();

    println!("🧵 Contexts ({})", contexts.len());
    for ctx in contexts {
        let mut flags = Vec::new();
        if ctx.is_keep_around() {
            flags.push("keep-around");
        }
        if ctx.has_default() {
            flags.push("default");
        }
        println!(
            "   {:<28} {:<40} {}",
            ctx.display_name(),
            ctx.type_name().unwrap_or("raw"),
            flags.join(", ")
        );
    }
    Ok(())
}

pub async fn integrations(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let agent = agent(config_path)?;
    let integrations = agent.list_integrations();

    println!("🔌 Integrations ({})", integrations.len());
    for entry in integrations {
        println!(
            "   {:<12} version {:<6} {}",
            entry.source,
            entry.version.as_deref().unwrap_or("any"),
            entry.kind.name()
        );
    }
    println!("   (unregistered sources use the generic integration)");
    Ok(())
}
