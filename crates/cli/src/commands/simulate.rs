//! `dialogwire simulate`: run one webhook turn locally.

use std::path::Path;

use tracing::debug;

use dialogwire::simulate::{SimulateOptions, build_request};

pub async fn run(
    config_path: Option<&Path>,
    options: SimulateOptions,
    summary: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let agent = dialogwire::demo::build_agent(&config)?;

    let request = build_request(&options)?;
    debug!(intent = %options.intent, session = %request.session, "Simulating webhook turn");
    let response = agent.test_request(request)?;

    if !summary {
        println!("{}", serde_json::to_string_pretty(response.response())?);
        return Ok(());
    }

    println!("💬 {}", options.intent);
    for text in response.text_responses() {
        println!("   > {text}");
    }
    if response.ends_interaction() {
        println!("   (conversation ends)");
    }

    let contexts = &response.response().output_contexts;
    if !contexts.is_empty() {
        println!("\n🧵 Contexts");
        for ctx in contexts {
            let name = ctx.name.rsplit('/').next().unwrap_or(&ctx.name);
            let lifespan = ctx
                .lifespan_count
                .map_or_else(|| "-".to_owned(), |n| n.to_string());
            println!(
                "   {name:<28} lifespan {lifespan:<4} {}",
                serde_json::Value::Object(ctx.parameters.clone())
            );
        }
    }

    let payload = &response.response().payload;
    if !payload.is_empty() {
        println!("\n🔌 Payload");
        println!("{}", serde_json::to_string_pretty(payload)?);
    }

    Ok(())
}
