//! `dialogwire init`: first-time setup.

use std::path::Path;

use dialogwire_config::AppConfig;

pub const TEMPLATES_FILE: &str = "templates.yaml";

const DEFAULT_TEMPLATES: &str = concat!(
    "# Response templates. A value is one string or a list of variants;\n",
    "# a variant is a string or a [text, weight] pair.\n",
    "welcome:\n",
    "  - Hi! Want to play a round of trivia?\n",
    "  - [\"Hello there! Ready for some trivia?\", 2]\n",
    "goodbye: Thanks for playing, {{ name }}!\n",
);

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = super::config_file(config_path);
    let config_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_dir);

    println!("🗣️  dialogwire: First-Time Setup");
    println!("================================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    let templates_path = config_dir.join(TEMPLATES_FILE);
    if templates_path.exists() {
        println!("  Templates exist: {}", templates_path.display());
    } else {
        std::fs::write(&templates_path, DEFAULT_TEMPLATES)?;
        println!("✅ Created {TEMPLATES_FILE}");
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run init.\n");
    } else {
        std::fs::write(&config_path, initial_config(&templates_path)?)?;
        println!("✅ Created config at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Point your Dialogflow agent's fulfillment URL at this server");
        println!("   2. Set DIALOGWIRE_AUTH_TOKEN or gateway.auth_token to require a bearer token");
        println!("   3. Run `dialogwire simulate \"Default Welcome Intent\"` to try a turn");
        println!("   4. Run `dialogwire serve`\n");
    }

    Ok(())
}

/// The default config, with templates pointing at `templates_path`.
pub fn initial_config(templates_path: &Path) -> Result<String, toml::ser::Error> {
    let mut config = AppConfig::default();
    config.templates.path = Some(templates_path.to_path_buf());
    toml::to_string_pretty(&config)
}
