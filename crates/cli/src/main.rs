//! dialogwire CLI: the main entry point.
//!
//! Commands:
//! - `serve`         Start the webhook server
//! - `intents`       List registered intent handlers
//! - `contexts`      List registered contexts
//! - `integrations`  List registered integrations
//! - `simulate`      Run one webhook turn locally and print the response
//! - `init`          Write a default config and templates file
//! - `config`        Validate, show or locate the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "dialogwire",
    about = "dialogwire: Dialogflow webhook fulfillment",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of ~/.dialogwire/config.toml
    #[arg(short, long, global = true, env = "DIALOGWIRE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// List registered intent handlers
    Intents,

    /// List registered contexts
    Contexts,

    /// List registered integrations
    Integrations,

    /// Run one webhook turn against the agent and print the response
    Simulate {
        /// Intent display name
        intent: String,

        /// What the user said
        #[arg(short, long)]
        query: Option<String>,

        /// Session path
        #[arg(long)]
        session: Option<String>,

        /// Language code
        #[arg(long)]
        language: Option<String>,

        /// Mark the intent as a fallback intent
        #[arg(long)]
        fallback: bool,

        /// Intent parameter as name=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Incoming context as name or name:lifespan (repeatable)
        #[arg(long = "context")]
        contexts: Vec<String>,

        /// Originating platform, e.g. `google`
        #[arg(short, long)]
        source: Option<String>,

        /// Platform protocol version
        #[arg(long = "platform-version", requires = "source")]
        version: Option<String>,

        /// Platform payload as a JSON object
        #[arg(long, requires = "source")]
        payload: Option<String>,

        /// Print a readable summary instead of the response document
        #[arg(long)]
        summary: bool,
    },

    /// Write a default config and templates file
    Init,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load and validate the configuration
    Validate,
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config_path, port, host).await?,
        Commands::Intents => commands::introspect::intents(config_path).await?,
        Commands::Contexts => commands::introspect::contexts(config_path).await?,
        Commands::Integrations => commands::introspect::integrations(config_path).await?,
        Commands::Simulate {
            intent,
            query,
            session,
            language,
            fallback,
            params,
            contexts,
            source,
            version,
            payload,
            summary,
        } => {
            let options = dialogwire::simulate::SimulateOptions {
                intent,
                session,
                query_text: query,
                language_code: language,
                fallback,
                params,
                contexts,
                source,
                version,
                payload,
            };
            commands::simulate::run(config_path, options, summary).await?
        }
        Commands::Init => commands::init::run(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
        },
    }

    Ok(())
}
