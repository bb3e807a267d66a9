use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use camp_core::{CampAdvisor, ChatRequest, Config};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::info;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "camp-weather", version, about = "Camping weather advisor")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the advisor over HTTP.
    Serve {
        /// Address to bind, overrides the config file.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overrides the config file and PORT.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Ask a single question and print the answer.
    Ask {
        /// The question, e.g. "Is Hualien good for camping this weekend?"
        message: String,
    },

    /// Store the Gemini API key and model in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { host, port } => {
                let mut config = load_config(self.config.as_deref())?;
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }

                let advisor = Arc::new(CampAdvisor::from_config(&config)?);
                crate::server::serve(&config.server, advisor).await?;
            }
            Command::Ask { message } => {
                let config = load_config(self.config.as_deref())?;
                let advisor = CampAdvisor::from_config(&config)?;

                let reply = advisor
                    .answer(&ChatRequest { message })
                    .await
                    .context("Failed to answer the question")?;
                println!("{}", reply.reply);
            }
            Command::Configure => configure(self.config.as_deref())?,
        }

        Ok(())
    }
}

/// Config from file (or defaults), then environment overrides.
fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env()?;
    Ok(config)
}

fn configure(path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let location = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_file_path()?,
    };
    let mut config = Config::load_from(&location)?;

    let api_key = Password::new("Gemini API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }
    config.set_gemini_api_key(api_key.trim().to_string());

    let model = Text::new("Model:")
        .with_default(&config.gemini.model)
        .prompt()
        .context("Failed to read model name")?;
    config.gemini.model = model.trim().to_string();

    config.save_to(&location)?;
    info!("Configuration saved to {}", location.display());
    Ok(())
}
