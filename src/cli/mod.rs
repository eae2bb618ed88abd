pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::cli::config::{Session, SessionStore};
use crate::client::ApiClient;

#[derive(Parser)]
#[command(name = "villa")]
#[command(about = "Villa CLI - command-line front-end for the Villa API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "API base URL (remembered for later commands)")]
    pub server: Option<String>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, registration and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Villa operations")]
    Villa {
        #[command(subcommand)]
        cmd: commands::villa::VillaCommands,
    },

    #[command(name = "villa-number", about = "Villa number operations")]
    VillaNumber {
        #[arg(long, default_value_t = 1, help = "API version (1 or 2)")]
        api_version: u8,

        #[command(subcommand)]
        cmd: commands::villa_number::VillaNumberCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Everything a command needs: the saved session, where it lives, and an API client
pub struct CliContext {
    pub store: SessionStore,
    pub session: Session,
    pub api: ApiClient,
    pub output: OutputFormat,
}

impl CliContext {
    /// Token of the current session, or an error asking the user to log in
    pub fn require_token(&self) -> anyhow::Result<&str> {
        self.session
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `villa auth login <username>` first"))
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token.as_deref()
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output = OutputFormat::from_cli(&cli);
    let store = SessionStore::default_location()?;
    let mut session = store.load()?;

    if let Some(server) = cli.server {
        if server != session.server_url {
            // A token from another server is meaningless here
            session.logout();
            session.server_url = server;
            store.save(&session)?;
        }
    }

    let api = ApiClient::new(&session.server_url)?;
    let mut ctx = CliContext {
        store,
        session,
        api,
        output,
    };

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &mut ctx).await,
        Commands::Villa { cmd } => commands::villa::handle(cmd, &ctx).await,
        Commands::VillaNumber { api_version, cmd } => commands::villa_number::handle(cmd, api_version, &ctx).await,
    }
}
