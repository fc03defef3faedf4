pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "remna-miniapp-api")]
#[command(about = "Telegram Mini App backend for Remna panel administration")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Listen port, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Validate configuration and check the panel API")]
    CheckEnv,

    #[command(about = "Sign Telegram init-data for local testing")]
    SignInitData {
        #[arg(long, help = "Telegram user id placed in the user field")]
        user_id: i64,
        #[arg(long, default_value = "Test", help = "First name placed in the user field")]
        first_name: String,
        #[arg(long, help = "auth_date in unix seconds, defaults to now")]
        auth_date: Option<i64>,
        #[arg(long, help = "Bot token, defaults to TELEGRAM_BOT_TOKEN")]
        bot_token: Option<String>,
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

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::CheckEnv => commands::check_env::handle(output_format).await,
        Commands::SignInitData {
            user_id,
            first_name,
            auth_date,
            bot_token,
        } => commands::sign::handle(user_id, first_name, auth_date, bot_token, output_format),
    }
}
