pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

use client::ApiClient;

#[derive(Parser)]
#[command(name = "cafe")]
#[command(about = "Cafe CLI - talk to a running Cafe API server")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "CAFE_API_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the server"
    )]
    pub url: String,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check server, store and SMS health")]
    Health,

    #[command(about = "OTP registration, login and session inspection")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Kitchen order queue operations")]
    Order {
        #[arg(long, env = "CAFE_DEVICE_KEY", help = "Kitchen device key")]
        device_key: String,

        #[command(subcommand)]
        cmd: commands::order::OrderCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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
    let client = ApiClient::new(&cli.url)?;

    match cli.command {
        Commands::Health => commands::health::handle(&client, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(&client, cmd, output_format).await,
        Commands::Order { device_key, cmd } => {
            commands::order::handle(&client.with_device_key(device_key), cmd, output_format).await
        }
    }
}
