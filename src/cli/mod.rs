pub mod commands;
pub mod config;
pub mod utils;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::pages::{AssumeYes, Confirm};
use crate::routing::{Navigation, Router};
use crate::session::{FileSessionStore, Session, SessionContext};

#[derive(Parser)]
#[command(name = "mediconnect")]
#[command(about = "MediConnect CLI - clinic client for admins, doctors and patients")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, short = 'y', global = true, help = "Answer yes to confirmation prompts")]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, registration and session status")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Navigate to a path and render the page found there")]
    Open {
        #[arg(help = "Path such as /patient/dashboard or /patient/booking?doctor=4")]
        path: String,
    },

    #[command(about = "Admin panel: users, doctors, specialties, appointments")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },

    #[command(about = "Doctor panel: appointments, availability, profile")]
    Doctor {
        #[command(subcommand)]
        cmd: commands::doctor::DoctorCommands,
    },

    #[command(about = "Patient panel: search, booking, appointments, profile")]
    Patient {
        #[command(subcommand)]
        cmd: commands::patient::PatientCommands,
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

/// Everything a command handler needs: one session, one client, one router
pub struct CliContext {
    pub config: AppConfig,
    pub session: SessionContext,
    pub api: ApiClient,
    pub router: Router,
    pub output_format: OutputFormat,
    pub assume_yes: bool,
}

impl CliContext {
    pub fn new(config: &AppConfig, output_format: OutputFormat, assume_yes: bool) -> anyhow::Result<Self> {
        let session_file = config::session_file(config)?;
        let session = SessionContext::new(Arc::new(FileSessionStore::new(session_file)));
        let api = ApiClient::from_config(config, session.clone())?;
        Ok(Self {
            config: config.clone(),
            router: Router::new(session.clone()),
            session,
            api,
            output_format,
            assume_yes,
        })
    }

    pub fn confirm(&self) -> Box<dyn Confirm> {
        if self.assume_yes {
            Box::new(AssumeYes)
        } else {
            Box::new(utils::StdinConfirm)
        }
    }

    /// Pass through the auth gate for `path`, returning the admitted session
    pub fn enter(&self, path: &str) -> anyhow::Result<Session> {
        match self.router.navigate(path) {
            Navigation::Render {
                session: Some(session),
                ..
            } => Ok(session),
            Navigation::Render { session: None, .. } => {
                Err(anyhow::anyhow!("{} is not a protected page", path))
            }
            Navigation::Redirect { to, reason } => {
                tracing::debug!(%path, %reason, "Command refused by auth gate");
                Err(ClientError::Redirected(format!("{} ({}); run `mediconnect auth login`", to, reason)).into())
            }
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let ctx = CliContext::new(crate::config::config(), output_format, cli.yes)?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx).await,
        Commands::Open { path } => commands::open::handle(&path, &ctx).await,
        Commands::Admin { cmd } => commands::admin::handle(cmd, &ctx).await,
        Commands::Doctor { cmd } => commands::doctor::handle(cmd, &ctx).await,
        Commands::Patient { cmd } => commands::patient::handle(cmd, &ctx).await,
    }
}
