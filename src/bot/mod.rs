//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the `TertuliaDesk` application,
//! including all slash commands, autocomplete handlers, and bot context management.

/// Discord command implementations (students, payments, internships, reports, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::settings::AppConfig,
    core::student,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Longest reply Discord accepts in one message.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Shared data available to all bot commands.
/// This structure holds the database connection and the loaded configuration
/// that commands need to access.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Settings loaded at startup
    pub config: Arc<AppConfig>,
}

impl BotData {
    /// Creates a new `BotData` instance with the given database connection
    /// and configuration.
    #[must_use]
    pub const fn new(database: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self { database, config }
    }
}

/// Date used as "today" for a command invocation.
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parses an optional `YYYY-MM-DD` or `DD/MM/YYYY` argument, defaulting to `today`.
pub fn parse_date_arg(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(today);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| Error::Validation {
            message: format!("'{raw}' is not a date (use YYYY-MM-DD or DD/MM/YYYY)"),
        })
}

/// Cuts a reply to Discord's message limit on a line boundary.
#[must_use]
pub fn truncate_message(text: &str) -> String {
    const SUFFIX: &str = "\n…";
    if text.chars().count() <= MAX_MESSAGE_LEN {
        return text.to_string();
    }

    let budget = MAX_MESSAGE_LEN - SUFFIX.chars().count();
    let mut out = String::new();
    for line in text.lines() {
        if out.chars().count() + line.chars().count() + 1 > budget {
            break;
        }
        out.push_str(line);
        out.push('\n');
    }
    if out.is_empty() {
        out = text.chars().take(budget).collect();
    }
    out.push_str(SUFFIX);
    out
}

/// Display name for a student, e.g. `Ana Souza ((11) 98765-4321)`.
#[must_use]
pub fn student_label(model: &crate::entities::StudentModel) -> String {
    format!("{} ({})", model.name, student::format_phone(&model.phone))
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            let reply = if error.is_user_error() {
                warn!("Command `{}` rejected: {error}", ctx.command().name);
                format!("❌ {error}")
            } else {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
                "❌ Something went wrong. The error was logged.".to_string()
            };
            if let Err(e) = ctx.say(reply).await {
                error!("Failed to send error message: {e}");
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the poise framework and runs the Discord client until it stops.
pub async fn run_bot(
    token: String,
    config: Arc<AppConfig>,
    database: DatabaseConnection,
) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::enroll(),
                commands::student(),
                commands::students(),
                commands::cancel_student(),
                commands::edit_student(),
                commands::delete_student(),
                commands::payments(),
                commands::pay(),
                commands::cancel_payment(),
                commands::plan(),
                commands::delete_payment(),
                commands::clear_payments(),
                commands::overdue(),
                commands::generate_month(),
                commands::revenue(),
                commands::log_internship(),
                commands::internship_hours(),
                commands::delete_internship(),
                commands::report(),
                commands::export(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered {} commands", framework.options().commands.len());
                Ok(BotData::new(database, config))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Starting Discord client");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;
    client.start().await?;
    Ok(())
}
