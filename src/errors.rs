//! Unified error types for Tertulia Desk.
//!
//! Every fallible operation in the crate returns [`Result`], so errors from the
//! database, configuration, CSV files and the Discord framework all funnel into
//! one enum alongside the domain errors raised by the core modules.

use thiserror::Error;

/// All errors that can occur in the application.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or was invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable missing or unreadable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Legacy CSV file could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing a formatted reply failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Numeric conversion overflowed
    #[error("Number conversion error: {0}")]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// Serenity/Poise framework error
    #[error("Discord framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),

    /// No student registered under this phone number
    #[error("Student not found: {phone}")]
    StudentNotFound {
        /// Normalized phone number that was looked up
        phone: String,
    },

    /// A student with this phone number already exists
    #[error("Student already enrolled: {phone}")]
    DuplicateStudent {
        /// Normalized phone number that collided
        phone: String,
    },

    /// No payment with this id
    #[error("Payment not found: {id}")]
    PaymentNotFound {
        /// Payment id that was looked up
        id: i64,
    },

    /// No internship with this id
    #[error("Internship not found: {id}")]
    InternshipNotFound {
        /// Internship id that was looked up
        id: i64,
    },

    /// Monetary amount is negative or not a finite number
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Phone number does not normalize to 10 or 11 digits
    #[error("Invalid phone number: {phone}")]
    InvalidPhone {
        /// The rejected input
        phone: String,
    },

    /// Internship hours must be positive and finite
    #[error("Invalid internship hours: {hours}")]
    InvalidHours {
        /// The rejected value
        hours: f64,
    },

    /// Payment schedule parameters describe an empty or inverted range
    #[error("Invalid payment schedule: {reason}")]
    InvalidSchedule {
        /// Why the schedule was rejected
        reason: String,
    },

    /// Payment status change not allowed by the payment lifecycle
    #[error("Cannot change payment {id} from {from} to {to}")]
    InvalidTransition {
        /// Payment id
        id: i64,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Input failed validation
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the failed check
        message: String,
    },
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Returns true for errors caused by user input rather than the system.
    ///
    /// The bot layer replies to these inline instead of logging them as failures.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::StudentNotFound { .. }
                | Self::DuplicateStudent { .. }
                | Self::PaymentNotFound { .. }
                | Self::InternshipNotFound { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidPhone { .. }
                | Self::InvalidHours { .. }
                | Self::InvalidSchedule { .. }
                | Self::InvalidTransition { .. }
                | Self::Validation { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
