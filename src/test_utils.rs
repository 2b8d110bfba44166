//! Shared test utilities for `TertuliaDesk`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test students with sensible defaults.

use crate::{
    core::{internship, student},
    entities::{self, StudentStatus},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date. Panics on an invalid date.
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Enrolls a test student with sensible defaults.
///
/// # Defaults
/// * `enrollment_date`: 2024-01-15
/// * `monthly_fee`: 300.0
/// * `payment_day`: 10
/// * `payment_plan`: 3 installments
pub async fn create_test_student(
    db: &DatabaseConnection,
    phone: &str,
    name: &str,
) -> Result<entities::student::Model> {
    create_custom_student(db, phone, name, date(2024, 1, 15), 300.0, 3).await
}

/// Enrolls a test student with custom terms. The payment day is always 10.
pub async fn create_custom_student(
    db: &DatabaseConnection,
    phone: &str,
    name: &str,
    enrollment_date: NaiveDate,
    monthly_fee: f64,
    payment_plan: i32,
) -> Result<entities::student::Model> {
    let (model, _payments) = student::enroll_student(
        db,
        student::NewStudent::new(phone, name, enrollment_date, monthly_fee, 10, payment_plan),
    )
    .await?;
    Ok(model)
}

/// Sets up a database with one enrolled student.
/// Returns (db, student, payments) where payments are due
/// 2024-01-15, 2024-02-10 and 2024-03-10.
pub async fn setup_with_student() -> Result<(
    DatabaseConnection,
    entities::student::Model,
    Vec<entities::payment::Model>,
)> {
    let db = setup_test_db().await?;
    let (model, payments) = student::enroll_student(
        &db,
        student::NewStudent::new("11987654321", "Ana Souza", date(2024, 1, 15), 300.0, 10, 3),
    )
    .await?;
    Ok((db, model, payments))
}

/// Builds a student row without touching a database.
pub fn student_model(phone: &str, name: &str, active: bool) -> entities::student::Model {
    entities::student::Model {
        phone: phone.to_string(),
        name: name.to_string(),
        cpf: None,
        email: None,
        address: None,
        enrollment_date: date(2024, 1, 15),
        monthly_fee: 300.0,
        course_type: None,
        status: if active {
            StudentStatus::Active
        } else {
            StudentStatus::Canceled
        },
        comments: None,
        registration_origin: None,
        payment_day: 10,
        payment_plan: 3,
        cancellation_date: None,
        cancellation_fee_paid: false,
    }
}

/// Internship input dated 2024-03-02 with no optional details.
pub fn new_internship(topic: &str, hours: f64, participants: &[&str]) -> internship::NewInternship {
    internship::NewInternship {
        date: date(2024, 3, 2),
        topic: topic.to_string(),
        hours,
        location: None,
        supervisor: None,
        description: None,
        participants: participants.iter().map(ToString::to_string).collect(),
    }
}
