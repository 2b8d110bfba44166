//! Database configuration module for Tertulia Desk.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.
//! The one constraint entities cannot express, the composite unique index on
//! `payments(phone, month, year)`, is created here as well.

use crate::entities::{Internship, InternshipParticipant, Payment, Student, SystemState, payment};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/tertulia.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the `SQLite` database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file under `data/` if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let url = get_database_url();
    if let Some(parent) = sqlite_file_parent(&url) {
        std::fs::create_dir_all(parent)?;
    }
    Database::connect(&url).await.map_err(Into::into)
}

/// Directory that must exist for a file-backed `SQLite` URL.
fn sqlite_file_parent(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://")?.split('?').next()?;
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

async fn create_table_for<E, C>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables (if missing) plus the unique payment-period index.
///
/// Safe to call on every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Parents before children so foreign keys resolve
    create_table_for(db, &schema, Student).await?;
    create_table_for(db, &schema, Payment).await?;
    create_table_for(db, &schema, Internship).await?;
    create_table_for(db, &schema, InternshipParticipant).await?;
    create_table_for(db, &schema, SystemState).await?;

    let payment_period_index = Index::create()
        .name("idx_payments_student_period")
        .table(Payment)
        .col(payment::Column::Phone)
        .col(payment::Column::Month)
        .col(payment::Column::Year)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&payment_period_index)).await?;

    let participant_index = Index::create()
        .name("idx_internship_participants_unique")
        .table(InternshipParticipant)
        .col(crate::entities::internship_participant::Column::InternshipId)
        .col(crate::entities::internship_participant::Column::Phone)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&participant_index)).await?;

    Ok(())
}
