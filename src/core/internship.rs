//! Internship business logic - Logging supervised practice hours.
//!
//! An internship is one session (date, topic, hours) attended by one or more
//! students. Every participant is credited with the session's full hours.

use crate::{
    core::student,
    entities::{
        Internship, InternshipParticipant, Student, internship, internship_participant,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Data for a new internship session.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInternship {
    /// Day of the session
    pub date: NaiveDate,
    /// Subject practiced
    pub topic: String,
    /// Hours credited to each participant
    pub hours: f64,
    /// Where it took place
    pub location: Option<String>,
    /// Supervising interpreter
    pub supervisor: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Participant phone numbers in any common format
    pub participants: Vec<String>,
}

/// An internship together with its participant phones.
#[derive(Debug, Clone, PartialEq)]
pub struct InternshipWithParticipants {
    /// The stored session
    pub internship: internship::Model,
    /// Normalized participant phones
    pub participants: Vec<String>,
}

fn validate_hours(hours: f64) -> Result<()> {
    if hours.is_finite() && hours > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidHours { hours })
    }
}

/// Normalizes participant phones, dropping duplicates but keeping order.
fn normalize_participants(raw: &[String]) -> Result<Vec<String>> {
    let mut phones: Vec<String> = Vec::with_capacity(raw.len());
    for entry in raw.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        let phone = student::normalize_phone(entry)?;
        if !phones.contains(&phone) {
            phones.push(phone);
        }
    }
    Ok(phones)
}

/// Inserts an internship and its participant links with an existing connection.
///
/// Used by [`create_internship`] and by the legacy importer, which runs inside
/// its own transaction.
pub(crate) async fn insert_internship<C>(
    db: &C,
    new_internship: NewInternship,
) -> Result<InternshipWithParticipants>
where
    C: ConnectionTrait,
{
    let topic = new_internship.topic.trim().to_string();
    if topic.is_empty() {
        return Err(Error::Validation {
            message: "Internship topic cannot be empty".to_string(),
        });
    }
    validate_hours(new_internship.hours)?;

    let participants = normalize_participants(&new_internship.participants)?;
    if participants.is_empty() {
        return Err(Error::Validation {
            message: "An internship needs at least one participant".to_string(),
        });
    }

    let clean = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let stored = internship::ActiveModel {
        date: Set(new_internship.date),
        topic: Set(topic),
        hours: Set(new_internship.hours),
        location: Set(clean(new_internship.location)),
        supervisor: Set(clean(new_internship.supervisor)),
        description: Set(clean(new_internship.description)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for phone in &participants {
        internship_participant::ActiveModel {
            internship_id: Set(stored.id),
            phone: Set(phone.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(InternshipWithParticipants {
        internship: stored,
        participants,
    })
}

/// Logs a new internship session.
///
/// # Errors
/// - [`Error::Validation`] if the topic is empty or there are no participants
/// - [`Error::InvalidHours`] if hours is not a positive number
/// - [`Error::InvalidPhone`] if a participant phone is malformed
pub async fn create_internship(
    db: &DatabaseConnection,
    new_internship: NewInternship,
) -> Result<InternshipWithParticipants> {
    let txn = db.begin().await?;
    let created = insert_internship(&txn, new_internship).await?;
    txn.commit().await?;

    info!(
        "Logged internship {} '{}' ({}h, {} participants)",
        created.internship.id,
        created.internship.topic,
        created.internship.hours,
        created.participants.len()
    );
    Ok(created)
}

/// Retrieves every internship, most recent first.
pub async fn get_all_internships(db: &DatabaseConnection) -> Result<Vec<internship::Model>> {
    Internship::find()
        .order_by_desc(internship::Column::Date)
        .order_by_desc(internship::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the normalized participant phones of an internship.
pub async fn get_participants<C>(db: &C, internship_id: i64) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    let rows = InternshipParticipant::find()
        .filter(internship_participant::Column::InternshipId.eq(internship_id))
        .order_by_asc(internship_participant::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|p| p.phone).collect())
}

/// Retrieves the internships a student took part in, oldest first.
pub async fn get_internships_for_student(
    db: &DatabaseConnection,
    phone: &str,
) -> Result<Vec<internship::Model>> {
    let phone = student::normalize_phone(phone)?;
    let ids: Vec<i64> = InternshipParticipant::find()
        .filter(internship_participant::Column::Phone.eq(phone))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.internship_id)
        .collect();

    if ids.is_empty() {
        return Ok(Vec::new());
    }

    Internship::find()
        .filter(internship::Column::Id.is_in(ids))
        .order_by_asc(internship::Column::Date)
        .order_by_asc(internship::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes an internship and its participant links.
pub async fn delete_internship(db: &DatabaseConnection, internship_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    InternshipParticipant::delete_many()
        .filter(internship_participant::Column::InternshipId.eq(internship_id))
        .exec(&txn)
        .await?;
    let result = Internship::delete_by_id(internship_id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(Error::InternshipNotFound { id: internship_id });
    }

    txn.commit().await?;
    info!("Deleted internship {internship_id}");
    Ok(())
}

/// Total internship hours credited to a student.
pub async fn student_internship_hours(db: &DatabaseConnection, phone: &str) -> Result<f64> {
    Ok(get_internships_for_student(db, phone)
        .await?
        .iter()
        .map(|i| i.hours)
        .sum())
}

/// A student's internship hours grouped by topic, ordered by topic.
pub async fn hours_by_topic(db: &DatabaseConnection, phone: &str) -> Result<Vec<(String, f64)>> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for item in get_internships_for_student(db, phone).await? {
        *totals.entry(item.topic).or_insert(0.0) += item.hours;
    }
    Ok(totals.into_iter().collect())
}

/// Renders participants as `Name (phone)`.
///
/// Phones without a matching student are shown formatted but unnamed.
pub async fn format_participants(db: &DatabaseConnection, phones: &[String]) -> Result<String> {
    let names: HashMap<String, String> = Student::find()
        .filter(crate::entities::student::Column::Phone.is_in(phones.iter().cloned()))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.phone, s.name))
        .collect();

    Ok(phones
        .iter()
        .map(|phone| match names.get(phone) {
            Some(name) => format!("{name} ({})", student::format_phone(phone)),
            None => student::format_phone(phone),
        })
        .collect::<Vec<_>>()
        .join(", "))
}
