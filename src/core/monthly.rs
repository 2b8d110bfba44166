//! Monthly payment generation.
//!
//! Bills every active student for a calendar month in one pass. Students that
//! already have a payment for the month are skipped, so the pass can be re-run
//! safely. The latest month processed is tracked in the `system_state` table so
//! the bot can tell whether the current month still needs a run.

use crate::{
    core::{payment, schedule, student},
    entities::{Payment, SystemState, payment as payment_entity, system_state},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::info;

const LAST_MONTHLY_GENERATION_KEY: &str = "last_monthly_generation";

/// A payment created for one student during a monthly run.
#[derive(Debug, Clone)]
pub struct GeneratedPayment {
    /// Student name
    pub student_name: String,
    /// Student phone
    pub phone: String,
    /// Amount billed
    pub amount: f64,
    /// Due date of the new payment
    pub due_date: NaiveDate,
}

/// Outcome of a monthly generation run.
#[derive(Debug, Clone)]
pub struct MonthlyGenerationResult {
    /// Billing year
    pub year: i32,
    /// Billing month (1-12)
    pub month: u32,
    /// Payments created in this run
    pub created: Vec<GeneratedPayment>,
    /// Active students that already had a payment for the month
    pub skipped_existing: usize,
    /// Active students whose enrollment starts after the month
    pub skipped_not_enrolled: usize,
}

impl MonthlyGenerationResult {
    /// Total amount billed by this run
    #[must_use]
    pub fn total_amount(&self) -> f64 {
        self.created.iter().map(|p| p.amount).sum()
    }
}

fn format_period(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

fn parse_period(value: &str) -> Result<(i32, u32)> {
    let parsed = NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").map_err(|e| {
        Error::Config {
            message: format!("Failed to parse last generation period '{value}': {e}"),
        }
    })?;
    Ok((parsed.year(), parsed.month()))
}

/// Retrieves the last billing period generated, as `(year, month)`.
pub async fn get_last_generation_period<C>(db: &C) -> Result<Option<(i32, u32)>>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_MONTHLY_GENERATION_KEY))
        .one(db)
        .await?;

    state.map(|s| parse_period(&s.value)).transpose()
}

/// Returns true if the month containing `today` has not been generated yet.
pub async fn is_monthly_generation_needed(db: &DatabaseConnection, today: NaiveDate) -> Result<bool> {
    let last = get_last_generation_period(db).await?;
    Ok(last != Some((today.year(), today.month())))
}

/// Records `(year, month)` as the last generated period unless a later one
/// is already recorded.
async fn advance_last_generation_period<C>(db: &C, year: i32, month: u32) -> Result<()>
where
    C: ConnectionTrait,
{
    let value = format_period(year, month);
    let now = Utc::now().naive_utc();

    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_MONTHLY_GENERATION_KEY))
        .one(db)
        .await?;

    if let Some(state) = existing {
        if parse_period(&state.value).is_ok_and(|last| last >= (year, month)) {
            return Ok(());
        }
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        system_state::ActiveModel {
            key: Set(LAST_MONTHLY_GENERATION_KEY.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// Creates the month's payment for every active student that lacks one.
///
/// The due date follows the student's payment day; students who enrolled
/// during the month after their payment day are billed on their enrollment
/// date instead. All inserts happen in a single transaction.
pub async fn generate_payments_for_month(
    db: &DatabaseConnection,
    year: i32,
    month: u32,
) -> Result<MonthlyGenerationResult> {
    let first_day = schedule::month_start(year, month)?;
    let last_day = first_day
        .with_day(schedule::days_in_month(year, month)?)
        .ok_or_else(|| Error::InvalidSchedule {
            reason: format!("invalid month {}", format_period(year, month)),
        })?;

    let txn = db.begin().await?;

    let mut result = MonthlyGenerationResult {
        year,
        month,
        created: Vec::new(),
        skipped_existing: 0,
        skipped_not_enrolled: 0,
    };

    for student in student::get_active_students(&txn).await? {
        if student.enrollment_date > last_day {
            result.skipped_not_enrolled += 1;
            continue;
        }

        let existing_count = Payment::find()
            .filter(payment_entity::Column::Phone.eq(student.phone.as_str()))
            .count(&txn)
            .await?;
        let installment = i32::try_from(existing_count)? + 1;

        let mut scheduled = schedule::generate_monthly_payments(&schedule::ScheduleRequest {
            phone: student.phone.clone(),
            monthly_fee: student.monthly_fee,
            enrollment_date: student.enrollment_date.max(first_day),
            installments: 1,
            end_date: None,
            due_day: student.payment_day,
        })?;
        for item in &mut scheduled {
            item.installment = installment;
            item.total_installments = student.payment_plan.max(installment);
        }

        let outcome = payment::insert_scheduled_payments(&txn, &scheduled).await?;
        result.skipped_existing += outcome.skipped;
        result
            .created
            .extend(outcome.created.into_iter().map(|p| GeneratedPayment {
                student_name: student.name.clone(),
                phone: p.phone,
                amount: p.amount,
                due_date: p.due_date,
            }));
    }

    advance_last_generation_period(&txn, year, month).await?;
    txn.commit().await?;

    info!(
        "Monthly generation {}: {} created, {} already billed",
        format_period(year, month),
        result.created.len(),
        result.skipped_existing
    );

    Ok(result)
}

/// Runs monthly generation for the month containing `today` unless it already ran.
///
/// # Returns
/// * `Ok(Some(result))` - Generation was performed
/// * `Ok(None)` - The month was already generated
pub async fn process_monthly_generation(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Option<MonthlyGenerationResult>> {
    if !is_monthly_generation_needed(db, today).await? {
        return Ok(None);
    }
    generate_payments_for_month(db, today.year(), today.month())
        .await
        .map(Some)
}

/// Formats a generation result into a human-readable summary string.
pub fn format_monthly_generation_summary(result: &MonthlyGenerationResult) -> Result<String> {
    use std::fmt::Write;

    let mut summary = format!(
        "Monthly billing - {} - {} payments created ({})\n",
        format_period(result.year, result.month),
        result.created.len(),
        crate::core::report::format_currency(result.total_amount())
    );
    writeln!(
        summary,
        "  Already billed: {} | Not yet enrolled: {}",
        result.skipped_existing, result.skipped_not_enrolled
    )?;

    for item in &result.created {
        writeln!(
            summary,
            "  {} ({}) - {} due {}",
            item.student_name,
            student::format_phone(&item.phone),
            crate::core::report::format_currency(item.amount),
            item.due_date.format("%d/%m/%Y")
        )?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_generation_needed_without_history() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(is_monthly_generation_needed(&db, date(2024, 5, 1)).await?);
        assert!(get_last_generation_period(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_for_month_bills_missing_students() -> Result<()> {
        let (db, _student, _payments) = setup_with_student().await?;
        // Enrolled in May, plan not yet created for April
        create_custom_student(&db, "21912345678", "Bruno", date(2024, 5, 20), 250.0, 1).await?;

        // April: Ana's plan ended in March, Bruno not enrolled yet
        let april = generate_payments_for_month(&db, 2024, 4).await?;
        assert_eq!(april.created.len(), 1);
        assert_eq!(april.created[0].phone, "11987654321");
        assert_eq!(april.created[0].due_date, date(2024, 4, 10));
        assert_eq!(april.skipped_not_enrolled, 1);

        let stored = payment::get_payments_for_student(&db, "11987654321").await?;
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[3].installment, 4);
        assert_eq!(stored[3].total_installments, 4);

        assert_eq!(get_last_generation_period(&db).await?, Some((2024, 4)));
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_for_month_is_idempotent() -> Result<()> {
        let (db, _student, _payments) = setup_with_student().await?;

        let february = generate_payments_for_month(&db, 2024, 2).await?;
        assert!(february.created.is_empty());
        assert_eq!(february.skipped_existing, 1);

        let june = generate_payments_for_month(&db, 2024, 6).await?;
        let again = generate_payments_for_month(&db, 2024, 6).await?;
        assert_eq!(june.created.len(), 1);
        assert!(again.created.is_empty());
        assert_eq!(again.skipped_existing, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_generation_skips_canceled_students() -> Result<()> {
        let (db, student, _payments) = setup_with_student().await?;
        student::cancel_student(&db, &student.phone, date(2024, 3, 15), false).await?;

        let april = generate_payments_for_month(&db, 2024, 4).await?;
        assert!(april.created.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_process_monthly_generation_runs_once() -> Result<()> {
        let (db, _student, _payments) = setup_with_student().await?;
        let today = date(2024, 7, 3);

        let first = process_monthly_generation(&db, today).await?;
        assert!(first.is_some());
        assert!(!is_monthly_generation_needed(&db, today).await?);

        let second = process_monthly_generation(&db, date(2024, 7, 28)).await?;
        assert!(second.is_none());

        assert!(is_monthly_generation_needed(&db, date(2024, 8, 1)).await?);
        process_monthly_generation(&db, date(2024, 8, 1)).await?;

        // The period marker is overwritten, not duplicated
        let count = SystemState::find()
            .filter(system_state::Column::Key.eq(LAST_MONTHLY_GENERATION_KEY))
            .count(&db)
            .await?;
        assert_eq!(count, 1);
        assert_eq!(get_last_generation_period(&db).await?, Some((2024, 8)));
        Ok(())
    }

    #[tokio::test]
    async fn test_format_summary() -> Result<()> {
        let result = MonthlyGenerationResult {
            year: 2024,
            month: 4,
            created: vec![GeneratedPayment {
                student_name: "Ana".to_string(),
                phone: "11987654321".to_string(),
                amount: 300.0,
                due_date: date(2024, 4, 10),
            }],
            skipped_existing: 2,
            skipped_not_enrolled: 0,
        };

        let summary = format_monthly_generation_summary(&result)?;
        assert!(summary.contains("2024-04"));
        assert!(summary.contains("Ana ((11) 98765-4321)"));
        assert!(summary.contains("10/04/2024"));
        assert!(summary.contains("Already billed: 2"));
        assert_eq!(result.total_amount(), 300.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_backfilling_a_past_month_keeps_marker() -> Result<()> {
        let (db, _student, _payments) = setup_with_student().await?;

        generate_payments_for_month(&db, 2024, 6).await?;
        let april = generate_payments_for_month(&db, 2024, 4).await?;
        assert_eq!(april.created.len(), 1);

        assert_eq!(get_last_generation_period(&db).await?, Some((2024, 6)));
        assert!(!is_monthly_generation_needed(&db, date(2024, 6, 20)).await?);
        Ok(())
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("2024-03").unwrap(), (2024, 3));
        assert!(parse_period("March").is_err());
    }
}
