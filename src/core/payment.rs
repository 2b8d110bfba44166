//! Payment business logic - Plans, lookups and status changes.
//!
//! Installments are stored one row per (student, month, year). Inserting a
//! schedule skips periods that already have a payment, so re-running plan or
//! monthly generation never duplicates a charge. Status changes follow the
//! lifecycle in [`PaymentStatus::can_transition_to`].

use crate::{
    core::{schedule, student},
    entities::{Payment, PaymentStatus, payment},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Result of persisting a generated schedule.
#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    /// Rows that were inserted
    pub created: Vec<payment::Model>,
    /// Periods skipped because a payment already existed
    pub skipped: usize,
}

/// Display label for a payment, including the derived "overdue" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentLabel {
    /// Pending and not yet due
    Pending,
    /// Received
    Paid,
    /// Pending with a due date before today
    Overdue,
    /// Written off
    Canceled,
}

impl PaymentLabel {
    /// Label text
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for PaymentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a payment counts as overdue on `today`.
#[must_use]
pub fn is_overdue(payment: &payment::Model, today: NaiveDate) -> bool {
    payment.status == PaymentStatus::Pending && payment.due_date < today
}

/// Computes the display label of a payment on `today`.
#[must_use]
pub fn payment_label(payment: &payment::Model, today: NaiveDate) -> PaymentLabel {
    match payment.status {
        PaymentStatus::Paid => PaymentLabel::Paid,
        PaymentStatus::Canceled => PaymentLabel::Canceled,
        PaymentStatus::Pending if is_overdue(payment, today) => PaymentLabel::Overdue,
        PaymentStatus::Pending => PaymentLabel::Pending,
    }
}

/// Finds the payment for a student's billing period, if any.
pub async fn find_payment_for_period<C>(
    db: &C,
    phone: &str,
    year: i32,
    month: i32,
) -> Result<Option<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .filter(payment::Column::Phone.eq(phone))
        .filter(payment::Column::Year.eq(year))
        .filter(payment::Column::Month.eq(month))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts generated installments, skipping periods that already have a payment.
pub async fn insert_scheduled_payments<C>(
    db: &C,
    scheduled: &[schedule::ScheduledPayment],
) -> Result<PlanOutcome>
where
    C: ConnectionTrait,
{
    let mut outcome = PlanOutcome::default();

    for item in scheduled {
        let month = i32::try_from(item.month)?;
        if find_payment_for_period(db, &item.phone, item.year, month)
            .await?
            .is_some()
        {
            debug!(
                "Payment for {} {}-{:02} already exists, skipping",
                item.phone, item.year, item.month
            );
            outcome.skipped += 1;
            continue;
        }

        let model = payment::ActiveModel {
            phone: Set(item.phone.clone()),
            amount: Set(item.amount),
            due_date: Set(item.due_date),
            status: Set(item.status),
            payment_date: Set(None),
            payment_method: Set(None),
            month: Set(month),
            year: Set(item.year),
            comments: Set(None),
            installment: Set(item.installment),
            total_installments: Set(item.total_installments),
            ..Default::default()
        }
        .insert(db)
        .await?;
        outcome.created.push(model);
    }

    Ok(outcome)
}

/// Generates and stores a payment plan for an existing student.
///
/// Periods that already have a payment are skipped and counted in
/// [`PlanOutcome::skipped`].
pub async fn create_payment_plan(
    db: &DatabaseConnection,
    request: &schedule::ScheduleRequest,
) -> Result<PlanOutcome> {
    let student = student::require_student(db, &request.phone).await?;
    let request = schedule::ScheduleRequest {
        phone: student.phone,
        ..request.clone()
    };
    let scheduled = schedule::generate_monthly_payments(&request)?;

    let txn = db.begin().await?;
    let outcome = insert_scheduled_payments(&txn, &scheduled).await?;
    txn.commit().await?;

    info!(
        "Payment plan for {}: {} created, {} skipped",
        request.phone,
        outcome.created.len(),
        outcome.skipped
    );
    Ok(outcome)
}

/// Finds a payment by id.
pub async fn get_payment_by_id(
    db: &DatabaseConnection,
    payment_id: i64,
) -> Result<Option<payment::Model>> {
    Payment::find_by_id(payment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a student's payments ordered by due date.
pub async fn get_payments_for_student<C>(db: &C, phone: &str) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    let phone = student::normalize_phone(phone)?;
    Payment::find()
        .filter(payment::Column::Phone.eq(phone))
        .order_by_asc(payment::Column::DueDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every payment ordered by due date, then id.
pub async fn get_all_payments<C>(db: &C) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .order_by_asc(payment::Column::DueDate)
        .order_by_asc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every payment billed for the given period.
pub async fn get_payments_for_period<C>(
    db: &C,
    year: i32,
    month: i32,
) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .filter(payment::Column::Year.eq(year))
        .filter(payment::Column::Month.eq(month))
        .order_by_asc(payment::Column::DueDate)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn transition(
    db: &DatabaseConnection,
    payment_id: i64,
    next: PaymentStatus,
) -> Result<payment::ActiveModel> {
    let existing = get_payment_by_id(db, payment_id)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })?;

    if !existing.status.can_transition_to(next) {
        return Err(Error::InvalidTransition {
            id: payment_id,
            from: existing.status.to_string(),
            to: next.to_string(),
        });
    }

    let mut active: payment::ActiveModel = existing.into();
    active.status = Set(next);
    Ok(active)
}

/// Records that a pending payment was received.
///
/// # Errors
/// [`Error::PaymentNotFound`] for an unknown id and [`Error::InvalidTransition`]
/// if the payment is not pending.
pub async fn mark_payment_paid(
    db: &DatabaseConnection,
    payment_id: i64,
    payment_date: NaiveDate,
    payment_method: Option<String>,
) -> Result<payment::Model> {
    let mut active = transition(db, payment_id, PaymentStatus::Paid).await?;
    active.payment_date = Set(Some(payment_date));
    active.payment_method = Set(payment_method
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty()));
    let updated = active.update(db).await?;

    info!(
        "Payment {} for {} marked paid on {}",
        updated.id, updated.phone, payment_date
    );
    Ok(updated)
}

/// Writes off a pending payment.
pub async fn cancel_payment(db: &DatabaseConnection, payment_id: i64) -> Result<payment::Model> {
    let active = transition(db, payment_id, PaymentStatus::Canceled).await?;
    let updated = active.update(db).await?;

    info!("Payment {} for {} canceled", updated.id, updated.phone);
    Ok(updated)
}

/// Deletes a single payment.
pub async fn delete_payment(db: &DatabaseConnection, payment_id: i64) -> Result<()> {
    let result = Payment::delete_by_id(payment_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::PaymentNotFound { id: payment_id });
    }
    Ok(())
}

/// Deletes every payment of a student, returning how many were removed.
pub async fn delete_student_payments(db: &DatabaseConnection, phone: &str) -> Result<u64> {
    let phone = student::normalize_phone(phone)?;
    let result = Payment::delete_many()
        .filter(payment::Column::Phone.eq(phone))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
