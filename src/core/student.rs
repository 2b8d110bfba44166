//! Student business logic - Enrollment, lookup, cancellation and removal.
//!
//! Students are keyed by phone number. Every function that accepts a phone
//! normalizes it first, so "(11) 98765-4321" and "11987654321" name the same
//! student. Enrollment creates the student's payment plan in the same database
//! transaction as the student row.

use crate::{
    core::{payment, schedule},
    entities::{
        InternshipParticipant, Payment, Student, StudentStatus, internship_participant,
        payment as payment_entity, student,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Strips formatting from a phone number and checks its length.
///
/// Brazilian numbers have a two-digit area code followed by an eight or
/// nine digit subscriber number, so 10 or 11 digits are accepted.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if (10..=11).contains(&digits.len()) {
        Ok(digits)
    } else {
        Err(Error::InvalidPhone {
            phone: raw.to_string(),
        })
    }
}

/// Formats a normalized phone number for display, e.g. `(11) 98765-4321`.
///
/// Anything that is not 10 or 11 digits is returned unchanged.
#[must_use]
pub fn format_phone(phone: &str) -> String {
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return phone.to_string();
    }
    match phone.len() {
        11 => format!("({}) {}-{}", &phone[..2], &phone[2..7], &phone[7..]),
        10 => format!("({}) {}-{}", &phone[..2], &phone[2..6], &phone[6..]),
        _ => phone.to_string(),
    }
}

/// Data collected on the enrollment form.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    /// Phone number in any common format
    pub phone: String,
    /// Full name
    pub name: String,
    /// Enrollment date, also the start of the payment plan
    pub enrollment_date: NaiveDate,
    /// Monthly tuition fee
    pub monthly_fee: f64,
    /// Due day of month for installments
    pub payment_day: i32,
    /// Number of monthly installments
    pub payment_plan: i32,
    /// Brazilian taxpayer id
    pub cpf: Option<String>,
    /// Contact e-mail
    pub email: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Course name
    pub course_type: Option<String>,
    /// How the student found the course
    pub registration_origin: Option<String>,
    /// Staff notes
    pub comments: Option<String>,
}

impl NewStudent {
    /// Creates enrollment data with the required fields and no optional ones.
    #[must_use]
    pub fn new(
        phone: impl Into<String>,
        name: impl Into<String>,
        enrollment_date: NaiveDate,
        monthly_fee: f64,
        payment_day: i32,
        payment_plan: i32,
    ) -> Self {
        Self {
            phone: phone.into(),
            name: name.into(),
            enrollment_date,
            monthly_fee,
            payment_day,
            payment_plan,
            cpf: None,
            email: None,
            address: None,
            course_type: None,
            registration_origin: None,
            comments: None,
        }
    }
}

/// Editable student details. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentUpdate {
    /// New name
    pub name: Option<String>,
    /// New e-mail
    pub email: Option<String>,
    /// New address
    pub address: Option<String>,
    /// New course
    pub course_type: Option<String>,
    /// New notes
    pub comments: Option<String>,
    /// New monthly fee; affects only payments generated afterwards
    pub monthly_fee: Option<f64>,
    /// New due day; affects only payments generated afterwards
    pub payment_day: Option<i32>,
}

fn validate_fee(amount: f64) -> Result<()> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Enrolls a student and creates their payment plan atomically.
///
/// Returns the stored student together with the installments that were created.
///
/// # Errors
/// - [`Error::InvalidPhone`], [`Error::Validation`] or [`Error::InvalidAmount`] for bad input
/// - [`Error::InvalidSchedule`] if the payment plan would be empty
/// - [`Error::DuplicateStudent`] if the phone number is already registered
pub async fn enroll_student(
    db: &DatabaseConnection,
    new_student: NewStudent,
) -> Result<(student::Model, Vec<payment_entity::Model>)> {
    let phone = normalize_phone(&new_student.phone)?;
    let name = new_student.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Student name cannot be empty".to_string(),
        });
    }
    validate_fee(new_student.monthly_fee)?;

    // Build the schedule before touching the database so bad terms fail fast
    let plan = schedule::generate_monthly_payments(&schedule::ScheduleRequest {
        phone: phone.clone(),
        monthly_fee: new_student.monthly_fee,
        enrollment_date: new_student.enrollment_date,
        installments: new_student.payment_plan,
        end_date: None,
        due_day: new_student.payment_day,
    })?;
    let payment_day = i32::try_from(schedule::normalize_due_day(new_student.payment_day))?;

    let txn = db.begin().await?;

    if Student::find_by_id(phone.clone()).one(&txn).await?.is_some() {
        return Err(Error::DuplicateStudent { phone });
    }

    let student = student::ActiveModel {
        phone: Set(phone.clone()),
        name: Set(name),
        cpf: Set(non_empty(new_student.cpf)),
        email: Set(non_empty(new_student.email)),
        address: Set(non_empty(new_student.address)),
        enrollment_date: Set(new_student.enrollment_date),
        monthly_fee: Set(new_student.monthly_fee),
        course_type: Set(non_empty(new_student.course_type)),
        status: Set(StudentStatus::Active),
        comments: Set(non_empty(new_student.comments)),
        registration_origin: Set(non_empty(new_student.registration_origin)),
        payment_day: Set(payment_day),
        payment_plan: Set(new_student.payment_plan),
        cancellation_date: Set(None),
        cancellation_fee_paid: Set(false),
    }
    .insert(&txn)
    .await?;

    let outcome = payment::insert_scheduled_payments(&txn, &plan).await?;

    txn.commit().await?;

    info!(
        "Enrolled student {} ({}) with {} installments",
        student.name,
        student.phone,
        outcome.created.len()
    );

    Ok((student, outcome.created))
}

/// Finds a student by phone number.
pub async fn get_student_by_phone<C>(db: &C, phone: &str) -> Result<Option<student::Model>>
where
    C: ConnectionTrait,
{
    let phone = normalize_phone(phone)?;
    Student::find_by_id(phone)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a student by phone number, failing if absent.
pub async fn require_student<C>(db: &C, phone: &str) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    get_student_by_phone(db, phone)
        .await?
        .ok_or_else(|| Error::StudentNotFound {
            phone: phone.to_string(),
        })
}

/// Retrieves every student, ordered alphabetically by name.
pub async fn get_all_students<C>(db: &C) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .order_by_asc(student::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every active student, ordered alphabetically by name.
pub async fn get_active_students<C>(db: &C) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .filter(student::Column::Status.eq(StudentStatus::Active))
        .order_by_asc(student::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds students whose name contains `partial` (case-insensitive for ASCII).
pub async fn search_students_by_name(
    db: &DatabaseConnection,
    partial: &str,
) -> Result<Vec<student::Model>> {
    Student::find()
        .filter(student::Column::Name.contains(partial.trim()))
        .order_by_asc(student::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies edits to a student's details.
pub async fn update_student_details(
    db: &DatabaseConnection,
    phone: &str,
    update: StudentUpdate,
) -> Result<student::Model> {
    let existing = require_student(db, phone).await?;
    let mut active: student::ActiveModel = existing.into();

    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation {
                message: "Student name cannot be empty".to_string(),
            });
        }
        active.name = Set(name);
    }
    if let Some(fee) = update.monthly_fee {
        validate_fee(fee)?;
        active.monthly_fee = Set(fee);
    }
    if let Some(day) = update.payment_day {
        active.payment_day = Set(i32::try_from(schedule::normalize_due_day(day))?);
    }
    if update.email.is_some() {
        active.email = Set(non_empty(update.email));
    }
    if update.address.is_some() {
        active.address = Set(non_empty(update.address));
    }
    if update.course_type.is_some() {
        active.course_type = Set(non_empty(update.course_type));
    }
    if update.comments.is_some() {
        active.comments = Set(non_empty(update.comments));
    }

    active.update(db).await.map_err(Into::into)
}

/// Marks a student's enrollment as canceled.
///
/// Payments are left untouched: the overdue detector ignores canceled
/// students, and staff can cancel individual installments if needed.
pub async fn cancel_student(
    db: &DatabaseConnection,
    phone: &str,
    cancellation_date: NaiveDate,
    cancellation_fee_paid: bool,
) -> Result<student::Model> {
    let existing = require_student(db, phone).await?;
    if !existing.is_active() {
        return Err(Error::Validation {
            message: format!("Student {} is already canceled", existing.phone),
        });
    }

    let mut active: student::ActiveModel = existing.into();
    active.status = Set(StudentStatus::Canceled);
    active.cancellation_date = Set(Some(cancellation_date));
    active.cancellation_fee_paid = Set(cancellation_fee_paid);
    let updated = active.update(db).await?;

    info!("Canceled enrollment of {} on {}", updated.phone, cancellation_date);
    Ok(updated)
}

/// Deletes a student along with their payments and internship participation.
///
/// Returns the number of payments removed.
pub async fn delete_student(db: &DatabaseConnection, phone: &str) -> Result<u64> {
    let phone = normalize_phone(phone)?;
    let txn = db.begin().await?;

    if Student::find_by_id(phone.clone()).one(&txn).await?.is_none() {
        return Err(Error::StudentNotFound { phone });
    }

    let payments = Payment::delete_many()
        .filter(payment_entity::Column::Phone.eq(phone.as_str()))
        .exec(&txn)
        .await?;
    InternshipParticipant::delete_many()
        .filter(internship_participant::Column::Phone.eq(phone.as_str()))
        .exec(&txn)
        .await?;
    Student::delete_by_id(phone.clone()).exec(&txn).await?;

    txn.commit().await?;

    info!(
        "Deleted student {phone} and {} payments",
        payments.rows_affected
    );
    Ok(payments.rows_affected)
}
