//! Legacy spreadsheet import and export.
//!
//! The school kept its records in three CSV files (`students.csv`,
//! `payments.csv`, `internships.csv`) whose headers drifted over time. Import
//! reads every column as optional text, repairs known header aliases, and
//! skips rows that cannot be turned into a valid record, logging a warning for
//! each. Each file is imported in a single transaction.

use crate::{
    core::{internship, student as student_logic},
    entities::{
        Internship, Payment, PaymentStatus, Student, StudentStatus, internship as internship_entity,
        payment, student,
    },
    errors::Result,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim, Writer};
use sea_orm::{DatabaseConnection, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Counts of what an import did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// New records inserted
    pub imported: usize,
    /// Existing records overwritten
    pub updated: usize,
    /// Rows rejected
    pub skipped: usize,
    /// Paid payments stored without a payment date
    pub missing_payment_date: usize,
}

impl ImportSummary {
    fn skip(&mut self, line: usize, reason: &str) {
        warn!("Skipping legacy row {line}: {reason}");
        self.skipped += 1;
    }
}

/// Summaries for a whole data directory. `None` means the file was absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyImport {
    /// Result of `students.csv`
    pub students: Option<ImportSummary>,
    /// Result of `payments.csv`
    pub payments: Option<ImportSummary>,
    /// Result of `internships.csv`
    pub internships: Option<ImportSummary>,
}

#[derive(Debug, Deserialize)]
struct StudentRow {
    phone: Option<String>,
    name: Option<String>,
    cpf: Option<String>,
    email: Option<String>,
    address: Option<String>,
    enrollment_date: Option<String>,
    monthly_fee: Option<String>,
    course_type: Option<String>,
    status: Option<String>,
    comments: Option<String>,
    registration_origin: Option<String>,
    payment_day: Option<String>,
    payment_plan: Option<String>,
    cancellation_date: Option<String>,
    cancellation_fee_paid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentRow {
    phone: Option<String>,
    amount: Option<String>,
    due_date: Option<String>,
    status: Option<String>,
    payment_status: Option<String>,
    payment_date: Option<String>,
    payment_method: Option<String>,
    month: Option<String>,
    year: Option<String>,
    comments: Option<String>,
    installment: Option<String>,
    total_installments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InternshipRow {
    phone: Option<String>,
    date: Option<String>,
    topic: Option<String>,
    hours: Option<String>,
    duration_hours: Option<String>,
    location: Option<String>,
    supervisor: Option<String>,
    description: Option<String>,
    students: Option<String>,
    participants: Option<String>,
}

#[derive(Debug, Serialize)]
struct StudentExport<'a> {
    phone: &'a str,
    name: &'a str,
    cpf: Option<&'a str>,
    email: Option<&'a str>,
    address: Option<&'a str>,
    enrollment_date: NaiveDate,
    monthly_fee: f64,
    course_type: Option<&'a str>,
    status: &'static str,
    comments: Option<&'a str>,
    registration_origin: Option<&'a str>,
    payment_day: i32,
    payment_plan: i32,
    cancellation_date: Option<NaiveDate>,
    cancellation_fee_paid: bool,
}

#[derive(Debug, Serialize)]
struct PaymentExport<'a> {
    id: i64,
    phone: &'a str,
    amount: f64,
    due_date: NaiveDate,
    status: &'static str,
    payment_date: Option<NaiveDate>,
    payment_method: Option<&'a str>,
    month: i32,
    year: i32,
    comments: Option<&'a str>,
    installment: i32,
    total_installments: i32,
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.replace(',', ".").parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Integers were often written back as floats (`10.0`).
fn parse_int(value: Option<&str>) -> Option<i32> {
    parse_number(value)
        .filter(|v| v.fract() == 0.0 && *v >= f64::from(i32::MIN) && *v <= f64::from(i32::MAX))
        .and_then(|v| format!("{v:.0}").parse().ok())
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
        })
        .ok()
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(str::to_ascii_lowercase).as_deref(),
        Some("true" | "1" | "yes" | "sim")
    )
}

/// Only an explicit active status (or none at all) keeps a student billable.
/// Suspended and graduated students are stored as canceled.
fn parse_student_status(value: Option<&str>, line: usize) -> StudentStatus {
    let Some(raw) = value else {
        return StudentStatus::Active;
    };
    match raw.to_lowercase().as_str() {
        "active" | "ativo" | "ativa" => StudentStatus::Active,
        "canceled" | "cancelled" | "cancelado" | "cancelada" | "inactive" | "inativo"
        | "suspended" | "suspenso" | "suspensa" | "graduated" | "formado" | "formada" => {
            StudentStatus::Canceled
        }
        _ => {
            warn!("Legacy row {line}: unknown student status '{raw}', storing as canceled");
            StudentStatus::Canceled
        }
    }
}

/// Stored `overdue` is a derived label, so it comes back as pending.
fn parse_payment_status(value: Option<&str>) -> PaymentStatus {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("paid" | "pago") => PaymentStatus::Paid,
        Some("canceled" | "cancelled" | "cancelado") => PaymentStatus::Canceled,
        _ => PaymentStatus::Pending,
    }
}

fn reader_for(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?)
}

/// Imports `students.csv`, upserting by phone.
///
/// Imported students get no payment plan; their payments come from
/// `payments.csv`.
pub async fn import_students_csv(db: &DatabaseConnection, path: &Path) -> Result<ImportSummary> {
    let mut reader = reader_for(path)?;
    let mut summary = ImportSummary::default();
    let txn = db.begin().await?;

    for (index, row) in reader.deserialize::<StudentRow>().enumerate() {
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                summary.skip(line, &e.to_string());
                continue;
            }
        };

        let Some(phone) = text(row.phone).and_then(|p| student_logic::normalize_phone(&p).ok())
        else {
            summary.skip(line, "missing or invalid phone");
            continue;
        };
        let Some(name) = text(row.name) else {
            summary.skip(line, "missing name");
            continue;
        };
        let Some(enrollment_date) = parse_date(text(row.enrollment_date).as_deref()) else {
            summary.skip(line, "missing or invalid enrollment date");
            continue;
        };
        let Some(monthly_fee) =
            parse_number(text(row.monthly_fee).as_deref()).filter(|fee| *fee >= 0.0)
        else {
            summary.skip(line, "missing or invalid monthly fee");
            continue;
        };

        let payment_day = i32::try_from(crate::core::schedule::normalize_due_day(
            parse_int(text(row.payment_day).as_deref()).unwrap_or(0),
        ))?;
        let payment_plan = parse_int(text(row.payment_plan).as_deref())
            .filter(|p| *p > 0)
            .unwrap_or(1);

        let model = student::ActiveModel {
            phone: Set(phone.clone()),
            name: Set(name),
            cpf: Set(text(row.cpf)),
            email: Set(text(row.email)),
            address: Set(text(row.address)),
            enrollment_date: Set(enrollment_date),
            monthly_fee: Set(monthly_fee),
            course_type: Set(text(row.course_type)),
            status: Set(parse_student_status(text(row.status).as_deref(), line)),
            comments: Set(text(row.comments)),
            registration_origin: Set(text(row.registration_origin)),
            payment_day: Set(payment_day),
            payment_plan: Set(payment_plan),
            cancellation_date: Set(parse_date(text(row.cancellation_date).as_deref())),
            cancellation_fee_paid: Set(parse_bool(text(row.cancellation_fee_paid).as_deref())),
        };

        if Student::find_by_id(phone).one(&txn).await?.is_some() {
            model.update(&txn).await?;
            summary.updated += 1;
        } else {
            model.insert(&txn).await?;
            summary.imported += 1;
        }
    }

    txn.commit().await?;
    info!("Imported students from {}: {summary:?}", path.display());
    Ok(summary)
}

/// Imports `payments.csv`, upserting by (phone, month, year).
///
/// Rows whose phone has no student are skipped.
pub async fn import_payments_csv(db: &DatabaseConnection, path: &Path) -> Result<ImportSummary> {
    let mut reader = reader_for(path)?;
    let mut summary = ImportSummary::default();
    let txn = db.begin().await?;

    for (index, row) in reader.deserialize::<PaymentRow>().enumerate() {
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                summary.skip(line, &e.to_string());
                continue;
            }
        };

        let Some(phone) = text(row.phone).and_then(|p| student_logic::normalize_phone(&p).ok())
        else {
            summary.skip(line, "missing or invalid phone");
            continue;
        };
        if Student::find_by_id(phone.clone()).one(&txn).await?.is_none() {
            summary.skip(line, "no student with this phone");
            continue;
        }
        let Some(due_date) = parse_date(text(row.due_date).as_deref()) else {
            summary.skip(line, "missing or invalid due date");
            continue;
        };
        let Some(amount) = parse_number(text(row.amount).as_deref()).filter(|a| *a >= 0.0) else {
            summary.skip(line, "missing or invalid amount");
            continue;
        };

        let month = parse_int(text(row.month).as_deref())
            .filter(|m| (1..=12).contains(m))
            .map_or_else(|| i32::try_from(due_date.month()), Ok)?;
        let year = parse_int(text(row.year).as_deref()).unwrap_or_else(|| due_date.year());
        let installment = parse_int(text(row.installment).as_deref()).unwrap_or(1);
        let total_installments =
            parse_int(text(row.total_installments).as_deref()).unwrap_or(installment);

        let status = parse_payment_status(
            text(row.status)
                .or_else(|| text(row.payment_status))
                .as_deref(),
        );
        let payment_date = parse_date(text(row.payment_date).as_deref());
        if status == PaymentStatus::Paid && payment_date.is_none() {
            // Collected revenue is keyed on the payment date, so these rows never count
            warn!("Legacy row {line}: paid payment for {phone} has no payment date");
            summary.missing_payment_date += 1;
        }

        let existing = crate::core::payment::find_payment_for_period(&txn, &phone, year, month)
            .await?;

        let mut model = payment::ActiveModel {
            phone: Set(phone),
            amount: Set(amount),
            due_date: Set(due_date),
            status: Set(status),
            payment_date: Set(payment_date),
            payment_method: Set(text(row.payment_method).map(|m| m.to_lowercase())),
            month: Set(month),
            year: Set(year),
            comments: Set(text(row.comments)),
            installment: Set(installment),
            total_installments: Set(total_installments),
            ..Default::default()
        };

        if let Some(existing) = existing {
            model.id = Set(existing.id);
            model.update(&txn).await?;
            summary.updated += 1;
        } else {
            model.insert(&txn).await?;
            summary.imported += 1;
        }
    }

    txn.commit().await?;
    info!("Imported payments from {}: {summary:?}", path.display());
    Ok(summary)
}

/// Imports `internships.csv`.
///
/// Participants are the row's `phone` plus the comma-separated `students`
/// list. A row matching an existing internship's date and topic is skipped.
pub async fn import_internships_csv(
    db: &DatabaseConnection,
    path: &Path,
) -> Result<ImportSummary> {
    let mut reader = reader_for(path)?;
    let mut summary = ImportSummary::default();
    let txn = db.begin().await?;

    for (index, row) in reader.deserialize::<InternshipRow>().enumerate() {
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                summary.skip(line, &e.to_string());
                continue;
            }
        };

        let Some(date) = parse_date(text(row.date).as_deref()) else {
            summary.skip(line, "missing or invalid date");
            continue;
        };
        let Some(topic) = text(row.topic) else {
            summary.skip(line, "missing topic");
            continue;
        };
        let Some(hours) =
            parse_number(text(row.hours).or_else(|| text(row.duration_hours)).as_deref())
        else {
            summary.skip(line, "missing or invalid hours");
            continue;
        };

        let already_imported = Internship::find()
            .filter(internship_entity::Column::Date.eq(date))
            .filter(internship_entity::Column::Topic.eq(topic.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if already_imported {
            summary.skip(line, "internship already imported");
            continue;
        }

        let mut participants: Vec<String> = text(row.phone).into_iter().collect();
        if let Some(list) = text(row.students).or_else(|| text(row.participants)) {
            participants.extend(list.split(',').map(str::to_string));
        }
        // Entries that are not phone numbers (e.g. bare names) are dropped
        participants.retain(|p| student_logic::normalize_phone(p).is_ok());

        let new_internship = internship::NewInternship {
            date,
            topic,
            hours,
            location: text(row.location),
            supervisor: text(row.supervisor),
            description: text(row.description),
            participants,
        };

        match internship::insert_internship(&txn, new_internship).await {
            Ok(_) => summary.imported += 1,
            Err(e) if e.is_user_error() => summary.skip(line, &e.to_string()),
            Err(e) => return Err(e),
        }
    }

    txn.commit().await?;
    info!("Imported internships from {}: {summary:?}", path.display());
    Ok(summary)
}

/// Imports whichever of the three legacy files exist in `dir`.
pub async fn import_legacy_dir(db: &DatabaseConnection, dir: &Path) -> Result<LegacyImport> {
    let mut result = LegacyImport::default();

    let students = dir.join("students.csv");
    if students.exists() {
        result.students = Some(import_students_csv(db, &students).await?);
    }
    let payments = dir.join("payments.csv");
    if payments.exists() {
        result.payments = Some(import_payments_csv(db, &payments).await?);
    }
    let internships = dir.join("internships.csv");
    if internships.exists() {
        result.internships = Some(import_internships_csv(db, &internships).await?);
    }

    Ok(result)
}

/// Writes every student to `path` using the canonical column set.
pub async fn export_students_csv(db: &DatabaseConnection, path: &Path) -> Result<usize> {
    let students = student_logic::get_all_students(db).await?;
    let mut writer = Writer::from_path(path)?;

    for s in &students {
        writer.serialize(StudentExport {
            phone: &s.phone,
            name: &s.name,
            cpf: s.cpf.as_deref(),
            email: s.email.as_deref(),
            address: s.address.as_deref(),
            enrollment_date: s.enrollment_date,
            monthly_fee: s.monthly_fee,
            course_type: s.course_type.as_deref(),
            status: s.status.as_str(),
            comments: s.comments.as_deref(),
            registration_origin: s.registration_origin.as_deref(),
            payment_day: s.payment_day,
            payment_plan: s.payment_plan,
            cancellation_date: s.cancellation_date,
            cancellation_fee_paid: s.cancellation_fee_paid,
        })?;
    }

    writer.flush()?;
    Ok(students.len())
}

/// Writes every payment to `path` using the canonical column set.
pub async fn export_payments_csv(db: &DatabaseConnection, path: &Path) -> Result<usize> {
    let payments = Payment::find()
        .order_by_asc(payment::Column::Phone)
        .order_by_asc(payment::Column::DueDate)
        .all(db)
        .await?;
    let mut writer = Writer::from_path(path)?;

    for p in &payments {
        writer.serialize(PaymentExport {
            id: p.id,
            phone: &p.phone,
            amount: p.amount,
            due_date: p.due_date,
            status: p.status.as_str(),
            payment_date: p.payment_date,
            payment_method: p.payment_method.as_deref(),
            month: p.month,
            year: p.year,
            comments: p.comments.as_deref(),
            installment: p.installment,
            total_installments: p.total_installments,
        })?;
    }

    writer.flush()?;
    Ok(payments.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::payment as payment_logic;
    use crate::test_utils::*;
    use std::fs;

    const STUDENTS: &str = "\
phone,name,cpf,email,address,enrollment_date,monthly_fee,course_type,status,comments,registration_origin,payment_day,payment_plan
(11) 98765-4321,Ana Souza,,ana@example.com,,2024-01-15,300.0,Libras Básico,active,,Instagram,10.0,12
21912345678,Bruno Lima,,,,15/02/2024,250,,canceled,,,35,
123,Broken Phone,,,,2024-01-01,100,,active,,,10,1
31900000000,,,,,2024-01-01,100,,active,,,10,1
41900000000,No Date,,,,,100,,active,,,10,1
";

    const PAYMENTS: &str = "\
id,phone,amount,due_date,payment_status,payment_date,payment_method,month,year,comments,installment,total_installments
1,11987654321,300.0,2024-01-15,paid,2024-01-14,PIX,1,2024,,1,12
2,11987654321,300.0,2024-02-10,overdue,,,2,2024,,2,12
3,11987654321,300.0,2024-03-10,pending,,,,,,3,12
4,99999999999,300.0,2024-01-10,pending,,,1,2024,,1,1
5,11987654321,,2024-04-10,pending,,,4,2024,,4,12
";

    const INTERNSHIPS: &str = "\
id,phone,date,topic,duration_hours,location,supervisor,description,students
1,11987654321,2024-03-02,Hospital,4,Santa Casa,Marta,,\"21912345678, Ana\"
2,,2024-03-09,Court,2.5,,,,
3,11987654321,2024-03-16,,3,,,,
4,11987654321,2024-03-23,School,0,,,,
";

    #[tokio::test]
    async fn test_import_students_repairs_and_skips() -> Result<()> {
        let db = setup_test_db().await?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("students.csv");
        fs::write(&path, STUDENTS)?;

        let summary = import_students_csv(&db, &path).await?;
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped, 3);

        let ana = student_logic::require_student(&db, "11987654321").await?;
        assert_eq!(ana.payment_day, 10);
        assert_eq!(ana.payment_plan, 12);
        assert_eq!(ana.email.as_deref(), Some("ana@example.com"));

        let bruno = student_logic::require_student(&db, "21912345678").await?;
        assert_eq!(bruno.enrollment_date, date(2024, 2, 15));
        assert_eq!(bruno.status, StudentStatus::Canceled);
        assert_eq!(bruno.payment_day, 10);
        assert_eq!(bruno.payment_plan, 1);

        // Second run updates instead of duplicating
        let again = import_students_csv(&db, &path).await?;
        assert_eq!(again.imported, 0);
        assert_eq!(again.updated, 2);
        assert_eq!(student_logic::get_all_students(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_payments_upserts_by_period() -> Result<()> {
        let db = setup_test_db().await?;
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("students.csv"), STUDENTS)?;
        fs::write(dir.path().join("payments.csv"), PAYMENTS)?;

        let result = import_legacy_dir(&db, dir.path()).await?;
        let payments = result.payments.unwrap();
        assert_eq!(payments.imported, 3);
        assert_eq!(payments.skipped, 2);
        assert!(result.internships.is_none());

        let stored = payment_logic::get_payments_for_student(&db, "11987654321").await?;
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0].status, PaymentStatus::Paid);
        assert_eq!(stored[0].payment_method.as_deref(), Some("pix"));
        assert_eq!(stored[1].status, PaymentStatus::Pending);
        assert_eq!((stored[2].month, stored[2].year), (3, 2024));

        let again = import_payments_csv(&db, &dir.path().join("payments.csv")).await?;
        assert_eq!(again.updated, 3);
        assert_eq!(
            payment_logic::get_payments_for_student(&db, "11987654321")
                .await?
                .len(),
            3
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_import_internships_with_participant_list() -> Result<()> {
        let db = setup_test_db().await?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("internships.csv");
        fs::write(&path, INTERNSHIPS)?;

        let summary = import_internships_csv(&db, &path).await?;
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 3);

        let all = internship::get_all_internships(&db).await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].hours, 4.0);
        assert_eq!(
            internship::get_participants(&db, all[0].id).await?,
            vec!["11987654321", "21912345678"]
        );

        let again = import_internships_csv(&db, &path).await?;
        assert_eq!(again.imported, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_merges_old_and_new_header_columns() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "11987654321", "Ana").await?;
        let dir = tempfile::tempdir()?;

        // Files rewritten after a column rename carry both headers
        let payments_path = dir.path().join("payments.csv");
        fs::write(
            &payments_path,
            "\
id,phone,amount,due_date,status,payment_status,payment_date,month,year,installment,total_installments
1,11987654321,300.0,2024-01-15,,paid,2024-01-14,1,2024,1,3
2,11987654321,300.0,2024-02-10,pending,,,2,2024,2,3
",
        )?;
        let payments = import_payments_csv(&db, &payments_path).await?;
        assert_eq!(payments.updated, 2);
        assert_eq!(payments.skipped, 0);
        let stored = payment_logic::get_payments_for_student(&db, "11987654321").await?;
        assert_eq!(stored[0].status, PaymentStatus::Paid);
        assert_eq!(stored[1].status, PaymentStatus::Pending);

        let internships_path = dir.path().join("internships.csv");
        fs::write(
            &internships_path,
            "\
phone,date,topic,hours,duration_hours,students,participants
11987654321,2024-03-02,Hospital,,4,,21912345678
11987654321,2024-03-09,Court,2,,21912345678,
",
        )?;
        let internships = import_internships_csv(&db, &internships_path).await?;
        assert_eq!(internships.imported, 2);
        assert_eq!(internships.skipped, 0);
        let all = internship::get_all_internships(&db).await?;
        assert_eq!(all.iter().map(|i| i.hours).sum::<f64>(), 6.0);
        assert_eq!(
            internship::get_participants(&db, all[0].id).await?,
            vec!["11987654321", "21912345678"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_import_non_active_statuses_are_not_billed() -> Result<()> {
        let db = setup_test_db().await?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("students.csv");
        fs::write(
            &path,
            "\
phone,name,enrollment_date,monthly_fee,status,payment_day
11987654321,Ana,2024-01-15,300,ativo,10
21912345678,Formada,2024-01-15,250,graduated,10
31912345678,Suspensa,2024-01-15,250,suspended,10
41912345678,Desconhecida,2024-01-15,250,on hold,10
51912345678,Sem Status,2024-01-15,200,,10
",
        )?;

        let summary = import_students_csv(&db, &path).await?;
        assert_eq!(summary.imported, 5);

        let expected = [
            ("11987654321", StudentStatus::Active),
            ("21912345678", StudentStatus::Canceled),
            ("31912345678", StudentStatus::Canceled),
            ("41912345678", StudentStatus::Canceled),
            ("51912345678", StudentStatus::Active),
        ];
        for (phone, status) in expected {
            let stored = student_logic::require_student(&db, phone).await?;
            assert_eq!(stored.status, status, "status of {}", stored.name);
        }

        let june = crate::core::monthly::generate_payments_for_month(&db, 2024, 6).await?;
        assert_eq!(june.created.len(), 2);
        let students = student_logic::get_all_students(&db).await?;
        assert_eq!(crate::core::revenue::projected_monthly_revenue(&students), 500.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_counts_paid_rows_without_date() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_student(&db, "11987654321", "Ana").await?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("payments.csv");
        fs::write(
            &path,
            "\
phone,amount,due_date,status,payment_date,month,year
11987654321,300,2024-01-15,paid,,1,2024
11987654321,300,2024-02-10,paid,2024-02-09,2,2024
",
        )?;

        let summary = import_payments_csv(&db, &path).await?;
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.missing_payment_date, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_export_round_trip_columns() -> Result<()> {
        let (db, _student, payments) = setup_with_student().await?;
        payment_logic::mark_payment_paid(&db, payments[0].id, date(2024, 1, 15), Some("Cash".into()))
            .await?;
        let dir = tempfile::tempdir()?;

        let students_path = dir.path().join("students.csv");
        let payments_path = dir.path().join("payments.csv");
        assert_eq!(export_students_csv(&db, &students_path).await?, 1);
        assert_eq!(export_payments_csv(&db, &payments_path).await?, 3);

        let students_csv = fs::read_to_string(&students_path)?;
        assert!(students_csv.starts_with("phone,name,cpf,email,address,enrollment_date"));
        assert!(students_csv.contains("11987654321,Ana Souza"));

        let payments_csv = fs::read_to_string(&payments_path)?;
        assert!(payments_csv.starts_with("id,phone,amount,due_date,status,payment_date"));
        assert!(payments_csv.contains("paid,2024-01-15,cash"));

        // Exported files can be imported into a fresh database
        let fresh = setup_test_db().await?;
        let students = import_students_csv(&fresh, &students_path).await?;
        let imported = import_payments_csv(&fresh, &payments_path).await?;
        assert_eq!(students.imported, 1);
        assert_eq!(imported.imported, 3);
        Ok(())
    }

    #[test]
    fn test_value_parsers() {
        assert_eq!(parse_int(Some("10.0")), Some(10));
        assert_eq!(parse_int(Some("10.5")), None);
        assert_eq!(parse_number(Some("1234,5")), Some(1234.5));
        assert_eq!(parse_date(Some("2024-01-15 00:00:00")), Some(date(2024, 1, 15)));
        assert_eq!(parse_date(Some("31/01/2024")), Some(date(2024, 1, 31)));
        assert_eq!(parse_date(Some("tomorrow")), None);
        assert_eq!(text(Some(" nan ".to_string())), None);
    }
}
