//! Overdue-payment detection.
//!
//! A payment is overdue when it is still pending and its due date is before
//! today. Overdue is never stored; it is recomputed from the current tables
//! every time, so running the detector twice on unchanged data yields the same
//! rows in the same order.

use crate::{
    core::{payment as payment_logic, student as student_logic},
    entities::{Payment, PaymentStatus, payment, student},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, prelude::*};
use std::collections::{BTreeMap, HashMap};

/// A pending payment past its due date, joined with its student.
#[derive(Debug, Clone, PartialEq)]
pub struct OverduePayment {
    /// The payment row
    pub payment: payment::Model,
    /// Student name
    pub student_name: String,
    /// Whole days since the due date
    pub days_overdue: i64,
}

/// Overdue installments grouped per student.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentOverdue {
    /// Student phone
    pub phone: String,
    /// Student name
    pub student_name: String,
    /// Number of overdue installments
    pub count: usize,
    /// Sum of the overdue amounts
    pub total_amount: f64,
    /// Age of the oldest overdue installment in days
    pub max_days_overdue: i64,
}

/// Joins active students to their overdue payments.
///
/// Only students with status active are considered, only payments with status
/// pending and a due date strictly before `today` are returned. The result is
/// ordered by due date, then phone, then payment id.
#[must_use]
pub fn get_overdue_payments(
    students: &[student::Model],
    payments: &[payment::Model],
    today: NaiveDate,
) -> Vec<OverduePayment> {
    let active: HashMap<&str, &student::Model> = students
        .iter()
        .filter(|s| s.is_active())
        .map(|s| (s.phone.as_str(), s))
        .collect();

    let mut overdue: Vec<OverduePayment> = payments
        .iter()
        .filter(|p| payment_logic::is_overdue(p, today))
        .filter_map(|p| {
            active.get(p.phone.as_str()).map(|s| OverduePayment {
                payment: p.clone(),
                student_name: s.name.clone(),
                days_overdue: today.signed_duration_since(p.due_date).num_days(),
            })
        })
        .collect();

    overdue.sort_by(|a, b| {
        a.payment
            .due_date
            .cmp(&b.payment.due_date)
            .then_with(|| a.payment.phone.cmp(&b.payment.phone))
            .then_with(|| a.payment.id.cmp(&b.payment.id))
    });
    overdue
}

/// Loads active students and pending past-due payments and joins them.
pub async fn find_overdue_payments(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<OverduePayment>> {
    let students = student_logic::get_active_students(db).await?;
    let payments = Payment::find()
        .filter(payment::Column::Status.eq(PaymentStatus::Pending))
        .filter(payment::Column::DueDate.lt(today))
        .order_by_asc(payment::Column::DueDate)
        .all(db)
        .await?;

    Ok(get_overdue_payments(&students, &payments, today))
}

/// Groups overdue payments per student, most overdue amount first.
#[must_use]
pub fn overdue_by_student(overdue: &[OverduePayment]) -> Vec<StudentOverdue> {
    let mut grouped: BTreeMap<&str, StudentOverdue> = BTreeMap::new();

    for item in overdue {
        let entry = grouped
            .entry(item.payment.phone.as_str())
            .or_insert_with(|| StudentOverdue {
                phone: item.payment.phone.clone(),
                student_name: item.student_name.clone(),
                count: 0,
                total_amount: 0.0,
                max_days_overdue: 0,
            });
        entry.count += 1;
        entry.total_amount += item.payment.amount;
        entry.max_days_overdue = entry.max_days_overdue.max(item.days_overdue);
    }

    let mut result: Vec<StudentOverdue> = grouped.into_values().collect();
    result.sort_by(|a, b| {
        b.total_amount
            .total_cmp(&a.total_amount)
            .then_with(|| a.phone.cmp(&b.phone))
    });
    result
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Datelike;

    fn pending(id: i64, phone: &str, due_date: NaiveDate) -> payment::Model {
        payment::Model {
            id,
            phone: phone.to_string(),
            amount: 300.0,
            due_date,
            status: PaymentStatus::Pending,
            payment_date: None,
            payment_method: None,
            month: i32::try_from(due_date.month()).unwrap(),
            year: due_date.year(),
            comments: None,
            installment: 1,
            total_installments: 1,
        }
    }

    #[test]
    fn test_days_overdue_example() {
        let students = vec![student_model("11987654321", "Ana", true)];
        let payments = vec![pending(1, "11987654321", date(2024, 5, 1))];

        let overdue = get_overdue_payments(&students, &payments, date(2024, 6, 1));
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].days_overdue, 31);
        assert_eq!(overdue[0].student_name, "Ana");
    }

    #[test]
    fn test_excludes_paid_future_and_canceled_students() {
        let students = vec![
            student_model("11987654321", "Ana", true),
            student_model("21912345678", "Bruno", false),
        ];
        let mut paid = pending(2, "11987654321", date(2024, 4, 1));
        paid.status = PaymentStatus::Paid;
        let mut written_off = pending(5, "11987654321", date(2024, 3, 1));
        written_off.status = PaymentStatus::Canceled;
        let payments = vec![
            pending(1, "11987654321", date(2024, 5, 1)),
            paid,
            pending(3, "11987654321", date(2024, 6, 1)),
            pending(4, "21912345678", date(2024, 5, 1)),
            written_off,
            pending(6, "31900000000", date(2024, 5, 1)),
        ];

        let today = date(2024, 6, 1);
        let overdue = get_overdue_payments(&students, &payments, today);

        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].payment.id, 1);
        assert!(
            overdue
                .iter()
                .all(|o| o.payment.status != PaymentStatus::Paid && o.payment.due_date < today)
        );
    }

    #[test]
    fn test_detector_is_idempotent_and_ordered() {
        let students = vec![
            student_model("11987654321", "Ana", true),
            student_model("21912345678", "Bruno", true),
        ];
        let payments = vec![
            pending(3, "21912345678", date(2024, 2, 10)),
            pending(1, "11987654321", date(2024, 3, 10)),
            pending(2, "11987654321", date(2024, 2, 10)),
        ];

        let first = get_overdue_payments(&students, &payments, date(2024, 6, 1));
        let second = get_overdue_payments(&students, &payments, date(2024, 6, 1));
        assert_eq!(first, second);

        let ids: Vec<i64> = first.iter().map(|o| o.payment.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(get_overdue_payments(&[], &[], date(2024, 1, 1)).is_empty());
    }

    #[test]
    fn test_overdue_by_student() {
        let students = vec![
            student_model("11987654321", "Ana", true),
            student_model("21912345678", "Bruno", true),
        ];
        let payments = vec![
            pending(1, "11987654321", date(2024, 4, 10)),
            pending(2, "11987654321", date(2024, 5, 10)),
            pending(3, "21912345678", date(2024, 5, 10)),
        ];

        let grouped =
            overdue_by_student(&get_overdue_payments(&students, &payments, date(2024, 6, 1)));
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].phone, "11987654321");
        assert_eq!(grouped[0].count, 2);
        assert_eq!(grouped[0].total_amount, 600.0);
        assert_eq!(grouped[0].max_days_overdue, 52);
        assert_eq!(grouped[1].count, 1);
    }

    #[tokio::test]
    async fn test_find_overdue_payments_from_database() -> Result<()> {
        let (db, student, payments) = setup_with_student().await?;
        let today = date(2024, 3, 1);

        payment_logic::mark_payment_paid(&db, payments[0].id, date(2024, 1, 16), None).await?;
        let overdue = find_overdue_payments(&db, today).await?;
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].payment.id, payments[1].id);
        assert_eq!(overdue[0].days_overdue, 20);

        student_logic::cancel_student(&db, &student.phone, today, false).await?;
        assert!(find_overdue_payments(&db, today).await?.is_empty());
        Ok(())
    }
}
