//! Revenue figures.
//!
//! Two different numbers are kept apart on purpose:
//! - the *projected* monthly revenue, the fee sum over active students, and
//! - the *collected* revenue, cash actually received in a calendar month.

use crate::entities::{PaymentStatus, payment, student};
use chrono::{Datelike, NaiveDate};

/// Sum of the monthly fee over every active student.
///
/// This is a projection of what the school bills per month, not cash received.
#[must_use]
pub fn projected_monthly_revenue(students: &[student::Model]) -> f64 {
    students
        .iter()
        .filter(|s| s.is_active())
        .map(|s| s.monthly_fee)
        .sum()
}

/// Sum of paid amounts whose payment date falls in the given month.
#[must_use]
pub fn collected_revenue(payments: &[payment::Model], year: i32, month: u32) -> f64 {
    payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Paid)
        .filter(|p| {
            p.payment_date
                .is_some_and(|d| d.year() == year && d.month() == month)
        })
        .map(|p| p.amount)
        .sum()
}

/// Collected revenue for the month containing `date`.
#[must_use]
pub fn collected_revenue_for_month_of(payments: &[payment::Model], date: NaiveDate) -> f64 {
    collected_revenue(payments, date.year(), date.month())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn paid(amount: f64, payment_date: Option<NaiveDate>, status: PaymentStatus) -> payment::Model {
        payment::Model {
            id: 1,
            phone: "11987654321".to_string(),
            amount,
            due_date: date(2024, 3, 10),
            status,
            payment_date,
            payment_method: None,
            month: 3,
            year: 2024,
            comments: None,
            installment: 1,
            total_installments: 1,
        }
    }

    #[test]
    fn test_projected_revenue_counts_active_students_only() {
        let mut ana = student_model("11987654321", "Ana", true);
        ana.monthly_fee = 300.0;
        let mut bruno = student_model("21912345678", "Bruno", true);
        bruno.monthly_fee = 250.0;
        let mut carla = student_model("31900000000", "Carla", false);
        carla.monthly_fee = 1000.0;

        assert_eq!(projected_monthly_revenue(&[ana, bruno, carla]), 550.0);
        assert_eq!(projected_monthly_revenue(&[]), 0.0);
    }

    #[test]
    fn test_collected_revenue_uses_payment_date() {
        let payments = vec![
            paid(300.0, Some(date(2024, 3, 5)), PaymentStatus::Paid),
            paid(200.0, Some(date(2024, 4, 1)), PaymentStatus::Paid),
            paid(999.0, None, PaymentStatus::Pending),
            paid(100.0, Some(date(2024, 3, 20)), PaymentStatus::Canceled),
        ];

        assert_eq!(collected_revenue(&payments, 2024, 3), 300.0);
        assert_eq!(collected_revenue(&payments, 2024, 4), 200.0);
        assert_eq!(
            collected_revenue_for_month_of(&payments, date(2024, 3, 31)),
            300.0
        );
    }
}
