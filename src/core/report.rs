//! Report generation business logic.
//!
//! This module computes the dashboard figures shown to staff: enrollment
//! counts, both revenue figures, overdue totals and payment status
//! breakdowns. The figures are computed by pure functions over loaded rows and
//! returned as structured data; the bot layer only formats them.

use crate::{
    core::{overdue, payment as payment_logic, revenue, student as student_logic},
    entities::{PaymentStatus, payment, student},
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use sea_orm::DatabaseConnection;
use std::collections::{BTreeMap, HashSet};

/// Number of payments of active students per display label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Pending and not yet due
    pub pending: usize,
    /// Received
    pub paid: usize,
    /// Pending past the due date
    pub overdue: usize,
    /// Written off
    pub canceled: usize,
}

/// Headline figures for the school dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    /// Date the figures were computed for
    pub today: NaiveDate,
    /// Students with active enrollment
    pub active_students: usize,
    /// Students whose enrollment was canceled
    pub canceled_students: usize,
    /// Sum of monthly fees over active students
    pub projected_revenue: f64,
    /// Cash received during the current month
    pub collected_this_month: f64,
    /// Overdue installments of active students
    pub overdue_count: usize,
    /// Sum of those installments
    pub overdue_amount: f64,
    /// Overdue amount as a percentage of the expected amount
    pub overdue_rate: f64,
    /// Payments of active students per display label
    pub status_counts: StatusCounts,
    /// Share of this month's installments already paid, as a percentage
    pub current_month_payment_rate: f64,
    /// New enrollments keyed by `YYYY-MM`
    pub enrollments_per_month: BTreeMap<String, usize>,
}

/// Computes `part / whole` as a percentage, or zero for an empty whole.
#[must_use]
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    (part / whole) * 100.0
}

/// Builds the dashboard from already loaded rows.
#[must_use]
pub fn build_dashboard(
    students: &[student::Model],
    payments: &[payment::Model],
    today: NaiveDate,
) -> DashboardSummary {
    let active_students = students.iter().filter(|s| s.is_active()).count();

    let overdue_rows = overdue::get_overdue_payments(students, payments, today);
    let overdue_amount: f64 = overdue_rows.iter().map(|o| o.payment.amount).sum();

    let expected_amount: f64 = payments
        .iter()
        .filter(|p| p.status != PaymentStatus::Canceled)
        .map(|p| p.amount)
        .sum();

    // Only active students, matching the overdue detector
    let active_phones: HashSet<&str> = students
        .iter()
        .filter(|s| s.is_active())
        .map(|s| s.phone.as_str())
        .collect();
    let mut status_counts = StatusCounts::default();
    for item in payments
        .iter()
        .filter(|p| active_phones.contains(p.phone.as_str()))
    {
        match payment_logic::payment_label(item, today) {
            payment_logic::PaymentLabel::Pending => status_counts.pending += 1,
            payment_logic::PaymentLabel::Paid => status_counts.paid += 1,
            payment_logic::PaymentLabel::Overdue => status_counts.overdue += 1,
            payment_logic::PaymentLabel::Canceled => status_counts.canceled += 1,
        }
    }

    let this_month: Vec<&payment::Model> = payments
        .iter()
        .filter(|p| p.status != PaymentStatus::Canceled)
        .filter(|p| p.year == today.year() && u32::try_from(p.month).ok() == Some(today.month()))
        .collect();
    let paid_this_month = this_month
        .iter()
        .filter(|p| p.status == PaymentStatus::Paid)
        .count();

    let mut enrollments_per_month = BTreeMap::new();
    for s in students {
        *enrollments_per_month
            .entry(s.enrollment_date.format("%Y-%m").to_string())
            .or_insert(0) += 1;
    }

    // Counts are small; f64 holds them exactly
    #[allow(clippy::cast_precision_loss)]
    let current_month_payment_rate = percentage(paid_this_month as f64, this_month.len() as f64);

    DashboardSummary {
        today,
        active_students,
        canceled_students: students.len() - active_students,
        projected_revenue: revenue::projected_monthly_revenue(students),
        collected_this_month: revenue::collected_revenue_for_month_of(payments, today),
        overdue_count: overdue_rows.len(),
        overdue_amount,
        overdue_rate: percentage(overdue_amount, expected_amount),
        status_counts,
        current_month_payment_rate,
        enrollments_per_month,
    }
}

/// Loads students and payments and builds the dashboard for `today`.
pub async fn generate_dashboard(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<DashboardSummary> {
    let students = student_logic::get_all_students(db).await?;
    let payments = payment_logic::get_all_payments(db).await?;
    Ok(build_dashboard(&students, &payments, today))
}

/// Formats an amount in reais, e.g. `R$ 1234.50`.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-R$ {:.2}", amount.abs())
    } else {
        format!("R$ {amount:.2}")
    }
}

/// Formats an overdue age for display.
#[must_use]
pub fn format_days_overdue(days: i64) -> String {
    match days {
        i64::MIN..=0 => "due today".to_string(),
        1 => "1 day overdue".to_string(),
        n => format!("{n} days overdue"),
    }
}

/// Renders the dashboard as plain text.
pub fn format_dashboard(summary: &DashboardSummary, school_name: &str) -> Result<String> {
    use std::fmt::Write;

    let mut out = format!(
        "📊 {school_name} - {}\n\n",
        summary.today.format("%d/%m/%Y")
    );
    writeln!(
        out,
        "Students: {} active, {} canceled",
        summary.active_students, summary.canceled_students
    )?;
    writeln!(
        out,
        "Projected monthly revenue: {}",
        format_currency(summary.projected_revenue)
    )?;
    writeln!(
        out,
        "Collected this month: {}",
        format_currency(summary.collected_this_month)
    )?;
    writeln!(
        out,
        "Overdue: {} installments, {} ({:.1}% of expected)",
        summary.overdue_count,
        format_currency(summary.overdue_amount),
        summary.overdue_rate
    )?;
    writeln!(
        out,
        "This month paid: {:.1}%",
        summary.current_month_payment_rate
    )?;

    let counts = summary.status_counts;
    writeln!(
        out,
        "Active students' payments: {} pending | {} paid | {} overdue | {} canceled",
        counts.pending, counts.paid, counts.overdue, counts.canceled
    )?;

    if !summary.enrollments_per_month.is_empty() {
        out.push_str("\nEnrollments per month:\n");
        for (period, count) in &summary.enrollments_per_month {
            writeln!(out, "  {period}: {count}")?;
        }
    }

    Ok(out)
}
