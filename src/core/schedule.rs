//! Payment-schedule generation.
//!
//! Turns a student's enrollment terms into one installment per calendar month.
//! This module is pure: it never touches the database. Persisting a schedule
//! is done by [`crate::core::payment::create_payment_plan`].

use crate::{
    entities::PaymentStatus,
    errors::{Error, Result},
};
use chrono::{Datelike, Months, NaiveDate};
use tracing::warn;

/// Due day used when the requested one is outside `1..=28`.
pub const FALLBACK_DUE_DAY: u32 = 10;

/// Latest due day that exists in every month.
pub const MAX_DUE_DAY: u32 = 28;

/// Longest plan accepted, ten years of monthly installments.
pub const MAX_INSTALLMENTS: i32 = 120;

/// Terms of a payment plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRequest {
    /// Student phone number
    pub phone: String,
    /// Amount of each installment
    pub monthly_fee: f64,
    /// First day of the enrollment
    pub enrollment_date: NaiveDate,
    /// Number of monthly installments; ignored when `end_date` is given
    pub installments: i32,
    /// Last month to bill, inclusive
    pub end_date: Option<NaiveDate>,
    /// Requested due day of month
    pub due_day: i32,
}

/// One generated installment, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledPayment {
    /// Student phone number
    pub phone: String,
    /// Amount owed
    pub amount: f64,
    /// Date the installment is due
    pub due_date: NaiveDate,
    /// Billing month (1-12)
    pub month: u32,
    /// Billing year
    pub year: i32,
    /// 1-based position in the plan
    pub installment: i32,
    /// Total installments in the plan
    pub total_installments: i32,
    /// Always [`PaymentStatus::Pending`] for freshly generated rows
    pub status: PaymentStatus,
}

/// Clamps a due day into `1..=28`, falling back to [`FALLBACK_DUE_DAY`].
#[must_use]
pub fn normalize_due_day(due_day: i32) -> u32 {
    match u32::try_from(due_day) {
        Ok(day) if (1..=MAX_DUE_DAY).contains(&day) => day,
        _ => {
            warn!("Due day {due_day} outside 1..={MAX_DUE_DAY}, using {FALLBACK_DUE_DAY}");
            FALLBACK_DUE_DAY
        }
    }
}

/// First day of the given month.
pub fn month_start(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| Error::InvalidSchedule {
        reason: format!("invalid month {year}-{month:02}"),
    })
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let start = month_start(year, month)?;
    let next = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| Error::InvalidSchedule {
            reason: format!("month after {year}-{month:02} is out of range"),
        })?;
    let days = next.signed_duration_since(start).num_days();
    Ok(u32::try_from(days)?)
}

/// Due date for `due_day` within the month containing `first_of_month`,
/// clamped to the month's last day.
pub fn due_date_in_month(first_of_month: NaiveDate, due_day: u32) -> Result<NaiveDate> {
    let day = due_day.min(days_in_month(first_of_month.year(), first_of_month.month())?);
    first_of_month
        .with_day(day)
        .ok_or_else(|| Error::InvalidSchedule {
            reason: format!(
                "day {day} does not exist in {}",
                first_of_month.format("%Y-%m")
            ),
        })
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// Generates one pending installment per calendar month.
///
/// Without an explicit `end_date` the plan covers exactly `installments`
/// months starting with the enrollment month. With one, every month from the
/// enrollment month through the end-date month is billed.
///
/// Each due date falls on the (normalized) due day. In the first month, when
/// the student enrolled after the due day, the due date is the enrollment date
/// itself so no installment is due before the student joined.
///
/// # Errors
/// Returns [`Error::InvalidSchedule`] when the plan would be empty (fewer than
/// one installment, or an end date before enrollment) or longer than
/// [`MAX_INSTALLMENTS`], and
/// [`Error::InvalidAmount`] for a negative or non-finite fee.
pub fn generate_monthly_payments(request: &ScheduleRequest) -> Result<Vec<ScheduledPayment>> {
    if !request.monthly_fee.is_finite() || request.monthly_fee < 0.0 {
        return Err(Error::InvalidAmount {
            amount: request.monthly_fee,
        });
    }

    let due_day = normalize_due_day(request.due_day);
    let enrollment = request.enrollment_date;
    let first_month = month_start(enrollment.year(), enrollment.month())?;

    let last_month = match request.end_date {
        Some(end) => {
            if end < enrollment {
                return Err(Error::InvalidSchedule {
                    reason: format!("end date {end} is before enrollment date {enrollment}"),
                });
            }
            month_start(end.year(), end.month())?
        }
        None => {
            if request.installments < 1 {
                return Err(Error::InvalidSchedule {
                    reason: format!(
                        "installments must be at least 1, got {}",
                        request.installments
                    ),
                });
            }
            if request.installments > MAX_INSTALLMENTS {
                return Err(Error::InvalidSchedule {
                    reason: format!(
                        "installments must be at most {MAX_INSTALLMENTS}, got {}",
                        request.installments
                    ),
                });
            }
            let extra = u32::try_from(request.installments - 1)?;
            first_month
                .checked_add_months(Months::new(extra))
                .ok_or_else(|| Error::InvalidSchedule {
                    reason: "plan extends past the supported calendar".to_string(),
                })?
        }
    };

    let total = i32::try_from(month_index(last_month) - month_index(first_month) + 1)?;
    if total > MAX_INSTALLMENTS {
        return Err(Error::InvalidSchedule {
            reason: format!("plan of {total} months exceeds {MAX_INSTALLMENTS} installments"),
        });
    }
    let mut schedule = Vec::with_capacity(usize::try_from(total)?);

    for offset in 0..total {
        let cursor = first_month
            .checked_add_months(Months::new(u32::try_from(offset)?))
            .ok_or_else(|| Error::InvalidSchedule {
                reason: "plan extends past the supported calendar".to_string(),
            })?;

        let due_date = if offset == 0 && enrollment.day() > due_day {
            enrollment
        } else {
            due_date_in_month(cursor, due_day)?
        };

        schedule.push(ScheduledPayment {
            phone: request.phone.clone(),
            amount: request.monthly_fee,
            due_date,
            month: cursor.month(),
            year: cursor.year(),
            installment: offset + 1,
            total_installments: total,
            status: PaymentStatus::Pending,
        });
    }

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(enrollment_date: NaiveDate, installments: i32, due_day: i32) -> ScheduleRequest {
        ScheduleRequest {
            phone: "11987654321".to_string(),
            monthly_fee: 300.0,
            enrollment_date,
            installments,
            end_date: None,
            due_day,
        }
    }

    #[test]
    fn test_first_due_date_pushed_to_enrollment() {
        let schedule = generate_monthly_payments(&request(date(2024, 1, 15), 3, 10)).unwrap();

        let due_dates: Vec<NaiveDate> = schedule.iter().map(|p| p.due_date).collect();
        assert_eq!(
            due_dates,
            vec![date(2024, 1, 15), date(2024, 2, 10), date(2024, 3, 10)]
        );
        assert!(schedule.iter().all(|p| p.amount == 300.0));
        assert!(schedule.iter().all(|p| p.status == PaymentStatus::Pending));
        assert_eq!(schedule[0].installment, 1);
        assert_eq!(schedule[2].installment, 3);
        assert!(schedule.iter().all(|p| p.total_installments == 3));
    }

    #[test]
    fn test_enrollment_before_due_day_keeps_due_day() {
        let schedule = generate_monthly_payments(&request(date(2024, 1, 5), 2, 10)).unwrap();
        assert_eq!(schedule[0].due_date, date(2024, 1, 10));
        assert_eq!(schedule[1].due_date, date(2024, 2, 10));
    }

    #[test]
    fn test_enrollment_on_due_day() {
        let schedule = generate_monthly_payments(&request(date(2024, 1, 10), 1, 10)).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].due_date, date(2024, 1, 10));
    }

    #[test]
    fn test_schedule_crosses_year_boundary() {
        let schedule = generate_monthly_payments(&request(date(2024, 11, 1), 4, 5)).unwrap();
        let periods: Vec<(i32, u32)> = schedule.iter().map(|p| (p.year, p.month)).collect();
        assert_eq!(periods, vec![(2024, 11), (2024, 12), (2025, 1), (2025, 2)]);
    }

    #[test]
    fn test_out_of_range_due_day_falls_back() {
        let schedule = generate_monthly_payments(&request(date(2024, 3, 1), 2, 31)).unwrap();
        assert_eq!(schedule[0].due_date, date(2024, 3, 10));

        let schedule = generate_monthly_payments(&request(date(2024, 3, 1), 1, 0)).unwrap();
        assert_eq!(schedule[0].due_date, date(2024, 3, 10));
    }

    #[test]
    fn test_zero_installments_rejected() {
        let result = generate_monthly_payments(&request(date(2024, 1, 15), 0, 10));
        assert!(matches!(result, Err(Error::InvalidSchedule { .. })));

        let result = generate_monthly_payments(&request(date(2024, 1, 15), -3, 10));
        assert!(matches!(result, Err(Error::InvalidSchedule { .. })));
    }

    #[test]
    fn test_plan_length_capped() {
        let longest = generate_monthly_payments(&request(date(2024, 1, 15), MAX_INSTALLMENTS, 10));
        assert_eq!(longest.unwrap().len(), 120);

        let result = generate_monthly_payments(&request(date(2024, 1, 15), 1_000_000, 10));
        assert!(matches!(result, Err(Error::InvalidSchedule { .. })));

        let mut req = request(date(2024, 1, 15), 3, 10);
        req.end_date = Some(date(2100, 1, 1));
        assert!(matches!(
            generate_monthly_payments(&req),
            Err(Error::InvalidSchedule { .. })
        ));
    }

    #[test]
    fn test_end_date_before_enrollment_rejected() {
        let mut req = request(date(2024, 6, 15), 3, 10);
        req.end_date = Some(date(2024, 6, 1));
        let result = generate_monthly_payments(&req);
        assert!(matches!(result, Err(Error::InvalidSchedule { .. })));
    }

    #[test]
    fn test_explicit_end_date_is_inclusive() {
        let mut req = request(date(2024, 1, 20), 99, 10);
        req.end_date = Some(date(2024, 6, 1));
        let schedule = generate_monthly_payments(&req).unwrap();
        assert_eq!(schedule.len(), 6);
        assert_eq!(schedule.last().unwrap().month, 6);
        assert!(schedule.iter().all(|p| p.total_installments == 6));
    }

    #[test]
    fn test_negative_fee_rejected() {
        let mut req = request(date(2024, 1, 1), 3, 10);
        req.monthly_fee = -1.0;
        assert!(matches!(
            generate_monthly_payments(&req),
            Err(Error::InvalidAmount { .. })
        ));

        req.monthly_fee = f64::NAN;
        assert!(matches!(
            generate_monthly_payments(&req),
            Err(Error::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_schedule_properties_hold_across_inputs() {
        let enrollments = [
            date(2023, 1, 31),
            date(2024, 2, 29),
            date(2024, 7, 1),
            date(2024, 12, 28),
        ];
        for enrollment in enrollments {
            for installments in [1, 2, 7, 13, 24] {
                for due_day in [1, 10, 15, 28] {
                    let schedule =
                        generate_monthly_payments(&request(enrollment, installments, due_day))
                            .unwrap();

                    assert_eq!(schedule.len(), usize::try_from(installments).unwrap());
                    assert!(schedule[0].due_date >= enrollment);
                    assert!(schedule.windows(2).all(|w| w[0].due_date <= w[1].due_date));

                    let periods: HashSet<(i32, u32)> =
                        schedule.iter().map(|p| (p.year, p.month)).collect();
                    assert_eq!(periods.len(), schedule.len());
                }
            }
        }
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2023, 2).unwrap(), 28);
        assert_eq!(days_in_month(2024, 12).unwrap(), 31);
        assert_eq!(days_in_month(2024, 4).unwrap(), 30);
        assert!(days_in_month(2024, 13).is_err());
    }

    #[test]
    fn test_due_date_in_month() {
        assert_eq!(
            due_date_in_month(date(2024, 2, 1), 28).unwrap(),
            date(2024, 2, 28)
        );
        assert_eq!(
            due_date_in_month(date(2024, 4, 1), 31).unwrap(),
            date(2024, 4, 30)
        );
    }
}
