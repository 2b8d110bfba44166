/// Internship sessions and hour totals
pub mod internship;
/// Legacy CSV import and export
pub mod legacy;
/// Monthly bulk payment generation
pub mod monthly;
/// Overdue payment detection
pub mod overdue;
/// Payment plans, lookups and status changes
pub mod payment;
/// Dashboard figures and formatting
pub mod report;
/// Projected and collected revenue
pub mod revenue;
/// Pure payment-schedule generation
pub mod schedule;
/// Student enrollment and records
pub mod student;
