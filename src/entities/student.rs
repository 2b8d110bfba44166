//! Student entity - One row per enrolled student, keyed by phone number.
//!
//! The phone number is the natural key used everywhere else in the system:
//! payments and internship participants refer to students by phone.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Normalized phone number (digits only), the student's natural key
    #[sea_orm(primary_key, auto_increment = false)]
    pub phone: String,
    /// Full name
    pub name: String,
    /// Brazilian taxpayer id, if collected
    pub cpf: Option<String>,
    /// Contact e-mail
    pub email: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Date the student enrolled
    pub enrollment_date: Date,
    /// Monthly tuition fee
    pub monthly_fee: f64,
    /// Course the student is enrolled in
    pub course_type: Option<String>,
    /// Enrollment status
    pub status: StudentStatus,
    /// Free-text staff notes
    pub comments: Option<String>,
    /// How the student found the course
    pub registration_origin: Option<String>,
    /// Day of month on which installments are due
    pub payment_day: i32,
    /// Number of monthly installments in the payment plan
    pub payment_plan: i32,
    /// When the enrollment was canceled
    pub cancellation_date: Option<Date>,
    /// Whether the cancellation fee has been paid
    pub cancellation_fee_paid: bool,
}

/// Enrollment status of a student
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    /// Currently enrolled and billed
    #[sea_orm(string_value = "active")]
    Active,
    /// Enrollment canceled by staff
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl StudentStatus {
    /// Returns the stored string form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One student has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the student is currently enrolled
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, StudentStatus::Active)
    }
}
