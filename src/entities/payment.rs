//! Payment entity - One scheduled tuition installment.
//!
//! Each payment belongs to a student (by phone) and a billing period
//! (`month`, `year`). The `(phone, month, year)` triple is unique; the index is
//! created alongside the table in [`crate::config::database::create_tables`].
//! "Overdue" is never stored here: it is derived from `status` and `due_date`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Surrogate id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Phone number of the student this installment belongs to
    pub phone: String,
    /// Amount owed
    pub amount: f64,
    /// Date the installment is due
    pub due_date: Date,
    /// Stored lifecycle status
    pub status: PaymentStatus,
    /// Date the payment was received
    pub payment_date: Option<Date>,
    /// How the payment was made (e.g. "pix", "cash")
    pub payment_method: Option<String>,
    /// Billing month (1-12)
    pub month: i32,
    /// Billing year
    pub year: i32,
    /// Free-text staff notes
    pub comments: Option<String>,
    /// 1-based position within the student's plan
    pub installment: i32,
    /// Total installments in the plan
    pub total_installments: i32,
}

/// Stored lifecycle status of a payment.
///
/// Allowed transitions are `pending -> paid` and `pending -> canceled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting payment
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Received
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Written off by staff
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl PaymentStatus {
    /// Returns the stored string form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Canceled => "canceled",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid) | (Self::Pending, Self::Canceled)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::Phone",
        to = "super::student::Column::Phone"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Canceled));
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Canceled));
        assert!(!PaymentStatus::Canceled.can_transition_to(PaymentStatus::Paid));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Pending));
    }
}
