//! Internship participant entity - Links an internship to a student phone.
//!
//! The phone is deliberately not a foreign key: participants may be recorded
//! before (or after) the matching student row exists, and names are resolved
//! best-effort at display time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Internship participant database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "internship_participants")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Internship this row belongs to
    pub internship_id: i64,
    /// Normalized phone number of the participant
    pub phone: String,
}

/// Defines relationships between participants and internships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each participant row belongs to one internship
    #[sea_orm(
        belongs_to = "super::internship::Entity",
        from = "Column::InternshipId",
        to = "super::internship::Column::Id",
        on_delete = "Cascade"
    )]
    Internship,
}

impl Related<super::internship::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Internship.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
