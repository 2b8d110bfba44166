//! Internship entity - A logged block of supervised practice hours.
//!
//! The students who took part are stored in `internship_participants`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Internship database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "internships")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Day the internship took place
    pub date: Date,
    /// Subject practiced
    pub topic: String,
    /// Hours credited to each participant
    pub hours: f64,
    /// Where it took place
    pub location: Option<String>,
    /// Supervising interpreter
    pub supervisor: Option<String>,
    /// Free-text description
    pub description: Option<String>,
}

/// Defines relationships between Internship and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One internship has many participants
    #[sea_orm(has_many = "super::internship_participant::Entity")]
    Participants,
}

impl Related<super::internship_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
