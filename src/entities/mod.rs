//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod internship;
pub mod internship_participant;
pub mod payment;
pub mod student;
pub mod system_state;

// Re-export specific types to avoid conflicts
pub use internship::{Column as InternshipColumn, Entity as Internship, Model as InternshipModel};
pub use internship_participant::{
    Column as InternshipParticipantColumn, Entity as InternshipParticipant,
    Model as InternshipParticipantModel,
};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel, PaymentStatus};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel, StudentStatus};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
