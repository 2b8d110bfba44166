//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Internship commands
pub mod internship;

/// Payment commands
pub mod payment;

/// Report commands
pub mod report;

/// Student commands
pub mod student;

// Export commands
pub use general::*;
pub use internship::*;
pub use payment::*;
pub use report::*;
pub use student::*;
