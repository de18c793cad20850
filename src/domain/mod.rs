//! Core domain types and logic.

pub mod date_range;
pub mod funding;
pub mod student;
pub mod enrollment;
pub mod aggregate;
pub mod records;
pub mod report;
pub mod graduates;
pub mod settings;
pub mod error;
