//! Validation utilities
//!
//! Checks the structural properties every analysis report must satisfy

mod invariants;

pub use invariants::validate_report;
