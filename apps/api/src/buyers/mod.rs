//! Buyer leads: validation, persistence with an audit trail, and CSV
//! import/export.

pub mod csv;
pub mod handlers;
pub mod history;
pub mod queries;
pub mod validation;
