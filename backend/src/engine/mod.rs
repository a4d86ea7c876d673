//! The generic upload → grouped upsert → REST reconciliation core, plus the
//! template/export builders it mirrors. All module-specific behavior comes
//! in through [`common::model::schema::EntitySchema`] declarations.

pub mod cell;
pub mod entries;
pub mod export;
pub mod group;
pub mod payload;
pub mod reconcile;
pub mod rows;
pub mod template;

use thiserror::Error;

/// Engine-wide knobs resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// `startDate` stamped on schedule entries (paycode events).
    pub event_start_date: String,
}

/// A failure scoped to one row or group. Recorded in the result table; never
/// aborts the batch.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("row {row}: {column} is mandatory")]
    MissingField { row: usize, column: String },

    #[error("row {row}: {column} is not a valid {expected}: '{value}'")]
    BadValue {
        row: usize,
        column: String,
        expected: &'static str,
        value: String,
    },

    #[error("rows in this group disagree on {column}")]
    ConflictingField { column: String },

    #[error("at least one {list} entry is required")]
    NoEntries { list: &'static str },
}
