//! Domain errors for the tree engine, the level codec and query templating.
//!
//! Command plumbing stays on `anyhow`; these are the failures callers are
//! expected to match on and degrade from (empty forest, default template).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A row names a level whose parent id was never inserted at the level above.
    #[error("parent not found: row {row}, level {level} (`{id}` has no parent `{parent}`)")]
    Format {
        row: usize,
        level: usize,
        id: String,
        parent: String,
    },
    /// The same id reappeared under one parent with a different name or type
    /// while the duplicate policy is `error`.
    #[error("conflicting duplicate `{id}` at row {row}: `{existing}` vs `{incoming}`")]
    Conflict {
        row: usize,
        id: String,
        existing: String,
        incoming: String,
    },
    #[error("field `{0}` not found in data header")]
    MissingField(String),
    #[error("invalid query template: {0}")]
    Template(String),
    #[error("invalid slot assignment: type={type_slot}, company={company_slot}")]
    InvalidSlots { type_slot: usize, company_slot: usize },
    #[error("invalid integer array `{0}`")]
    InvalidArray(String),
}
