//! Error types for registry mutation and persistence.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Only explicit user
//! actions on the registry (`validate`, `upsert`, `import`, store access)
//! return errors; classification and matching never fail per-item — a
//! malformed item or a non-matching pattern simply yields no result.

use thiserror::Error;

/// Error type for pattern registry operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatternError {
    /// A regular expression failed to compile. Raised synchronously from
    /// `validate`/`upsert`/`import`; never from classification.
    #[error("invalid regex `{pattern}`: {reason}")]
    InvalidPattern {
        /// The rejected pattern source.
        pattern: String,
        /// Compiler diagnostic for the rejection.
        reason: String,
    },

    /// An operation referenced a rule id that is not in the registry.
    #[error("unknown rule id `{0}`")]
    UnknownRule(String),

    /// An attempt to delete a built-in rule. Built-ins can be disabled or
    /// shadowed by a user override, but their definitions are permanent so
    /// that reset-to-defaults always has something to restore.
    #[error("rule `{0}` is built in and cannot be removed; disable it instead")]
    BuiltinRule(String),

    /// A pattern store failed to load or save the rule set.
    #[error("pattern store error: {0}")]
    Storage(String),
}
