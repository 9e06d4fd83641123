//! Error types for the analytics engine.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors surfaced by the analytics store and its durable backing.
#[derive(Error, Debug)]
pub enum StatsError {
    /// Reading or writing a durable slot failed at the I/O level.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding records for a durable slot failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A durable slot exists but does not parse back into records.
    #[error("corrupt durable slot '{slot}': {source}")]
    CorruptSlot {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    /// The store has been closed; no further operations are accepted.
    #[error("store is closed")]
    StoreClosed,

    #[error("{0}")]
    Other(String),
}
