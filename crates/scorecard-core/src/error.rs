//! Error types for scorecard-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Which kind of address a registry operation was about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// The auxiliary region holding a question's metadata, labels and scores
    DataRegion,
    /// The label/score column pair used for lookups
    ScoredRegion,
    /// The cell holding the user's selection
    AnswerSlot,
}

impl std::fmt::Display for AddressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AddressKind::DataRegion => "data region",
            AddressKind::ScoredRegion => "scored region",
            AddressKind::AnswerSlot => "answer slot",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in scorecard-core
///
/// `MissingAddress`, `DuplicateAddress` and `OverlappingRegion` are internal
/// invariant violations: they mean the layout pass is wrong, not the input.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid column letters or A1 reference
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u32),

    /// A question was referenced before its address was recorded
    #[error("No {kind} recorded for question {question}")]
    MissingAddress { question: String, kind: AddressKind },

    /// An address was recorded twice for the same question
    #[error("{kind} for question {question} was already recorded")]
    DuplicateAddress { question: String, kind: AddressKind },

    /// Two questions were assigned intersecting cells
    #[error("{kind} of question {question} overlaps question {other} in table '{table}'")]
    OverlappingRegion {
        question: String,
        other: String,
        table: String,
        kind: AddressKind,
    },

    /// A sink operation referenced a region that was never created
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    /// A region with this id already exists in the sink
    #[error("Region already exists: {0}")]
    DuplicateRegion(String),

    /// Failure reported by a grid sink implementation
    #[error("Sink error: {0}")]
    Sink(String),
}

impl Error {
    /// Create a sink error with a message
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Error::Sink(msg.into())
    }
}
