use thiserror::Error;

/// Errors raised while configuring or exploring the attacker model.
///
/// Configuration errors are reported eagerly with no partial effect. Oracle
/// failures abort generation. [`AttackerModelError::UnknownGuessVariable`] is
/// an internal invariant violation: the enumerator and the schema are built
/// from the same secret-variable list, so it cannot occur through the public
/// API.
#[derive(Debug, Error)]
pub enum AttackerModelError {
    #[error("This model has no constants to set")]
    ConstantsNotSupported,
    #[error("secret variable `{name}` has an empty domain [{lo}, {hi}]")]
    EmptyDomain { name: String, lo: i64, hi: i64 },
    #[error("guess space is too large to enumerate")]
    GuessSpaceOverflow,
    #[error("secret variable `{0}` is declared more than once")]
    DuplicateVariable(String),
    #[error("secret variable name `{0}` is reserved")]
    ReservedVariable(String),
    #[error("Label \"{0}\" not defined")]
    UnknownLabel(String),
    #[error("probability oracle failed: {0}")]
    Oracle(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("malformed program configuration {context_id}: {reason}")]
    MalformedConfiguration { context_id: usize, reason: String },
    #[error("malformed state vector {vector}: {reason}")]
    MalformedVector { vector: String, reason: String },
    #[error("no state has been explored")]
    NotExplored,
    #[error("choice {choice} out of range ({count} choices)")]
    ChoiceOutOfRange { choice: usize, count: usize },
    #[error("transition {offset} of choice {choice} out of range ({count} transitions)")]
    TransitionOutOfRange {
        choice: usize,
        offset: usize,
        count: usize,
    },
    #[error("internal error: guess has no value for secret variable `{0}`")]
    UnknownGuessVariable(String),
}
