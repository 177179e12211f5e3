use thiserror::Error;

/// Failures raised while building or querying an ensemble.
#[derive(Debug, Error)]
pub enum EnsembleError {
    /// Member count or fraction values out of range. Detected before any member is trained.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Empty dataset or no usable (non-class) attributes.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A member answered with a probability vector of a different length than the first member.
    #[error("member {member} returned {found} class probabilities, expected {expected}")]
    DimensionMismatch {
        member: usize,
        expected: usize,
        found: usize,
    },

    #[error("instance has {found} values, the ensemble was trained on {expected} attributes")]
    SchemaMismatch { expected: usize, found: usize },

    #[error("ensemble has not been built")]
    NotBuilt,

    #[error("ensemble is already built; construct a new controller to train again")]
    AlreadyBuilt,

    /// Errors from the merit oracle, bootstrap sampler or base learner, passed through untouched.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EnsembleError>;
