use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecSysError>;

/// Errors surfaced to the caller of the recommendation and evaluation stages
#[derive(Debug, Error)]
pub enum RecSysError {
    /// predict/rank called before any fit pass populated the registry
    #[error("Algorithm not fit! You must call the fit() method first, or fit_rank()/fit_predict()")]
    NotFitted,

    #[error("{0} is not a score prediction algorithm")]
    NotPredictionAlg(String),

    #[error("{0} is not a ranking algorithm")]
    NotRankingAlg(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Content error: {0}")]
    Content(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_cbor::Error> for RecSysError {
    fn from(err: serde_cbor::Error) -> Self {
        RecSysError::Serialization(err.to_string())
    }
}

impl From<envy::Error> for RecSysError {
    fn from(err: envy::Error) -> Self {
        RecSysError::Configuration(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for RecSysError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        RecSysError::Configuration(format!("failed to build thread pool: {}", err))
    }
}

/// Outcome of a failed per-user `process_rated` / `fit`
///
/// `UserSkip` is recoverable: the orchestration logs it, marks the user as
/// skipped and moves on. `Fatal` aborts the whole call.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("{0}")]
    UserSkip(String),

    #[error(transparent)]
    Fatal(#[from] RecSysError),
}

impl FitError {
    pub fn user_skip(reason: impl Into<String>) -> Self {
        FitError::UserSkip(reason.into())
    }
}
