use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusLoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no documents loaded from {0}")]
    EmptyCorpus(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("corpus not loaded yet")]
    CorpusUnavailable,

    #[error("answer generation failed: {0}")]
    Generation(String),
}

pub type Result<T, E = QueryError> = std::result::Result<T, E>;
