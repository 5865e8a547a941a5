use thiserror::Error;
use trigger_doc::DocError;

pub type Result<T> = std::result::Result<T, ContextError>;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error(transparent)]
    Doc(#[from] DocError),

    #[error("Unknown record root: <{0}>")]
    UnknownRecord(String),

    #[error("Record <{0}> holds no trigger context")]
    MissingContext(String),

    #[error("Summary error: {0}")]
    Summary(#[from] serde_json::Error),
}
