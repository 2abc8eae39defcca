use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limit exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("API request failed: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("{stage} failed: {status} - {body}")]
    Poll {
        stage: PollStage,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures that stem from what the caller asked for rather than from the API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("No log found with name '{0}'")]
    LogNotFound(String),

    #[error("No logset found with name '{0}'")]
    LogsetNotFound(String),

    #[error("Multiple logs found with name '{0}'; use UUID instead")]
    AmbiguousLog(String),

    #[error("Multiple logsets found with name '{0}'; use UUID instead")]
    AmbiguousLogset(String),

    #[error("No logsets found in organization")]
    NoLogsets,

    #[error("invalid query request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStage {
    Polling,
    Pagination,
}

impl fmt::Display for PollStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollStage::Polling => "Polling",
            PollStage::Pagination => "Result pagination",
        };
        write!(f, "{}", s)
    }
}

impl Error {
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Authentication(_))
    }
}
