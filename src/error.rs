use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Malformed stage-status event: {0}")]
    MalformedEvent(String),

    #[error("Unknown state for stage: {0}")]
    UnknownStageState(String),

    #[error("Bitbucket request failed: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unhandled plugin request: {0}")]
    UnhandledRequest(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NotifierError>;
