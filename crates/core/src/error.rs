use thiserror::Error;

#[derive(Debug, Error)]
pub enum WormError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("no process for service {service} in trace {trace_id}")]
    Attribution { trace_id: String, service: String },

    #[error("storage error: {0}")]
    Store(String),

    #[error("cycle error: {0}")]
    Cycle(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, WormError>;
