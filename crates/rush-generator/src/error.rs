/// Errors talking to the part generator.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generator returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed generator response: {0}")]
    Decode(String),

    #[error("generator part {part} has stat {value}, which exceeds 255")]
    InvalidStat { part: usize, value: u16 },

    #[error("invalid generator endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Result alias for generator calls.
pub type GeneratorResult<T> = Result<T, GeneratorError>;
