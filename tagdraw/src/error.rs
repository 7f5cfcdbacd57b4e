#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("not enough eligible entries: required {required}, available {available}")]
    InsufficientPool { required: usize, available: usize },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DrawError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        DrawError::InvalidInput(reason.into())
    }
}

/// Parses a requested winner count. Negative, fractional and non-numeric values are rejected
/// before any draw happens.
pub fn parse_count(raw: &str) -> Result<usize, DrawError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DrawError::invalid("count is empty"));
    }
    raw.parse::<usize>().map_err(|_| DrawError::invalid(format!("count must be a non-negative integer, got {raw:?}")))
}
