use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,
    #[error("query is {len} characters long; the limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// Trims the raw input and checks it against the length limit.
///
/// The limit counts characters, not bytes.
pub fn validate_query(raw: &str, max_len: usize) -> Result<String, QueryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QueryError::Empty);
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(QueryError::TooLong { len, max: max_len });
    }
    Ok(trimmed.to_owned())
}
