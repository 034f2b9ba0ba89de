//! Query validation for chat-supplied requests before they are sent upstream.

/// Query validation errors with player-facing messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Request is empty")]
    Empty,

    #[error("Request is too long (maximum {max} characters)")]
    TooLong { max: usize },
}

/// Clean a raw chat query: drop control characters, collapse runs of whitespace and
/// enforce the configured length cap (counted in characters, not bytes).
pub fn sanitize_query(raw: &str, max_chars: usize) -> Result<String, QueryError> {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return Err(QueryError::Empty);
    }
    if collapsed.chars().count() > max_chars {
        return Err(QueryError::TooLong { max: max_chars });
    }
    Ok(collapsed)
}
