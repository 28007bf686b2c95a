use std::fmt;

/// Category of a row source failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The query could not be executed.
    Query,
    /// Values for a row could not be fetched or decoded.
    Fetch,
    /// The source was cancelled or timed out.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Query => f.write_str("query"),
            ErrorKind::Fetch => f.write_str("fetch"),
            ErrorKind::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Error reported by a row source (the query-execution side).
///
/// The engine never retries on it; it is surfaced to the caller with
/// added context.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: ErrorKind,
    message: String,
}

impl SourceError {
    pub fn query(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Query, message: msg.into() }
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Fetch, message: msg.into() }
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Cancelled, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Debug for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_kind() {
        let err = SourceError::cancelled("statement timeout").with_context("row 3");
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.to_string(), "row 3: statement timeout");
        assert_eq!(format!("{err:?}"), "[cancelled] row 3: statement timeout");
    }
}
