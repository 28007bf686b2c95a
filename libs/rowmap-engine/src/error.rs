use std::fmt;

use rowmap_api::{SourceError, TargetKind, ValueKind};

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The source failed before delivering any row.
    #[error("could not select from source: {0}")]
    Execution(SourceError),

    /// The source failed mid-stream, or delivered a malformed row.
    #[error("could not fetch values for row {row}: {source}")]
    Fetch { row: usize, source: SourceError },

    #[error(transparent)]
    Name(#[from] NameError),

    #[error("column '{column}': {source}")]
    Coercion {
        column: String,
        #[source]
        source: CoercionError,
    },

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("expected exactly one row, got more")]
    TooManyRows,

    #[error("no rows in result set")]
    NoRows,

    #[error("config error: {0}")]
    Config(String),
}

impl MapError {
    /// Add context to the error.
    ///
    /// Message-carrying variants get `"ctx: message"`; structured variants
    /// are returned unchanged (they already name their column and type).
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        match self {
            MapError::Execution(e) => MapError::Execution(e.with_context(ctx)),
            MapError::Fetch { row, source } => MapError::Fetch {
                row,
                source: source.with_context(ctx),
            },
            MapError::Shape(msg) => MapError::Shape(format!("{ctx}: {msg}")),
            MapError::Config(msg) => MapError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }

    pub(crate) fn coercion(column: &str, source: CoercionError) -> Self {
        MapError::Coercion {
            column: column.to_string(),
            source,
        }
    }
}

/// Why a column could not be matched to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameErrorKind {
    /// No field matches.
    Missing,
    /// Several fields normalize to the same key.
    Ambiguous(Vec<&'static str>),
}

/// A column name with no unique destination field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameError {
    pub column: String,
    /// Destination record type name.
    pub target: &'static str,
    pub kind: NameErrorKind,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NameErrorKind::Missing => write!(
                f,
                "row returned column name '{}' which was not found in destination {}",
                self.column, self.target
            ),
            NameErrorKind::Ambiguous(fields) => write!(
                f,
                "column name '{}' matches several fields of destination {}: {}",
                self.column,
                self.target,
                fields.join(", ")
            ),
        }
    }
}

impl std::error::Error for NameError {}

/// A value whose runtime kind cannot be converted to the destination kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    pub reason: String,
    pub source: ValueKind,
    pub target: TargetKind,
}

impl CoercionError {
    pub fn new(source: ValueKind, target: TargetKind, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            source,
            target,
        }
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot convert {} to {}: {}",
            self.source, self.target, self.reason
        )
    }
}

impl std::error::Error for CoercionError {}
