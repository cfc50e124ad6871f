use chrono::NaiveDateTime;
use thiserror::Error;

/// Failures surfaced by the rule engine. All of them are caller bugs or
/// malformed snapshots; the engine performs no I/O that could fail.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("date arithmetic out of range: {operation} from {base}")]
    DateOutOfRange {
        operation: String,
        base: NaiveDateTime,
    },

    #[error("item `{id}`: {source}")]
    Item {
        id: String,
        #[source]
        source: Box<RuleError>,
    },
}

impl RuleError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn out_of_range(operation: impl Into<String>, base: NaiveDateTime) -> Self {
        Self::DateOutOfRange {
            operation: operation.into(),
            base,
        }
    }

    pub(crate) fn for_item(id: impl Into<String>, source: RuleError) -> Self {
        Self::Item {
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// Returns true when the error, or the error it wraps, is an
    /// `InvalidArgument`.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Self::InvalidArgument(_) => true,
            Self::Item { source, .. } => source.is_invalid_argument(),
            Self::DateOutOfRange { .. } => false,
        }
    }
}

pub type Result<T, E = RuleError> = std::result::Result<T, E>;
