use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Broad class of an interpretation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Unknown option, missing option value, malformed value.
    Option,
    /// Wrong number or shape of positional arguments.
    Arity,
    /// Mixed artifact/plain sources, disallowed option combinations.
    Reference,
    /// Cross-statement invariants: blocks, push-only mode, target names.
    State,
    /// Recognized but not implemented.
    Unsupported,
    /// Replaced by a newer form.
    Obsolete,
    /// The requested target was never declared.
    NotFound,
    /// The graph builder rejected an operation.
    Builder,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Option => "option",
            Self::Arity => "arity",
            Self::Reference => "reference",
            Self::State => "state",
            Self::Unsupported => "unsupported",
            Self::Obsolete => "obsolete",
            Self::NotFound => "not_found",
            Self::Builder => "builder",
        };
        f.write_str(name)
    }
}

/// The single terminal error of an Earthfile interpretation.
///
/// Messages carry the statement keyword and its raw words so the offending
/// line can be found without positions.
#[derive(Debug, Error)]
pub enum EarthError {
    #[error("invalid {command} arguments {words:?}: {reason}")]
    OptionDecode {
        command: String,
        words: Vec<String>,
        reason: String,
    },

    #[error("{0}")]
    InvalidValue(String),

    #[error("{0}")]
    Arity(String),

    #[error("{0}")]
    ReferenceConflict(String),

    #[error("{0}")]
    StateInvariant(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("{command} is obsolete. Please use {replacement}")]
    Obsolete {
        command: String,
        replacement: String,
    },

    #[error("target {0} not defined")]
    TargetNotFound(String),

    #[error("{context}: {source}")]
    Builder {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl EarthError {
    pub fn arity(msg: impl Into<String>) -> Self {
        Self::Arity(msg.into())
    }

    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ReferenceConflict(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::StateInvariant(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn obsolete(command: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self::Obsolete {
            command: command.into(),
            replacement: replacement.into(),
        }
    }

    /// Wrap a graph builder failure with a description of the statement.
    pub fn builder(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Builder {
            context: context.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::OptionDecode { .. } | Self::InvalidValue(_) => ErrorCategory::Option,
            Self::Arity(_) => ErrorCategory::Arity,
            Self::ReferenceConflict(_) => ErrorCategory::Reference,
            Self::StateInvariant(_) => ErrorCategory::State,
            Self::Unsupported(_) => ErrorCategory::Unsupported,
            Self::Obsolete { .. } => ErrorCategory::Obsolete,
            Self::TargetNotFound(_) => ErrorCategory::NotFound,
            Self::Builder { .. } => ErrorCategory::Builder,
        }
    }

    /// Structured form for tooling that must not parse messages.
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            category: self.category(),
            message: self.to_string(),
        }
    }
}

/// Serializable summary of an [`EarthError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub message: String,
}
