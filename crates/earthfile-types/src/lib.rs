//! Shared types for the Earthfile front end.
//!
//! This crate defines the parse-tree nodes handed to the interpreter,
//! target/artifact references, platform specifiers and the error taxonomy
//! reported by interpretation.

mod error;
mod span;
pub mod ast;
pub mod domain;
pub mod platform;

pub use domain::{Artifact, ReferenceError, Target, TargetLocation};
pub use error::{Diagnostic, EarthError, ErrorCategory};
pub use platform::{Platform, PlatformError};
pub use span::Span;

/// Result type used throughout the interpreter.
pub type Result<T> = std::result::Result<T, EarthError>;
