//! Runtime failure taxonomy.
//!
//! Three families, matching how far a failure is allowed to travel:
//!
//! - [`LoadFailure`] — a plugin, language or program source could not be
//!   resolved. Surfaced to the caller before any evaluation starts.
//! - [`ExecutionFailure`] — user source failed to parse or run. Reported
//!   to the editing surface; messages already delivered to the embed are
//!   not rolled back.
//! - [`ProtocolViolation`] — a malformed envelope reached the embed. Never
//!   propagated: the driver logs it and carries on.

use std::path::PathBuf;

use thiserror::Error;

/// Resolution or fetch of a plugin, language, or program failed.
///
/// Never fatal to the host; the caller shows a load error and keeps going.
#[derive(Debug, Error)]
pub enum LoadFailure {
    /// No plugin registered under this identifier.
    #[error("unknown plugin '{plugin}'")]
    UnknownPlugin { plugin: String },

    /// The plugin exists but has no implementation for this language.
    #[error("plugin '{plugin}' has no '{language}' implementation")]
    UnknownLanguage { plugin: String, language: String },

    /// The program source file could not be read.
    #[error("failed to read program for plugin '{plugin}' from {path}: {source}")]
    Program {
        plugin: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// User source threw during parsing or interpretation.
///
/// Contained at the execution host boundary: the channel and the embed's
/// state machine never see it.
#[derive(Debug, Error)]
#[error("execution failed for plugin '{plugin}': {kind}")]
pub struct ExecutionFailure {
    /// Plugin the failing program was targeting.
    pub plugin: String,
    pub kind: ExecutionErrorKind,
}

/// What went wrong while running user source.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    #[error("parse error at line {line}: {message}")]
    Parse { line: u32, message: String },

    /// The program referenced an identifier outside the capability object.
    /// There is deliberately no fallback to ambient state.
    #[error("unknown operation '{name}'")]
    UnknownOperation { name: String },

    #[error("operation '{name}' expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    /// The configured step budget ran out before the program finished.
    #[error("step budget of {limit} exhausted")]
    BudgetExhausted { limit: u32 },
}

/// A malformed or unrecognized envelope arrived at the embed.
///
/// Absorbed where it happens: logged, reported on the advisory lane, and
/// otherwise ignored so the visible model stays valid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("envelope is not a recognized control shape: {detail}")]
    MalformedEnvelope { detail: String },
}

/// Binary-level sum of the failures an `execute` round trip can produce.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Load(#[from] LoadFailure),

    #[error(transparent)]
    Execution(#[from] ExecutionFailure),
}
