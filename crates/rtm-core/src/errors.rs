//! Error types and reserved outcome codes.

use thiserror::Error;

// ── Reserved outcome codes ──────────────────────────────────────────

/// Outcome code of a successful operation.
pub const ERR_OK: i32 = 0;
/// Reserved code for a command naming a handle absent from the registry.
pub const ERR_UNKNOWN_HANDLE: i32 = -1;

/// Failure reported by the engine for one asynchronous operation.
///
/// The code is engine-defined and nonzero; it is relayed verbatim to the
/// host as the outcome's `errorCode`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("engine error {code}: {message}")]
pub struct EngineError {
    /// Engine-defined failure code (nonzero).
    pub code: i32,
    /// Human-readable description, logged but not sent to the host.
    pub message: String,
}

impl EngineError {
    /// Create an engine error with the given code.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// The single hard rejection in the command decode path.
///
/// Malformed *arguments* degrade to neutral defaults; an unrecognized
/// command *name* has no variant to decode into and is reported back to
/// the host as unhandled.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandDecodeError {
    /// The command name matches no known operation.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}
