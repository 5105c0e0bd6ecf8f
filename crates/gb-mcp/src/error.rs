//! Error taxonomy for the command surface.
//!
//! Three layers, three enums: the service guards emulator state, dispatch
//! guards the wire contract, sessions guard channel routing. Every failure
//! becomes a structured `{code, message}` on the wire — a raw error never
//! crosses the transport boundary.

use std::path::PathBuf;

use thiserror::Error;

use gb_engine::EngineError;

/// JSON-RPC error codes used on the wire.
pub mod code {
    /// Request line was not valid JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// Request was structurally invalid (wrong JSON-RPC version).
    pub const INVALID_REQUEST: i32 = -32600;
    /// Command name is not registered.
    pub const UNKNOWN_COMMAND: i32 = -32601;
    /// A parameter failed validation.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Service-side failure (not loaded, unreadable image, engine fault).
    pub const SERVER_ERROR: i32 = -32000;
    /// Command was tagged with an unknown or expired session id.
    pub const SESSION_NOT_FOUND: i32 = -32001;
}

/// Failure inside the control service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A mutating or snapshot operation ran before any ROM was loaded.
    #[error("no ROM loaded — call load_rom first")]
    NotLoaded,

    /// The requested image path did not resolve to a readable file.
    #[error("cannot read ROM {path}: {source}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An argument survived wire validation but is invalid for the service.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine collaborator faulted during load or step.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The screen codec could not encode the framebuffer.
    #[error("screen encode failed: {0}")]
    Encode(String),
}

/// Failure at the dispatch layer.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The command name is not part of the static command set.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A parameter failed schema validation; names the offending field.
    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: String,
    },

    /// The ROM directory could not be read.
    #[error("ROM directory error: {0}")]
    RomDir(#[from] std::io::Error),

    /// The service rejected or failed the operation.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl DispatchError {
    /// Wire code for this error.
    #[must_use]
    pub fn wire_code(&self) -> i32 {
        match self {
            Self::UnknownCommand(_) => code::UNKNOWN_COMMAND,
            Self::InvalidParameter { .. } => code::INVALID_PARAMS,
            Self::Service(ServiceError::InvalidArgument(_)) => code::INVALID_PARAMS,
            Self::RomDir(_) | Self::Service(_) => code::SERVER_ERROR,
        }
    }
}

/// Failure at the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No open session carries this id. Commands for closed sessions are
    /// rejected, never queued or retried.
    #[error("unknown session: {0}")]
    NotFound(String),

    /// The session's channel failed mid-write; the session is now closed.
    #[error("session channel closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_match_error_class() {
        assert_eq!(
            DispatchError::UnknownCommand("zap".to_string()).wire_code(),
            code::UNKNOWN_COMMAND
        );
        assert_eq!(
            DispatchError::InvalidParameter {
                field: "duration_frames",
                reason: "must be a positive integer".to_string(),
            }
            .wire_code(),
            code::INVALID_PARAMS
        );
        assert_eq!(
            DispatchError::Service(ServiceError::NotLoaded).wire_code(),
            code::SERVER_ERROR
        );
        assert_eq!(
            DispatchError::Service(ServiceError::InvalidArgument("n".to_string())).wire_code(),
            code::INVALID_PARAMS
        );
    }
}
