//! Error types for request-ingestion failures.
//!
//! Each variant maps to one failure mode of the ingestion pipeline so the
//! request loop can distinguish stream-level parse failures, schema
//! violations, and descriptor-transfer failures. Transfer failures leave the
//! companion channel at an unknown position and are flagged as fatal to the
//! channel; everything else is recoverable at the loop level.

use thiserror::Error;

use crate::descriptor::TransferError;

/// Errors surfaced while reading and decoding one request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Control-stream bytes do not form a valid JSON document.
    #[error("control stream parse failed: {message}")]
    ParseFailed {
        /// Line number reported by the parser.
        line: usize,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Document shape or field types do not match the command schema.
    #[error("request does not conform to schema: {message}")]
    SchemaViolation { message: String },

    /// An `Args` element is not a string.
    #[error("argument {index} is not a string")]
    ArgNotString { index: usize },

    /// An `Env` value is not a string.
    #[error("environment value for '{key}' is not a string")]
    EnvValueNotString { key: String },

    /// Descriptor transfer failed; the companion channel position is
    /// unknown.
    #[error("descriptor transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// The request object has no keys.
    #[error("request object is empty")]
    EmptyRequest,

    /// The request kind is not recognised.
    #[error("unknown request kind '{kind}'")]
    UnknownRequestKind { kind: String },

    /// The document parsed but has the wrong top-level shape.
    #[error("malformed request: {message}")]
    MalformedRequest { message: String },
}

impl RequestError {
    /// True when the companion channel must be considered unusable.
    ///
    /// A transfer may have consumed part of a message, so no further
    /// descriptor position can be trusted. Parse and schema errors leave
    /// the channel untouched and the loop may continue.
    #[must_use]
    pub fn is_channel_fatal(&self) -> bool {
        matches!(self, Self::Transfer(_))
    }

    /// Line number of the parse failure, when this is one.
    #[must_use]
    pub fn parse_line(&self) -> Option<usize> {
        match self {
            Self::ParseFailed { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub(crate) fn parse_failed(source: serde_json::Error) -> Self {
        Self::ParseFailed {
            line: source.line(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn schema_violation(message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            message: message.into(),
        }
    }

    pub(crate) fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownRequestKind { kind: kind.into() }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }
}
