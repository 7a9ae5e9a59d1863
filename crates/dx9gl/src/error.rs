//! Fatal translation errors.
//!
//! Translation has exactly two failure modes and no recoverable one: either
//! the token stream broke the bytecode protocol (the upstream compiler is
//! assumed to have validated it, so this means the stream is corrupt or not a
//! shader at all), or the stream is well formed but uses an instruction or
//! modifier this translator has no emission strategy for. Both abort the call
//! immediately; there is never partial output.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// The token stream violates the D3D9 shader bytecode protocol.
    #[error("protocol violation at token {token_index}: {message}")]
    Protocol { token_index: usize, message: String },

    /// A well-formed instruction has no emission strategy for this profile.
    #[error("no emission strategy for `{opcode}` at token {token_index}: {message}")]
    Coverage {
        token_index: usize,
        opcode: &'static str,
        message: String,
    },
}

impl TranslateError {
    /// Token index the error was raised at, for callers that want to hexdump
    /// the offending stream region.
    pub fn token_index(&self) -> usize {
        match self {
            TranslateError::Protocol { token_index, .. } => *token_index,
            TranslateError::Coverage { token_index, .. } => *token_index,
        }
    }
}

/// Single construction path for protocol violations.
pub(crate) fn protocol(token_index: usize, message: impl Into<String>) -> TranslateError {
    let message = message.into();
    tracing::error!(token_index, %message, "d3d9 shader protocol violation");
    TranslateError::Protocol {
        token_index,
        message,
    }
}

/// Single construction path for coverage gaps.
pub(crate) fn coverage(
    token_index: usize,
    opcode: &'static str,
    message: impl Into<String>,
) -> TranslateError {
    let message = message.into();
    tracing::error!(token_index, opcode, %message, "d3d9 shader coverage gap");
    TranslateError::Coverage {
        token_index,
        opcode,
        message,
    }
}
