//! Error taxonomy for the stream core and fusion compiler.
//!
//! Mirrors the kinds (not concrete types) enumerated in the specification's error-handling
//! design: `OperatorFault`, `TypeFault`, `SourceFault`, `KernelFault`, `ProtocolFault`.
//! `CancelRequested` is deliberately not a variant here — cancellation is surfaced as plain
//! stream completion, never as an `Err`.

use thiserror::Error;

/// Result type used throughout the stream core.
pub type Result<T> = std::result::Result<T, NagareError>;

#[derive(Error, Debug, Clone)]
pub enum NagareError {
    /// A user-supplied operator closure (`map`/`filter`/`scan`/`Opaque`) raised a fault.
    #[error("operator fault at pipeline stage {stage}: {message}")]
    OperatorFault { stage: usize, message: String },

    /// A value reaching a typed operator had the wrong shape (e.g. non-numeric input to
    /// `windowedAggregate`). Always propagated, regardless of `ErrorPolicy`.
    #[error("type fault: expected {expected}, at pipeline stage {stage}")]
    TypeFault {
        expected: &'static str,
        stage: usize,
    },

    /// The underlying source raised or closed abnormally.
    #[error("source fault: {0}")]
    SourceFault(String),

    /// An external numeric kernel was not loaded or rejected its input.
    #[error("kernel fault: {0}")]
    KernelFault(String),

    /// Serialization/framing mismatch at a transport boundary.
    #[error("protocol fault: {0}")]
    ProtocolFault(String),
}

impl NagareError {
    pub fn operator_fault(stage: usize, message: impl Into<String>) -> Self {
        Self::OperatorFault {
            stage,
            message: message.into(),
        }
    }
}
