//! Error types for CAN packet encoding and segmentation

use thiserror::Error;

/// Errors raised by the CAN transport codecs and the segmenter
#[derive(Debug, Error)]
pub enum CanError {
    /// Input has the wrong shape (e.g. an unparsable enum name)
    #[error("invalid type: {0}")]
    InvalidType(String),

    /// Value outside its legal domain (e.g. DLC > 15, SF_DL of 0)
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Individually valid fields that combine into a frame ISO 15765-2 forbids
    #[error("protocol inconsistency: {0}")]
    ProtocolInconsistency(String),

    /// Addressing change would reinterpret already encoded bytes
    #[error("addressing ambiguity: {0}")]
    AddressingAmbiguity(String),

    /// Attempt to re-assign a field that is fixed at construction
    #[error("immutable field: {0}")]
    ImmutableFieldViolation(String),

    /// Message cannot be segmented, or packets do not form a complete message
    #[error("segmentation error: {0}")]
    Segmentation(String),

    /// Decoder reached a packet type or format it has no handler for
    #[error("unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CAN transport operations
pub type CanResult<T> = Result<T, CanError>;

impl CanError {
    pub(crate) fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    pub(crate) fn inconsistency(msg: impl Into<String>) -> Self {
        Self::ProtocolInconsistency(msg.into())
    }

    pub(crate) fn segmentation(msg: impl Into<String>) -> Self {
        Self::Segmentation(msg.into())
    }
}
