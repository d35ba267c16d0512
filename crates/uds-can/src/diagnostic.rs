//! Non-fatal diagnostics
//!
//! Decoders and packet builders that tolerate questionable input hand back
//! a [`Diagnostic`] next to their result instead of failing. Diagnostics
//! attached to a decoded STmin or a built [`CanPacket`] are also emitted
//! through `tracing`.
//!
//! [`CanPacket`]: crate::packet::CanPacket

use std::fmt;

/// Informational finding produced while encoding or decoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// Reserved STmin byte; the receiver falls back to the 127 ms maximum
    UnrecognizedStMin {
        /// Raw STmin byte as found on the bus
        raw: u8,
    },
    /// CAN FD frame padded to a DLC larger than the payload needs
    InefficientDlc {
        /// DLC that was used
        dlc: u8,
        /// Smallest DLC that would have carried the same data
        min_dlc: u8,
    },
}

impl Diagnostic {
    pub(crate) fn emit(self) -> Self {
        match self {
            Diagnostic::UnrecognizedStMin { raw } => {
                tracing::warn!(
                    raw = %format!("0x{:02X}", raw),
                    "Unrecognized STmin value, using 127 ms"
                );
            }
            Diagnostic::InefficientDlc { dlc, min_dlc } => {
                tracing::debug!(dlc, min_dlc, "Inefficient DLC, frame carries extra padding");
            }
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnrecognizedStMin { raw } => {
                write!(f, "unrecognized STmin value 0x{:02X}", raw)
            }
            Diagnostic::InefficientDlc { dlc, min_dlc } => {
                write!(f, "DLC {} used where DLC {} would suffice", dlc, min_dlc)
            }
        }
    }
}
