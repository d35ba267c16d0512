//! CAN Data Length Code (DLC) handling
//!
//! Classic CAN maps DLC 0-8 linearly onto data bytes. CAN FD adds the
//! discrete steps 12, 16, 20, 24, 32, 48 and 64 for DLC 9-15.

use crate::diagnostic::Diagnostic;
use crate::error::{CanError, CanResult};

/// Lowest DLC at which frames may be padded.
///
/// A DLC below 8 is only legal when the frame carries no padding
/// (CAN frame data optimization).
pub const MIN_BASE_UDS_DLC: u8 = 8;

/// Highest DLC value (4-bit field)
pub const MAX_DLC_VALUE: u8 = 15;

/// Filler byte used when padding is requested without an explicit value
pub const DEFAULT_FILLER_BYTE: u8 = 0xCC;

/// Data bytes carried per DLC value, indexed by DLC
const DATA_BYTES: [usize; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 16, 20, 24, 32, 48, 64];

/// Number of data bytes carried by a frame with the given DLC
pub fn decode_dlc(dlc: u8) -> CanResult<usize> {
    DATA_BYTES
        .get(usize::from(dlc))
        .copied()
        .ok_or_else(|| CanError::invalid_value(format!("DLC {} is not in range 0-15", dlc)))
}

/// DLC for an exact number of data bytes
pub fn encode_dlc(data_bytes_number: usize) -> CanResult<u8> {
    DATA_BYTES
        .iter()
        .position(|&n| n == data_bytes_number)
        .map(|dlc| dlc as u8)
        .ok_or_else(|| {
            CanError::invalid_value(format!(
                "{} is not a valid number of CAN frame data bytes",
                data_bytes_number
            ))
        })
}

/// Smallest DLC whose capacity is at least `data_bytes_number`
pub fn get_min_dlc(data_bytes_number: usize) -> CanResult<u8> {
    let idx = DATA_BYTES.partition_point(|&n| n < data_bytes_number);
    if idx >= DATA_BYTES.len() {
        return Err(CanError::invalid_value(format!(
            "{} data bytes do not fit into any CAN frame",
            data_bytes_number
        )));
    }
    Ok(idx as u8)
}

/// Whether the DLC only exists on CAN FD
pub fn is_can_fd_specific_dlc(dlc: u8) -> bool {
    dlc > 8 && dlc <= MAX_DLC_VALUE
}

/// Check a data byte count.
///
/// With `exact` the count must match a DLC step, otherwise it must merely
/// fit into the largest frame.
pub fn validate_data_bytes_number(data_bytes_number: usize, exact: bool) -> CanResult<()> {
    if exact {
        encode_dlc(data_bytes_number).map(|_| ())
    } else {
        get_min_dlc(data_bytes_number).map(|_| ())
    }
}

/// Report a CAN FD DLC that is larger than the content requires.
///
/// `min_dlc` is the smallest DLC that carries the frame's content. Classic
/// CAN DLCs never count as inefficient since padding up to 8 is mandatory.
pub fn padding_diagnostic(dlc: u8, min_dlc: u8) -> Option<Diagnostic> {
    let needed = min_dlc.max(MIN_BASE_UDS_DLC);
    (dlc > needed).then_some(Diagnostic::InefficientDlc {
        dlc,
        min_dlc: needed,
    })
}

/// Resolve the DLC a strict builder should use.
///
/// `min_dlc` is the smallest DLC carrying the frame content unpadded.
pub(crate) fn resolve_frame_dlc(min_dlc: u8, dlc: Option<u8>) -> CanResult<u8> {
    let Some(dlc) = dlc else {
        return Ok(min_dlc);
    };
    decode_dlc(dlc)?;
    if dlc < min_dlc {
        return Err(CanError::inconsistency(format!(
            "frame content needs DLC {} but DLC {} was requested",
            min_dlc, dlc
        )));
    }
    if dlc < MIN_BASE_UDS_DLC && dlc != min_dlc {
        return Err(CanError::inconsistency(format!(
            "padding is only allowed with DLC >= {}, got DLC {}",
            MIN_BASE_UDS_DLC, dlc
        )));
    }
    Ok(dlc)
}
