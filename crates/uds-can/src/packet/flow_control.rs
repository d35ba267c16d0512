//! Flow Control (FC) codec and STmin conversion
//!
//! ```text
//! [AI] 0x3S  BS  STmin     S = flow status
//! ```
//!
//! BS and STmin only carry meaning with ContinueToSend; Wait and Overflow
//! frames hold filler bytes in their place.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ai_prefix, n_pci_of, pad_to_dlc, CanPacketType};
use crate::addressing::AddressingFormat;
use crate::diagnostic::Diagnostic;
use crate::dlc::{encode_dlc, get_min_dlc as min_dlc_for, resolve_frame_dlc, MIN_BASE_UDS_DLC};
use crate::error::{CanError, CanResult};

const FC_BYTES: usize = 3;

/// Largest STmin byte that encodes whole milliseconds
const MAX_ST_MIN_MS: u8 = 0x7F;
/// STmin bytes encoding 100-900 microseconds
const ST_MIN_100US_RANGE: std::ops::RangeInclusive<u8> = 0xF1..=0xF9;

/// Flow status carried in the low N_PCI nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum FlowStatus {
    ContinueToSend = 0x0,
    Wait = 0x1,
    Overflow = 0x2,
}

impl TryFrom<u8> for FlowStatus {
    type Error = CanError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(FlowStatus::ContinueToSend),
            0x1 => Ok(FlowStatus::Wait),
            0x2 => Ok(FlowStatus::Overflow),
            other => Err(CanError::invalid_value(format!(
                "flow status 0x{:X} is reserved",
                other
            ))),
        }
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowStatus::ContinueToSend => "ContinueToSend",
            FlowStatus::Wait => "Wait",
            FlowStatus::Overflow => "Overflow",
        };
        f.write_str(s)
    }
}

/// Decoded STmin value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StMinDecoded {
    /// Minimum separation time in milliseconds
    pub time_ms: f64,
    /// Set when the raw byte was reserved and the maximum was substituted
    pub diagnostic: Option<Diagnostic>,
}

impl StMinDecoded {
    pub fn as_duration(&self) -> Duration {
        Duration::from_micros((self.time_ms * 1000.0).round() as u64)
    }
}

/// Whether the STmin byte encodes a defined time value
pub fn is_st_min_time_value(raw: u8) -> bool {
    raw <= MAX_ST_MIN_MS || ST_MIN_100US_RANGE.contains(&raw)
}

/// Convert an STmin byte into milliseconds.
///
/// Reserved bytes decode to 127 ms together with a diagnostic.
pub fn decode_st_min(raw: u8) -> StMinDecoded {
    if raw <= MAX_ST_MIN_MS {
        return StMinDecoded {
            time_ms: f64::from(raw),
            diagnostic: None,
        };
    }
    if ST_MIN_100US_RANGE.contains(&raw) {
        return StMinDecoded {
            time_ms: f64::from(raw - 0xF0) / 10.0,
            diagnostic: None,
        };
    }
    StMinDecoded {
        time_ms: f64::from(MAX_ST_MIN_MS),
        diagnostic: Some(Diagnostic::UnrecognizedStMin { raw }.emit()),
    }
}

/// Convert milliseconds into an STmin byte
pub fn encode_st_min(time_ms: f64) -> CanResult<u8> {
    let whole = time_ms.round();
    if (whole - time_ms).abs() < 1e-9 && (0.0..=f64::from(MAX_ST_MIN_MS)).contains(&whole) {
        return Ok(whole as u8);
    }
    let tenths = (time_ms * 10.0).round();
    if (tenths - time_ms * 10.0).abs() < 1e-9 && (1.0..=9.0).contains(&tenths) {
        return Ok(0xF0 + tenths as u8);
    }
    Err(CanError::invalid_value(format!(
        "{} ms cannot be encoded as STmin",
        time_ms
    )))
}

/// Whether the N_PCI nibble marks a Flow Control frame
pub fn is_flow_control(format: AddressingFormat, raw_frame_data: &[u8]) -> bool {
    n_pci_of(format, raw_frame_data) == Some(CanPacketType::FlowControl as u8)
}

/// Smallest DLC of a Flow Control frame
pub fn get_min_dlc(format: AddressingFormat) -> CanResult<u8> {
    min_dlc_for(format.ai_data_bytes_number() + FC_BYTES)
}

fn fc_pci(flow_status: u8) -> u8 {
    ((CanPacketType::FlowControl as u8) << 4) | flow_status
}

/// Build a compliant Flow Control frame.
///
/// ContinueToSend requires `block_size` and `st_min`. For Wait and Overflow
/// they are ignored and filler takes their place.
pub fn create_data(
    format: AddressingFormat,
    ai_byte: Option<u8>,
    flow_status: FlowStatus,
    block_size: Option<u8>,
    st_min: Option<u8>,
    dlc: Option<u8>,
    filler_byte: u8,
) -> CanResult<Vec<u8>> {
    let mut frame = ai_prefix(format, ai_byte)?;
    let dlc = resolve_frame_dlc(get_min_dlc(format)?, dlc)?;
    frame.push(fc_pci(flow_status as u8));
    if flow_status == FlowStatus::ContinueToSend {
        let (Some(block_size), Some(st_min)) = (block_size, st_min) else {
            return Err(CanError::invalid_value(
                "ContinueToSend requires block size and STmin",
            ));
        };
        frame.extend_from_slice(&[block_size, st_min]);
    } else {
        if block_size.is_some() || st_min.is_some() {
            tracing::debug!(
                flow_status = %flow_status,
                ?block_size,
                ?st_min,
                "Ignoring block size and STmin, flow status does not use them"
            );
        }
        frame.extend_from_slice(&[filler_byte, filler_byte]);
    }
    pad_to_dlc(&mut frame, dlc, filler_byte)?;
    Ok(frame)
}

/// Build Flow Control bytes without consistency checks.
///
/// Any flow status nibble is accepted; missing BS or STmin become filler.
pub fn generate_data(
    format: AddressingFormat,
    ai_byte: Option<u8>,
    flow_status: u8,
    block_size: Option<u8>,
    st_min: Option<u8>,
    dlc: u8,
    filler_byte: u8,
) -> CanResult<Vec<u8>> {
    if flow_status > 0xF {
        return Err(CanError::invalid_value(format!(
            "flow status 0x{:X} exceeds 4 bits",
            flow_status
        )));
    }
    let mut frame = ai_prefix(format, ai_byte)?;
    frame.push(fc_pci(flow_status));
    frame.push(block_size.unwrap_or(filler_byte));
    frame.push(st_min.unwrap_or(filler_byte));
    pad_to_dlc(&mut frame, dlc, filler_byte)?;
    Ok(frame)
}

fn fc_byte(format: AddressingFormat, raw_frame_data: &[u8], offset: usize) -> CanResult<u8> {
    raw_frame_data
        .get(format.ai_data_bytes_number() + offset)
        .copied()
        .ok_or_else(|| CanError::invalid_value("frame too short for a Flow Control"))
}

pub fn extract_flow_status(
    format: AddressingFormat,
    raw_frame_data: &[u8],
) -> CanResult<FlowStatus> {
    FlowStatus::try_from(fc_byte(format, raw_frame_data, 0)? & 0x0F)
}

pub fn extract_block_size(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<u8> {
    fc_byte(format, raw_frame_data, 1)
}

/// Raw STmin byte; see [`decode_st_min`] for the time value
pub fn extract_st_min(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<u8> {
    fc_byte(format, raw_frame_data, 2)
}

/// Check a Flow Control frame against ISO 15765-2
pub fn validate_frame_data(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<()> {
    encode_dlc(raw_frame_data.len())?;
    if !is_flow_control(format, raw_frame_data) {
        return Err(CanError::invalid_value("frame is not a Flow Control"));
    }
    let used = format.ai_data_bytes_number() + FC_BYTES;
    if raw_frame_data.len() < used {
        return Err(CanError::invalid_value(format!(
            "Flow Control needs {} bytes, got {}",
            used,
            raw_frame_data.len()
        )));
    }
    extract_flow_status(format, raw_frame_data)?;
    if raw_frame_data.len() < usize::from(MIN_BASE_UDS_DLC) && raw_frame_data.len() != used {
        return Err(CanError::inconsistency(format!(
            "Flow Control with {} bytes must not be padded",
            raw_frame_data.len()
        )));
    }
    Ok(())
}
