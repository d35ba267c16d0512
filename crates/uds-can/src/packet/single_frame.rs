//! Single Frame (SF) codec
//!
//! ```text
//! DLC <= 8:  [AI] 0x0L  payload...          L = SF_DL (low nibble)
//! DLC  > 8:  [AI] 0x00  SF_DL  payload...   escape sequence, SF_DL in full byte
//! ```

use super::{ai_prefix, n_pci_of, pad_to_dlc, CanPacketType};
use crate::addressing::AddressingFormat;
use crate::dlc::{
    decode_dlc, encode_dlc, get_min_dlc as min_dlc_for, resolve_frame_dlc, MIN_BASE_UDS_DLC,
};
use crate::error::{CanError, CanResult};

const SHORT_SF_DL_BYTES: usize = 1;
const LONG_SF_DL_BYTES: usize = 2;
const MAX_SHORT_SF_DL_NIBBLE: u8 = 0xF;

fn sf_dl_bytes(dlc: u8) -> usize {
    if dlc <= MIN_BASE_UDS_DLC {
        SHORT_SF_DL_BYTES
    } else {
        LONG_SF_DL_BYTES
    }
}

/// Whether the N_PCI nibble marks a Single Frame
pub fn is_single_frame(format: AddressingFormat, raw_frame_data: &[u8]) -> bool {
    n_pci_of(format, raw_frame_data) == Some(CanPacketType::SingleFrame as u8)
}

/// Largest SF_DL a frame with this DLC can carry
pub fn get_max_payload_size(format: AddressingFormat, dlc: u8) -> CanResult<usize> {
    let data_bytes = decode_dlc(dlc)?;
    Ok(data_bytes.saturating_sub(format.ai_data_bytes_number() + sf_dl_bytes(dlc)))
}

/// Smallest DLC that carries `payload_length` bytes without padding
pub fn get_min_dlc(format: AddressingFormat, payload_length: usize) -> CanResult<u8> {
    if payload_length == 0 {
        return Err(CanError::invalid_value("Single Frame payload cannot be empty"));
    }
    let ai = format.ai_data_bytes_number();
    let short_frame = ai + SHORT_SF_DL_BYTES + payload_length;
    if short_frame <= usize::from(MIN_BASE_UDS_DLC) {
        return min_dlc_for(short_frame);
    }
    min_dlc_for(ai + LONG_SF_DL_BYTES + payload_length).map_err(|_| {
        CanError::invalid_value(format!(
            "{} bytes do not fit into a Single Frame",
            payload_length
        ))
    })
}

/// Build a compliant Single Frame.
///
/// Without `dlc` the smallest DLC is used and no padding is added.
pub fn create_data(
    format: AddressingFormat,
    ai_byte: Option<u8>,
    payload: &[u8],
    dlc: Option<u8>,
    filler_byte: u8,
) -> CanResult<Vec<u8>> {
    let mut frame = ai_prefix(format, ai_byte)?;
    let dlc = resolve_frame_dlc(get_min_dlc(format, payload.len())?, dlc)?;
    let sf_dl = payload.len() as u8;
    if sf_dl_bytes(dlc) == SHORT_SF_DL_BYTES {
        frame.push(sf_dl);
    } else {
        frame.extend_from_slice(&[0x00, sf_dl]);
    }
    frame.extend_from_slice(payload);
    pad_to_dlc(&mut frame, dlc, filler_byte)?;
    Ok(frame)
}

/// Build Single Frame bytes without consistency checks.
///
/// `sf_dl_short` fills the low N_PCI nibble; `sf_dl_long` adds the escape
/// byte when given.
pub fn generate_data(
    format: AddressingFormat,
    ai_byte: Option<u8>,
    payload: &[u8],
    dlc: u8,
    sf_dl_short: u8,
    sf_dl_long: Option<u8>,
    filler_byte: u8,
) -> CanResult<Vec<u8>> {
    if sf_dl_short > MAX_SHORT_SF_DL_NIBBLE {
        return Err(CanError::invalid_value(format!(
            "SF_DL nibble 0x{:X} exceeds 4 bits",
            sf_dl_short
        )));
    }
    let mut frame = ai_prefix(format, ai_byte)?;
    frame.push(sf_dl_short);
    frame.extend(sf_dl_long);
    frame.extend_from_slice(payload);
    pad_to_dlc(&mut frame, dlc, filler_byte)?;
    Ok(frame)
}

/// Read SF_DL and the number of header bytes that precede the payload
fn decode_sf_dl(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<(usize, usize)> {
    let ai = format.ai_data_bytes_number();
    let pci = *raw_frame_data
        .get(ai)
        .ok_or_else(|| CanError::invalid_value("frame too short for a Single Frame"))?;
    if raw_frame_data.len() <= usize::from(MIN_BASE_UDS_DLC) {
        return Ok((usize::from(pci & 0x0F), SHORT_SF_DL_BYTES));
    }
    if pci & 0x0F != 0 {
        return Err(CanError::invalid_value(
            "SF_DL nibble must be 0 when the frame is longer than 8 bytes",
        ));
    }
    let sf_dl = raw_frame_data
        .get(ai + 1)
        .ok_or_else(|| CanError::invalid_value("frame too short for SF_DL escape byte"))?;
    Ok((usize::from(*sf_dl), LONG_SF_DL_BYTES))
}

/// Single Frame Data Length
pub fn extract_sf_dl(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<usize> {
    decode_sf_dl(format, raw_frame_data).map(|(sf_dl, _)| sf_dl)
}

/// Payload bytes, without padding
pub fn extract_payload(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<&[u8]> {
    let (sf_dl, header) = decode_sf_dl(format, raw_frame_data)?;
    let start = format.ai_data_bytes_number() + header;
    raw_frame_data.get(start..start + sf_dl).ok_or_else(|| {
        CanError::invalid_value(format!(
            "SF_DL {} exceeds the {} bytes of the frame",
            sf_dl,
            raw_frame_data.len()
        ))
    })
}

/// Check a Single Frame against ISO 15765-2
pub fn validate_frame_data(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<()> {
    let dlc = encode_dlc(raw_frame_data.len())?;
    if !is_single_frame(format, raw_frame_data) {
        return Err(CanError::invalid_value("frame is not a Single Frame"));
    }
    let (sf_dl, header) = decode_sf_dl(format, raw_frame_data)?;
    if sf_dl == 0 {
        return Err(CanError::invalid_value("SF_DL must be at least 1"));
    }
    let max_sf_dl = get_max_payload_size(format, dlc)?;
    if sf_dl > max_sf_dl {
        return Err(CanError::inconsistency(format!(
            "SF_DL {} exceeds the {} bytes available with DLC {}",
            sf_dl, max_sf_dl, dlc
        )));
    }
    let used = format.ai_data_bytes_number() + header + sf_dl;
    if dlc < MIN_BASE_UDS_DLC && raw_frame_data.len() != used {
        return Err(CanError::inconsistency(format!(
            "Single Frame with DLC {} must not be padded",
            dlc
        )));
    }
    Ok(())
}
