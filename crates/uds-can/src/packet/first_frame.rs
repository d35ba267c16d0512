//! First Frame (FF) codec
//!
//! ```text
//! FF_DL <= 0xFFF:  [AI] 0x1H  0xLL  payload...             12-bit FF_DL
//! FF_DL  > 0xFFF:  [AI] 0x10  0x00  FF_DL (4 bytes BE)  payload...
//! ```

use super::{ai_prefix, n_pci_of, pad_to_dlc, single_frame, CanPacketType};
use crate::addressing::AddressingFormat;
use crate::dlc::{decode_dlc, encode_dlc, MIN_BASE_UDS_DLC};
use crate::error::{CanError, CanResult};

/// Largest FF_DL expressible in the 12-bit short form
pub const MAX_SHORT_FF_DL: u32 = 0xFFF;

/// Largest FF_DL expressible in the 32-bit long form
pub const MAX_LONG_FF_DL: u32 = u32::MAX;

const SHORT_FF_DL_BYTES: usize = 2;
const LONG_FF_DL_BYTES: usize = 6;

fn header_bytes(long_ff_dl_format: bool) -> usize {
    if long_ff_dl_format {
        LONG_FF_DL_BYTES
    } else {
        SHORT_FF_DL_BYTES
    }
}

/// Whether the N_PCI nibble marks a First Frame
pub fn is_first_frame(format: AddressingFormat, raw_frame_data: &[u8]) -> bool {
    n_pci_of(format, raw_frame_data) == Some(CanPacketType::FirstFrame as u8)
}

/// Payload bytes a First Frame carries for the given DLC and FF_DL form
pub fn get_payload_size(
    format: AddressingFormat,
    dlc: u8,
    long_ff_dl_format: bool,
) -> CanResult<usize> {
    let data_bytes = decode_dlc(dlc)?;
    if dlc < MIN_BASE_UDS_DLC {
        return Err(CanError::inconsistency(format!(
            "First Frame requires DLC >= {}, got {}",
            MIN_BASE_UDS_DLC, dlc
        )));
    }
    Ok(data_bytes - format.ai_data_bytes_number() - header_bytes(long_ff_dl_format))
}

/// Payload capacity of a short-form First Frame
pub fn get_max_payload_size(format: AddressingFormat, dlc: u8) -> CanResult<usize> {
    get_payload_size(format, dlc, false)
}

/// Check FF_DL against the frame it travels in
pub fn validate_ff_dl(
    format: AddressingFormat,
    dlc: u8,
    ff_dl: u32,
    long_ff_dl_format: bool,
) -> CanResult<()> {
    if long_ff_dl_format && ff_dl <= MAX_SHORT_FF_DL {
        return Err(CanError::inconsistency(format!(
            "FF_DL {} must use the short form",
            ff_dl
        )));
    }
    if !long_ff_dl_format && ff_dl > MAX_SHORT_FF_DL {
        return Err(CanError::invalid_value(format!(
            "FF_DL {} does not fit the 12-bit short form",
            ff_dl
        )));
    }
    let max_sf_dl = single_frame::get_max_payload_size(format, dlc)?;
    if ff_dl as usize <= max_sf_dl {
        return Err(CanError::inconsistency(format!(
            "FF_DL {} fits into a Single Frame with DLC {}",
            ff_dl, dlc
        )));
    }
    Ok(())
}

fn push_ff_dl(frame: &mut Vec<u8>, ff_dl: u32, long_ff_dl_format: bool) {
    if long_ff_dl_format {
        frame.extend_from_slice(&[0x10, 0x00]);
        frame.extend_from_slice(&ff_dl.to_be_bytes());
    } else {
        frame.push(0x10 | ((ff_dl >> 8) as u8 & 0x0F));
        frame.push(ff_dl as u8);
    }
}

/// Build a compliant First Frame.
///
/// The long FF_DL form is used exactly when FF_DL exceeds 0xFFF. The
/// payload must fill the frame.
pub fn create_data(
    format: AddressingFormat,
    ai_byte: Option<u8>,
    payload: &[u8],
    dlc: u8,
    ff_dl: u32,
) -> CanResult<Vec<u8>> {
    let mut frame = ai_prefix(format, ai_byte)?;
    let long_ff_dl_format = ff_dl > MAX_SHORT_FF_DL;
    let payload_size = get_payload_size(format, dlc, long_ff_dl_format)?;
    validate_ff_dl(format, dlc, ff_dl, long_ff_dl_format)?;
    if payload.len() != payload_size {
        return Err(CanError::inconsistency(format!(
            "First Frame with DLC {} carries exactly {} payload bytes, got {}",
            dlc,
            payload_size,
            payload.len()
        )));
    }
    push_ff_dl(&mut frame, ff_dl, long_ff_dl_format);
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Build First Frame bytes without consistency checks
pub fn generate_data(
    format: AddressingFormat,
    ai_byte: Option<u8>,
    payload: &[u8],
    dlc: u8,
    ff_dl: u32,
    long_ff_dl_format: bool,
    filler_byte: u8,
) -> CanResult<Vec<u8>> {
    if !long_ff_dl_format && ff_dl > MAX_SHORT_FF_DL {
        return Err(CanError::invalid_value(format!(
            "FF_DL {} does not fit the 12-bit short form",
            ff_dl
        )));
    }
    let mut frame = ai_prefix(format, ai_byte)?;
    push_ff_dl(&mut frame, ff_dl, long_ff_dl_format);
    frame.extend_from_slice(payload);
    pad_to_dlc(&mut frame, dlc, filler_byte)?;
    Ok(frame)
}

/// Read FF_DL and whether the long form was used
fn decode_ff_dl(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<(u32, bool)> {
    let ai = format.ai_data_bytes_number();
    let header = raw_frame_data
        .get(ai..ai + SHORT_FF_DL_BYTES)
        .ok_or_else(|| CanError::invalid_value("frame too short for a First Frame"))?;
    let short = (u32::from(header[0] & 0x0F) << 8) | u32::from(header[1]);
    if short != 0 {
        return Ok((short, false));
    }
    let long: [u8; 4] = raw_frame_data
        .get(ai + SHORT_FF_DL_BYTES..ai + LONG_FF_DL_BYTES)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| CanError::invalid_value("frame too short for a long FF_DL"))?;
    Ok((u32::from_be_bytes(long), true))
}

/// First Frame Data Length (total message length)
pub fn extract_ff_dl(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<u32> {
    decode_ff_dl(format, raw_frame_data).map(|(ff_dl, _)| ff_dl)
}

/// Payload bytes carried after the FF_DL header
pub fn extract_payload(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<&[u8]> {
    let (_, long_ff_dl_format) = decode_ff_dl(format, raw_frame_data)?;
    let start = format.ai_data_bytes_number() + header_bytes(long_ff_dl_format);
    Ok(&raw_frame_data[start..])
}

/// Check a First Frame against ISO 15765-2
pub fn validate_frame_data(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<()> {
    let dlc = encode_dlc(raw_frame_data.len())?;
    if !is_first_frame(format, raw_frame_data) {
        return Err(CanError::invalid_value("frame is not a First Frame"));
    }
    if dlc < MIN_BASE_UDS_DLC {
        return Err(CanError::inconsistency(format!(
            "First Frame requires DLC >= {}, got {}",
            MIN_BASE_UDS_DLC, dlc
        )));
    }
    let (ff_dl, long_ff_dl_format) = decode_ff_dl(format, raw_frame_data)?;
    validate_ff_dl(format, dlc, ff_dl, long_ff_dl_format)
}
