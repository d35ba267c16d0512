//! Consecutive Frame (CF) codec
//!
//! ```text
//! [AI] 0x2N  payload...     N = sequence number (0-15, wraps)
//! ```

use super::{ai_prefix, n_pci_of, pad_to_dlc, CanPacketType};
use crate::addressing::AddressingFormat;
use crate::dlc::{decode_dlc, encode_dlc, get_min_dlc as min_dlc_for, resolve_frame_dlc};
use crate::error::{CanError, CanResult};

/// Largest value of the 4-bit sequence number
pub const MAX_SEQUENCE_NUMBER: u8 = 0xF;

const N_PCI_BYTES: usize = 1;

/// Whether the N_PCI nibble marks a Consecutive Frame
pub fn is_consecutive_frame(format: AddressingFormat, raw_frame_data: &[u8]) -> bool {
    n_pci_of(format, raw_frame_data) == Some(CanPacketType::ConsecutiveFrame as u8)
}

/// Payload capacity of a Consecutive Frame with this DLC
pub fn get_max_payload_size(format: AddressingFormat, dlc: u8) -> CanResult<usize> {
    let data_bytes = decode_dlc(dlc)?;
    Ok(data_bytes.saturating_sub(format.ai_data_bytes_number() + N_PCI_BYTES))
}

/// Smallest DLC that carries `payload_length` bytes
pub fn get_min_dlc(format: AddressingFormat, payload_length: usize) -> CanResult<u8> {
    if payload_length == 0 {
        return Err(CanError::invalid_value(
            "Consecutive Frame payload cannot be empty",
        ));
    }
    min_dlc_for(format.ai_data_bytes_number() + N_PCI_BYTES + payload_length)
}

fn check_sequence_number(sequence_number: u8) -> CanResult<()> {
    if sequence_number > MAX_SEQUENCE_NUMBER {
        return Err(CanError::invalid_value(format!(
            "sequence number {} exceeds {}",
            sequence_number, MAX_SEQUENCE_NUMBER
        )));
    }
    Ok(())
}

/// Build a compliant Consecutive Frame.
///
/// Without `dlc` the smallest DLC is used and no padding is added.
pub fn create_data(
    format: AddressingFormat,
    ai_byte: Option<u8>,
    payload: &[u8],
    sequence_number: u8,
    dlc: Option<u8>,
    filler_byte: u8,
) -> CanResult<Vec<u8>> {
    check_sequence_number(sequence_number)?;
    let mut frame = ai_prefix(format, ai_byte)?;
    let dlc = resolve_frame_dlc(get_min_dlc(format, payload.len())?, dlc)?;
    frame.push(((CanPacketType::ConsecutiveFrame as u8) << 4) | sequence_number);
    frame.extend_from_slice(payload);
    pad_to_dlc(&mut frame, dlc, filler_byte)?;
    Ok(frame)
}

/// Build Consecutive Frame bytes without consistency checks
pub fn generate_data(
    format: AddressingFormat,
    ai_byte: Option<u8>,
    payload: &[u8],
    sequence_number: u8,
    dlc: u8,
    filler_byte: u8,
) -> CanResult<Vec<u8>> {
    check_sequence_number(sequence_number)?;
    let mut frame = ai_prefix(format, ai_byte)?;
    frame.push(((CanPacketType::ConsecutiveFrame as u8) << 4) | sequence_number);
    frame.extend_from_slice(payload);
    pad_to_dlc(&mut frame, dlc, filler_byte)?;
    Ok(frame)
}

/// Sequence number from the low N_PCI nibble
pub fn extract_sequence_number(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<u8> {
    raw_frame_data
        .get(format.ai_data_bytes_number())
        .map(|pci| pci & 0x0F)
        .ok_or_else(|| CanError::invalid_value("frame too short for a Consecutive Frame"))
}

/// Every byte after the N_PCI, padding included
pub fn extract_payload(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<&[u8]> {
    raw_frame_data
        .get(format.ai_data_bytes_number() + N_PCI_BYTES..)
        .ok_or_else(|| CanError::invalid_value("frame too short for a Consecutive Frame"))
}

/// Check a Consecutive Frame against ISO 15765-2
pub fn validate_frame_data(format: AddressingFormat, raw_frame_data: &[u8]) -> CanResult<()> {
    encode_dlc(raw_frame_data.len())?;
    if !is_consecutive_frame(format, raw_frame_data) {
        return Err(CanError::invalid_value("frame is not a Consecutive Frame"));
    }
    if extract_payload(format, raw_frame_data)?.is_empty() {
        return Err(CanError::invalid_value(
            "Consecutive Frame carries no payload",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_optimized_and_padded() {
        let frame =
            create_data(AddressingFormat::Normal, None, &[0xAA, 0xBB], 5, None, 0xCC).unwrap();
        assert_eq!(frame, vec![0x25, 0xAA, 0xBB]);

        let frame =
            create_data(AddressingFormat::Mixed11Bit, Some(0x42), &[0xAA], 0xF, Some(8), 0x00)
                .unwrap();
        assert_eq!(frame, vec![0x42, 0x2F, 0xAA, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        assert!(matches!(
            create_data(AddressingFormat::Normal, None, &[0xAA], 16, None, 0xCC),
            Err(CanError::InvalidValue(_))
        ));
        assert!(create_data(AddressingFormat::Normal, None, &[], 1, None, 0xCC).is_err());
        assert!(matches!(
            create_data(AddressingFormat::Normal, None, &[0xAA], 1, Some(4), 0xCC),
            Err(CanError::ProtocolInconsistency(_))
        ));
        assert!(create_data(AddressingFormat::Normal, None, &[0; 64], 1, None, 0xCC).is_err());
    }

    #[test]
    fn test_extract_fields() {
        let frame = [0x21, 1, 2, 3, 4, 5, 6, 7];
        assert!(validate_frame_data(AddressingFormat::Normal, &frame).is_ok());
        assert_eq!(extract_sequence_number(AddressingFormat::Normal, &frame).unwrap(), 1);
        assert_eq!(
            extract_payload(AddressingFormat::Normal, &frame).unwrap(),
            &[1, 2, 3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn test_validate_rejects_empty_payload() {
        assert!(validate_frame_data(AddressingFormat::Normal, &[0x21]).is_err());
        assert!(validate_frame_data(AddressingFormat::Extended, &[0x01, 0x21]).is_err());
        assert!(validate_frame_data(AddressingFormat::Normal, &[0x11, 0x00]).is_err());
    }

    #[test]
    fn test_capacity_queries() {
        assert_eq!(get_max_payload_size(AddressingFormat::Normal, 8).unwrap(), 7);
        assert_eq!(get_max_payload_size(AddressingFormat::Extended, 15).unwrap(), 62);
        assert_eq!(get_min_dlc(AddressingFormat::Normal, 7).unwrap(), 8);
        assert_eq!(get_min_dlc(AddressingFormat::Normal, 8).unwrap(), 9);
    }
}
