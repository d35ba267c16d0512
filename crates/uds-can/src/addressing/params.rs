//! Addressing parameters: validation, AI byte encoding and frame decoding

use serde::{Deserialize, Serialize};

use super::{AddressingFormat, AddressingType};
use crate::can_id::{
    decode_fixed_can_id, encode_fixed_can_id, is_standard_can_id, validate_can_id,
    DEFAULT_CAN_ID_PRIORITY,
};
use crate::error::{CanError, CanResult};

/// Addressing parameters as supplied by a caller.
///
/// Every field is optional; which ones are required, derivable or
/// forbidden depends on the addressing format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_address: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_address: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_extension: Option<u8>,
}

impl AiParams {
    /// Normal addressing: only the CAN ID
    pub fn normal(can_id: u32) -> Self {
        Self {
            can_id: Some(can_id),
            ..Self::default()
        }
    }

    /// Normal fixed addressing: CAN ID derived from target and source address
    pub fn normal_fixed(target_address: u8, source_address: u8) -> Self {
        Self {
            target_address: Some(target_address),
            source_address: Some(source_address),
            ..Self::default()
        }
    }

    /// Extended addressing: CAN ID plus target address byte
    pub fn extended(can_id: u32, target_address: u8) -> Self {
        Self {
            can_id: Some(can_id),
            target_address: Some(target_address),
            ..Self::default()
        }
    }

    /// Mixed 11-bit addressing: standard CAN ID plus address extension byte
    pub fn mixed_11bit(can_id: u32, address_extension: u8) -> Self {
        Self {
            can_id: Some(can_id),
            address_extension: Some(address_extension),
            ..Self::default()
        }
    }

    /// Mixed 29-bit addressing: fixed CAN ID plus address extension byte
    pub fn mixed_29bit(target_address: u8, source_address: u8, address_extension: u8) -> Self {
        Self {
            target_address: Some(target_address),
            source_address: Some(source_address),
            address_extension: Some(address_extension),
            ..Self::default()
        }
    }
}

impl From<&AddressingParams> for AiParams {
    fn from(params: &AddressingParams) -> Self {
        Self {
            can_id: Some(params.can_id),
            target_address: params.target_address,
            source_address: params.source_address,
            address_extension: params.address_extension,
        }
    }
}

/// Validated addressing parameters of a packet.
///
/// Fields the addressing format does not use are always `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressingParams {
    pub addressing_type: AddressingType,
    pub can_id: u32,
    pub target_address: Option<u8>,
    pub source_address: Option<u8>,
    pub address_extension: Option<u8>,
}

/// Addressing information read back from a frame.
///
/// `addressing_type` is only known for formats whose CAN ID encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAiParams {
    pub addressing_type: Option<AddressingType>,
    pub can_id: u32,
    pub target_address: Option<u8>,
    pub source_address: Option<u8>,
    pub address_extension: Option<u8>,
}

impl DecodedAiParams {
    /// Attach an externally known addressing type.
    ///
    /// Fails when the frame itself encodes a different addressing type.
    pub fn with_addressing_type(
        self,
        addressing_type: AddressingType,
    ) -> CanResult<AddressingParams> {
        if let Some(decoded) = self.addressing_type {
            if decoded != addressing_type {
                return Err(CanError::inconsistency(format!(
                    "CAN ID 0x{:X} encodes {} addressing, not {}",
                    self.can_id, decoded, addressing_type
                )));
            }
        }
        Ok(AddressingParams {
            addressing_type,
            can_id: self.can_id,
            target_address: self.target_address,
            source_address: self.source_address,
            address_extension: self.address_extension,
        })
    }
}

/// Number of AI bytes at the start of the frame payload (0 or 1)
pub fn get_ai_data_bytes_number(format: AddressingFormat) -> usize {
    format.ai_data_bytes_number()
}

fn forbid(format: AddressingFormat, name: &str, value: Option<u8>) -> CanResult<()> {
    match value {
        Some(_) => Err(CanError::invalid_value(format!(
            "{} is not used by {} addressing",
            name, format
        ))),
        None => Ok(()),
    }
}

fn require<T>(format: AddressingFormat, name: &str, value: Option<T>) -> CanResult<T> {
    value.ok_or_else(|| {
        CanError::invalid_value(format!("{} addressing requires {}", format, name))
    })
}

/// Encode the AI data bytes that precede the N_PCI
pub fn encode_ai_data_bytes(
    format: AddressingFormat,
    target_address: Option<u8>,
    address_extension: Option<u8>,
) -> CanResult<Vec<u8>> {
    match format {
        AddressingFormat::Normal => {
            forbid(format, "target address", target_address)?;
            forbid(format, "address extension", address_extension)?;
            Ok(Vec::new())
        }
        // The target address lives in the CAN ID
        AddressingFormat::NormalFixed => {
            forbid(format, "address extension", address_extension)?;
            Ok(Vec::new())
        }
        AddressingFormat::Extended => {
            forbid(format, "address extension", address_extension)?;
            Ok(vec![require(format, "target address", target_address)?])
        }
        AddressingFormat::Mixed11Bit => {
            forbid(format, "target address", target_address)?;
            Ok(vec![require(format, "address extension", address_extension)?])
        }
        AddressingFormat::Mixed29Bit => {
            Ok(vec![require(format, "address extension", address_extension)?])
        }
    }
}

/// The AI byte a packet with these parameters carries, if any
pub(crate) fn frame_ai_byte(format: AddressingFormat, params: &AddressingParams) -> Option<u8> {
    match format {
        AddressingFormat::Normal | AddressingFormat::NormalFixed => None,
        AddressingFormat::Extended => params.target_address,
        AddressingFormat::Mixed11Bit | AddressingFormat::Mixed29Bit => params.address_extension,
    }
}

/// Extract addressing information from a CAN ID and frame data.
///
/// Pure bit and byte extraction; no cross-field validation.
pub fn decode_frame_ai_params(
    format: AddressingFormat,
    can_id: u32,
    raw_frame_data: &[u8],
) -> CanResult<DecodedAiParams> {
    validate_can_id(can_id)?;
    let first_byte = || {
        raw_frame_data.first().copied().ok_or_else(|| {
            CanError::invalid_value(format!(
                "{} addressing needs an AI byte but the frame is empty",
                format
            ))
        })
    };
    let mut decoded = DecodedAiParams {
        addressing_type: None,
        can_id,
        target_address: None,
        source_address: None,
        address_extension: None,
    };
    match format {
        AddressingFormat::Normal => {}
        AddressingFormat::NormalFixed => {
            let fields = decode_fixed_can_id(format, can_id)?;
            decoded.addressing_type = Some(fields.addressing_type);
            decoded.target_address = Some(fields.target_address);
            decoded.source_address = Some(fields.source_address);
        }
        AddressingFormat::Extended => {
            decoded.target_address = Some(first_byte()?);
        }
        AddressingFormat::Mixed11Bit => {
            decoded.address_extension = Some(first_byte()?);
        }
        AddressingFormat::Mixed29Bit => {
            let fields = decode_fixed_can_id(format, can_id)?;
            decoded.addressing_type = Some(fields.addressing_type);
            decoded.target_address = Some(fields.target_address);
            decoded.source_address = Some(fields.source_address);
            decoded.address_extension = Some(first_byte()?);
        }
    }
    Ok(decoded)
}

/// Resolve CAN ID, target and source address for the fixed 29-bit layouts
fn resolve_fixed_can_id(
    format: AddressingFormat,
    addressing_type: AddressingType,
    ai: &AiParams,
) -> CanResult<(u32, u8, u8)> {
    let Some(can_id) = ai.can_id else {
        let target_address = require(format, "target address or CAN ID", ai.target_address)?;
        let source_address = require(format, "source address or CAN ID", ai.source_address)?;
        let can_id = encode_fixed_can_id(
            format,
            addressing_type,
            target_address,
            source_address,
            DEFAULT_CAN_ID_PRIORITY,
        )?;
        return Ok((can_id, target_address, source_address));
    };

    let fields = decode_fixed_can_id(format, can_id)?;
    if fields.addressing_type != addressing_type {
        return Err(CanError::inconsistency(format!(
            "CAN ID 0x{:X} is {} but {} addressing was requested",
            can_id, fields.addressing_type, addressing_type
        )));
    }
    if let Some(ta) = ai.target_address.filter(|&ta| ta != fields.target_address) {
        return Err(CanError::inconsistency(format!(
            "target address 0x{:02X} does not match CAN ID 0x{:X}",
            ta, can_id
        )));
    }
    if let Some(sa) = ai.source_address.filter(|&sa| sa != fields.source_address) {
        return Err(CanError::inconsistency(format!(
            "source address 0x{:02X} does not match CAN ID 0x{:X}",
            sa, can_id
        )));
    }
    Ok((can_id, fields.target_address, fields.source_address))
}

/// Validate and normalize addressing parameters for a format.
///
/// Derivable fields are filled in (Normal Fixed and Mixed 29-bit CAN IDs
/// from target/source address and back). Extended and Mixed 11-bit
/// addressing require the CAN ID to be given explicitly.
pub fn validate_addressing_params(
    format: AddressingFormat,
    addressing_type: AddressingType,
    ai: &AiParams,
) -> CanResult<AddressingParams> {
    let mut params = AddressingParams {
        addressing_type,
        can_id: 0,
        target_address: None,
        source_address: None,
        address_extension: None,
    };
    match format {
        AddressingFormat::Normal => {
            forbid(format, "target address", ai.target_address)?;
            forbid(format, "source address", ai.source_address)?;
            forbid(format, "address extension", ai.address_extension)?;
            params.can_id = require(format, "CAN ID", ai.can_id)?;
            validate_can_id(params.can_id)?;
        }
        AddressingFormat::NormalFixed => {
            forbid(format, "address extension", ai.address_extension)?;
            let (can_id, ta, sa) = resolve_fixed_can_id(format, addressing_type, ai)?;
            params.can_id = can_id;
            params.target_address = Some(ta);
            params.source_address = Some(sa);
        }
        AddressingFormat::Extended => {
            forbid(format, "source address", ai.source_address)?;
            forbid(format, "address extension", ai.address_extension)?;
            params.can_id = require(format, "CAN ID", ai.can_id)?;
            validate_can_id(params.can_id)?;
            params.target_address = Some(require(format, "target address", ai.target_address)?);
        }
        AddressingFormat::Mixed11Bit => {
            forbid(format, "target address", ai.target_address)?;
            forbid(format, "source address", ai.source_address)?;
            params.can_id = require(format, "CAN ID", ai.can_id)?;
            if !is_standard_can_id(params.can_id) {
                return Err(CanError::invalid_value(format!(
                    "{} addressing needs an 11-bit CAN ID, got 0x{:X}",
                    format, params.can_id
                )));
            }
            params.address_extension =
                Some(require(format, "address extension", ai.address_extension)?);
        }
        AddressingFormat::Mixed29Bit => {
            let (can_id, ta, sa) = resolve_fixed_can_id(format, addressing_type, ai)?;
            params.can_id = can_id;
            params.target_address = Some(ta);
            params.source_address = Some(sa);
            params.address_extension =
                Some(require(format, "address extension", ai.address_extension)?);
        }
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normal_fixed_derives_can_id() {
        let params = validate_addressing_params(
            AddressingFormat::NormalFixed,
            AddressingType::Physical,
            &AiParams::normal_fixed(0x02, 0x3B),
        )
        .unwrap();
        assert_eq!(params.can_id, 0x18DA_023B);
        assert_eq!(params.target_address, Some(0x02));
        assert_eq!(params.source_address, Some(0x3B));
        assert_eq!(params.address_extension, None);
    }

    #[test]
    fn test_normal_fixed_derives_addresses_from_can_id() {
        let ai = AiParams {
            can_id: Some(0x18DB_33F1),
            ..AiParams::default()
        };
        let params = validate_addressing_params(
            AddressingFormat::NormalFixed,
            AddressingType::Functional,
            &ai,
        )
        .unwrap();
        assert_eq!(params.target_address, Some(0x33));
        assert_eq!(params.source_address, Some(0xF1));
    }

    #[test]
    fn test_fixed_can_id_contradictions() {
        let ai = AiParams {
            can_id: Some(0x18DA_023B),
            target_address: Some(0x03),
            ..AiParams::default()
        };
        assert!(matches!(
            validate_addressing_params(
                AddressingFormat::NormalFixed,
                AddressingType::Physical,
                &ai
            ),
            Err(CanError::ProtocolInconsistency(_))
        ));
        let ai = AiParams {
            can_id: Some(0x18DA_023B),
            ..AiParams::default()
        };
        assert!(matches!(
            validate_addressing_params(
                AddressingFormat::NormalFixed,
                AddressingType::Functional,
                &ai
            ),
            Err(CanError::ProtocolInconsistency(_))
        ));
    }

    #[test]
    fn test_missing_and_forbidden_fields() {
        assert!(matches!(
            validate_addressing_params(
                AddressingFormat::Extended,
                AddressingType::Physical,
                &AiParams::normal(0x7E0)
            ),
            Err(CanError::InvalidValue(_))
        ));
        assert!(matches!(
            validate_addressing_params(
                AddressingFormat::Normal,
                AddressingType::Physical,
                &AiParams::extended(0x7E0, 0x10)
            ),
            Err(CanError::InvalidValue(_))
        ));
        assert!(matches!(
            validate_addressing_params(
                AddressingFormat::Mixed11Bit,
                AddressingType::Physical,
                &AiParams::mixed_11bit(0x18DA_0000, 0x10)
            ),
            Err(CanError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_encode_ai_data_bytes() {
        assert_eq!(
            encode_ai_data_bytes(AddressingFormat::Normal, None, None).unwrap(),
            Vec::<u8>::new()
        );
        assert_eq!(
            encode_ai_data_bytes(AddressingFormat::Extended, Some(0x4B), None).unwrap(),
            vec![0x4B]
        );
        assert_eq!(
            encode_ai_data_bytes(AddressingFormat::Mixed29Bit, Some(0xE9), Some(0xDB)).unwrap(),
            vec![0xDB]
        );
        assert!(encode_ai_data_bytes(AddressingFormat::Extended, None, None).is_err());
        assert!(encode_ai_data_bytes(AddressingFormat::Mixed11Bit, Some(1), Some(2)).is_err());
        assert!(encode_ai_data_bytes(AddressingFormat::NormalFixed, None, Some(2)).is_err());
    }

    #[test]
    fn test_decode_round_trip_all_formats() {
        let cases = [
            (AddressingFormat::Normal, AiParams::normal(0x7E0)),
            (AddressingFormat::NormalFixed, AiParams::normal_fixed(0x12, 0xF1)),
            (AddressingFormat::Extended, AiParams::extended(0x6F1, 0x40)),
            (AddressingFormat::Mixed11Bit, AiParams::mixed_11bit(0x6A5, 0x87)),
            (AddressingFormat::Mixed29Bit, AiParams::mixed_29bit(0xE9, 0xB7, 0xDB)),
        ];
        for (format, ai) in cases {
            for addressing_type in [AddressingType::Physical, AddressingType::Functional] {
                let params = validate_addressing_params(format, addressing_type, &ai).unwrap();
                let mut frame = encode_ai_data_bytes(
                    format,
                    params.target_address,
                    params.address_extension,
                )
                .unwrap();
                frame.extend_from_slice(&[0x01, 0x3E]);
                let decoded = decode_frame_ai_params(format, params.can_id, &frame).unwrap();
                assert_eq!(decoded.with_addressing_type(addressing_type).unwrap(), params);
                if format.has_fixed_can_id() {
                    assert_eq!(decoded.addressing_type, Some(addressing_type));
                } else {
                    assert_eq!(decoded.addressing_type, None);
                }
            }
        }
    }

    #[test]
    fn test_decode_requires_ai_byte() {
        assert!(decode_frame_ai_params(AddressingFormat::Extended, 0x7E0, &[]).is_err());
        assert!(decode_frame_ai_params(AddressingFormat::Normal, 0x7E0, &[]).is_ok());
    }

    #[test]
    fn test_with_addressing_type_mismatch() {
        let decoded =
            decode_frame_ai_params(AddressingFormat::NormalFixed, 0x18DA_0102, &[0x01]).unwrap();
        assert!(matches!(
            decoded.with_addressing_type(AddressingType::Functional),
            Err(CanError::ProtocolInconsistency(_))
        ));
    }
}
