//! CAN identifier handling
//!
//! Range checks for 11-bit and 29-bit identifiers and the fixed 29-bit
//! layout used by Normal Fixed and Mixed 29-bit addressing:
//!
//! ```text
//!  28   26 25 24 23        16 15         8 7          0
//! +-------+-----+------------+------------+------------+
//! | prio  | R DP|  PF (N_TA  |  target    |  source    |
//! |       |     |   type)    |  address   |  address   |
//! +-------+-----+------------+------------+------------+
//! ```

use crate::addressing::{AddressingFormat, AddressingType};
use crate::error::{CanError, CanResult};

/// Highest standard (11-bit) CAN identifier
pub const MAX_STANDARD_CAN_ID: u32 = 0x7FF;

/// Highest extended (29-bit) CAN identifier
pub const MAX_EXTENDED_CAN_ID: u32 = 0x1FFF_FFFF;

/// Priority used when composing fixed-format identifiers
pub const DEFAULT_CAN_ID_PRIORITY: u8 = 0b110;

/// Bits that carry the R/DP bits and the N_TAtype discriminator
const FIXED_ADDRESSING_MASK: u32 = 0x3FF_0000;
const PRIORITY_SHIFT: u32 = 26;
const MAX_PRIORITY: u8 = 0b111;

const NORMAL_FIXED_PHYSICAL: u32 = 0xDA;
const NORMAL_FIXED_FUNCTIONAL: u32 = 0xDB;
const MIXED_29BIT_PHYSICAL: u32 = 0xCE;
const MIXED_29BIT_FUNCTIONAL: u32 = 0xCD;

/// Fields packed into a Normal Fixed or Mixed 29-bit CAN identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCanIdFields {
    pub priority: u8,
    pub addressing_type: AddressingType,
    pub target_address: u8,
    pub source_address: u8,
}

pub fn is_standard_can_id(can_id: u32) -> bool {
    can_id <= MAX_STANDARD_CAN_ID
}

pub fn is_extended_can_id(can_id: u32) -> bool {
    can_id <= MAX_EXTENDED_CAN_ID
}

pub fn is_can_id(can_id: u32) -> bool {
    is_extended_can_id(can_id)
}

/// Check that `can_id` fits into a CAN identifier field
pub fn validate_can_id(can_id: u32) -> CanResult<()> {
    if is_can_id(can_id) {
        Ok(())
    } else {
        Err(CanError::invalid_value(format!(
            "CAN ID 0x{:X} exceeds 29 bits",
            can_id
        )))
    }
}

fn type_discriminators(format: AddressingFormat) -> CanResult<(u32, u32)> {
    match format {
        AddressingFormat::NormalFixed => Ok((NORMAL_FIXED_PHYSICAL, NORMAL_FIXED_FUNCTIONAL)),
        AddressingFormat::Mixed29Bit => Ok((MIXED_29BIT_PHYSICAL, MIXED_29BIT_FUNCTIONAL)),
        other => Err(CanError::invalid_value(format!(
            "{} addressing has no fixed CAN ID layout",
            other
        ))),
    }
}

/// Compose a 29-bit identifier for Normal Fixed or Mixed 29-bit addressing
pub fn encode_fixed_can_id(
    format: AddressingFormat,
    addressing_type: AddressingType,
    target_address: u8,
    source_address: u8,
    priority: u8,
) -> CanResult<u32> {
    let (physical, functional) = type_discriminators(format)?;
    if priority > MAX_PRIORITY {
        return Err(CanError::invalid_value(format!(
            "CAN ID priority {} exceeds 3 bits",
            priority
        )));
    }
    let discriminator = match addressing_type {
        AddressingType::Physical => physical,
        AddressingType::Functional => functional,
    };
    Ok((u32::from(priority) << PRIORITY_SHIFT)
        | (discriminator << 16)
        | (u32::from(target_address) << 8)
        | u32::from(source_address))
}

/// Split a Normal Fixed or Mixed 29-bit identifier into its fields
pub fn decode_fixed_can_id(format: AddressingFormat, can_id: u32) -> CanResult<FixedCanIdFields> {
    let (physical, functional) = type_discriminators(format)?;
    validate_can_id(can_id)?;
    let discriminator = (can_id & FIXED_ADDRESSING_MASK) >> 16;
    let addressing_type = if discriminator == physical {
        AddressingType::Physical
    } else if discriminator == functional {
        AddressingType::Functional
    } else {
        return Err(CanError::invalid_value(format!(
            "CAN ID 0x{:X} is not a {} identifier",
            can_id, format
        )));
    };
    Ok(FixedCanIdFields {
        priority: (can_id >> PRIORITY_SHIFT) as u8,
        addressing_type,
        target_address: (can_id >> 8) as u8,
        source_address: can_id as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_id_ranges() {
        assert!(is_standard_can_id(0x7FF));
        assert!(!is_standard_can_id(0x800));
        assert!(is_extended_can_id(0x1FFF_FFFF));
        assert!(!is_can_id(0x2000_0000));
        assert!(validate_can_id(0x2000_0000).is_err());
    }

    #[test]
    fn test_encode_normal_fixed() {
        let id = encode_fixed_can_id(
            AddressingFormat::NormalFixed,
            AddressingType::Physical,
            0x02,
            0x3B,
            DEFAULT_CAN_ID_PRIORITY,
        )
        .unwrap();
        assert_eq!(id, 0x18DA_023B);

        let id = encode_fixed_can_id(
            AddressingFormat::NormalFixed,
            AddressingType::Functional,
            0x33,
            0xF1,
            DEFAULT_CAN_ID_PRIORITY,
        )
        .unwrap();
        assert_eq!(id, 0x18DB_33F1);
    }

    #[test]
    fn test_encode_mixed_29bit() {
        let id = encode_fixed_can_id(
            AddressingFormat::Mixed29Bit,
            AddressingType::Physical,
            0xE9,
            0xB7,
            DEFAULT_CAN_ID_PRIORITY,
        )
        .unwrap();
        assert_eq!(id, 0x18CE_E9B7);
    }

    #[test]
    fn test_decode_fixed_can_id() {
        let fields = decode_fixed_can_id(AddressingFormat::Mixed29Bit, 0x14CD_1234).unwrap();
        assert_eq!(fields.priority, 0b101);
        assert_eq!(fields.addressing_type, AddressingType::Functional);
        assert_eq!(fields.target_address, 0x12);
        assert_eq!(fields.source_address, 0x34);
    }

    #[test]
    fn test_decode_rejects_foreign_layout() {
        assert!(decode_fixed_can_id(AddressingFormat::NormalFixed, 0x18CE_E9B7).is_err());
        assert!(decode_fixed_can_id(AddressingFormat::Normal, 0x18DA_0102).is_err());
        // R/DP bits are part of the mask
        assert!(decode_fixed_can_id(AddressingFormat::NormalFixed, 0x19DA_0102).is_err());
    }

    #[test]
    fn test_priority_out_of_range() {
        assert!(encode_fixed_can_id(
            AddressingFormat::NormalFixed,
            AddressingType::Physical,
            1,
            2,
            8
        )
        .is_err());
    }
}
