//! Addressing configuration of a single CAN node
//!
//! A node receives packets on its rx addresses and transmits on its tx
//! addresses, each in a physical and a functional variant. For Extended
//! and Mixed 11-bit addressing this configuration is the only way to tell
//! the addressing type of an incoming frame.

use super::params::{frame_ai_byte, validate_addressing_params, AddressingParams, AiParams};
use super::{AddressingFormat, AddressingType};
use crate::config::NodeAddressingConfig;
use crate::error::{CanError, CanResult};

/// Validated rx/tx addressing parameters of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanAddressingInformation {
    addressing_format: AddressingFormat,
    rx_physical: AddressingParams,
    tx_physical: AddressingParams,
    rx_functional: AddressingParams,
    tx_functional: AddressingParams,
}

impl CanAddressingInformation {
    pub fn new(
        addressing_format: AddressingFormat,
        rx_physical: &AiParams,
        tx_physical: &AiParams,
        rx_functional: &AiParams,
        tx_functional: &AiParams,
    ) -> CanResult<Self> {
        let validate = |ai: &AiParams, addressing_type: AddressingType| {
            validate_addressing_params(addressing_format, addressing_type, ai)
        };
        let info = Self {
            addressing_format,
            rx_physical: validate(rx_physical, AddressingType::Physical)?,
            tx_physical: validate(tx_physical, AddressingType::Physical)?,
            rx_functional: validate(rx_functional, AddressingType::Functional)?,
            tx_functional: validate(tx_functional, AddressingType::Functional)?,
        };
        info.validate_consistency()?;
        Ok(info)
    }

    /// Build from a deserialized configuration section
    pub fn from_config(config: &NodeAddressingConfig) -> CanResult<Self> {
        Self::new(
            config.addressing_format,
            &config.rx_physical,
            &config.tx_physical,
            &config.rx_functional,
            &config.tx_functional,
        )
    }

    fn validate_consistency(&self) -> CanResult<()> {
        let format = self.addressing_format;
        let same_input = self.rx_physical.can_id == self.rx_functional.can_id
            && frame_ai_byte(format, &self.rx_physical)
                == frame_ai_byte(format, &self.rx_functional);
        if same_input {
            return Err(CanError::inconsistency(
                "rx physical and rx functional addressing cannot be told apart",
            ));
        }

        if format.has_fixed_can_id() {
            let rx = &self.rx_physical;
            let tx = &self.tx_physical;
            if rx.target_address != tx.source_address || rx.source_address != tx.target_address {
                return Err(CanError::inconsistency(format!(
                    "rx physical TA/SA {:02X?}/{:02X?} must mirror tx SA/TA {:02X?}/{:02X?}",
                    rx.target_address, rx.source_address, tx.source_address, tx.target_address
                )));
            }
        }
        Ok(())
    }

    pub fn addressing_format(&self) -> AddressingFormat {
        self.addressing_format
    }

    pub fn rx_physical(&self) -> &AddressingParams {
        &self.rx_physical
    }

    pub fn tx_physical(&self) -> &AddressingParams {
        &self.tx_physical
    }

    pub fn rx_functional(&self) -> &AddressingParams {
        &self.rx_functional
    }

    pub fn tx_functional(&self) -> &AddressingParams {
        &self.tx_functional
    }

    /// Transmit parameters for the given addressing type
    pub fn tx_params(&self, addressing_type: AddressingType) -> &AddressingParams {
        match addressing_type {
            AddressingType::Physical => &self.tx_physical,
            AddressingType::Functional => &self.tx_functional,
        }
    }

    /// Classify a received frame.
    ///
    /// Returns the addressing type of the rx address the frame matches, or
    /// `None` when the frame is not addressed to this node.
    pub fn is_input_packet(&self, can_id: u32, raw_frame_data: &[u8]) -> Option<AddressingType> {
        let format = self.addressing_format;
        let ai_byte = raw_frame_data
            .get(..format.ai_data_bytes_number())
            .map(|bytes| bytes.first().copied());
        [&self.rx_physical, &self.rx_functional]
            .into_iter()
            .find(|rx| rx.can_id == can_id && ai_byte == Some(frame_ai_byte(format, rx)))
            .map(|rx| rx.addressing_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extended_node() -> CanAddressingInformation {
        CanAddressingInformation::new(
            AddressingFormat::Extended,
            &AiParams::extended(0x701, 0x10),
            &AiParams::extended(0x702, 0x20),
            &AiParams::extended(0x7DF, 0x10),
            &AiParams::extended(0x7DF, 0xFF),
        )
        .unwrap()
    }

    #[test]
    fn test_is_input_packet_extended() {
        let node = extended_node();
        assert_eq!(
            node.is_input_packet(0x701, &[0x10, 0x01, 0x3E]),
            Some(AddressingType::Physical)
        );
        assert_eq!(
            node.is_input_packet(0x7DF, &[0x10, 0x01, 0x3E]),
            Some(AddressingType::Functional)
        );
        assert_eq!(node.is_input_packet(0x701, &[0x11, 0x01, 0x3E]), None);
        assert_eq!(node.is_input_packet(0x701, &[]), None);
        assert_eq!(node.is_input_packet(0x123, &[0x10, 0x01]), None);
    }

    #[test]
    fn test_is_input_packet_normal() {
        let node = CanAddressingInformation::new(
            AddressingFormat::Normal,
            &AiParams::normal(0x7E8),
            &AiParams::normal(0x7E0),
            &AiParams::normal(0x7DF),
            &AiParams::normal(0x7DE),
        )
        .unwrap();
        assert_eq!(
            node.is_input_packet(0x7E8, &[0x02, 0x10, 0x03]),
            Some(AddressingType::Physical)
        );
        assert_eq!(node.is_input_packet(0x7E0, &[0x02, 0x10, 0x03]), None);
    }

    #[test]
    fn test_indistinguishable_rx_addresses() {
        let result = CanAddressingInformation::new(
            AddressingFormat::Normal,
            &AiParams::normal(0x7E8),
            &AiParams::normal(0x7E0),
            &AiParams::normal(0x7E8),
            &AiParams::normal(0x7DF),
        );
        assert!(matches!(result, Err(CanError::ProtocolInconsistency(_))));
    }

    #[test]
    fn test_fixed_addresses_must_mirror() {
        let ok = CanAddressingInformation::new(
            AddressingFormat::NormalFixed,
            &AiParams::normal_fixed(0xF1, 0x12),
            &AiParams::normal_fixed(0x12, 0xF1),
            &AiParams::normal_fixed(0xF1, 0x33),
            &AiParams::normal_fixed(0x33, 0xF1),
        );
        assert!(ok.is_ok());

        let bad = CanAddressingInformation::new(
            AddressingFormat::NormalFixed,
            &AiParams::normal_fixed(0xF1, 0x12),
            &AiParams::normal_fixed(0x13, 0xF1),
            &AiParams::normal_fixed(0xF1, 0x33),
            &AiParams::normal_fixed(0x33, 0xF1),
        );
        assert!(matches!(bad, Err(CanError::ProtocolInconsistency(_))));
    }

    #[test]
    fn test_tx_params() {
        let node = extended_node();
        assert_eq!(node.tx_params(AddressingType::Physical).can_id, 0x702);
        assert_eq!(node.tx_params(AddressingType::Functional).target_address, Some(0xFF));
    }
}
