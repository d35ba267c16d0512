//! Live CAN packet value

use std::fmt;

use super::{
    consecutive_frame, decode_packet_data, first_frame, flow_control, min_frame_dlc,
    single_frame, CanPacketContainer, ContainerKind, FrameOptions, PacketData,
};
use crate::addressing::{
    decode_frame_ai_params, frame_ai_byte, validate_addressing_params, AddressingFormat,
    AddressingParams, AddressingType, AiParams,
};
use crate::diagnostic::Diagnostic;
use crate::dlc::{encode_dlc, padding_diagnostic};
use crate::error::{CanError, CanResult};

/// A validated, fully encoded CAN packet.
///
/// Values are immutable; the `with_*` methods return rebuilt copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanPacket {
    addressing_format: AddressingFormat,
    addressing: AddressingParams,
    dlc: u8,
    raw_frame_data: Vec<u8>,
    data: PacketData,
    diagnostic: Option<Diagnostic>,
}

impl CanPacket {
    /// Encode a packet.
    ///
    /// First Frames need an explicit DLC in `options`; every other packet
    /// type falls back to the smallest DLC that fits.
    pub fn new(
        addressing_format: AddressingFormat,
        addressing_type: AddressingType,
        ai: &AiParams,
        data: &PacketData,
        options: FrameOptions,
    ) -> CanResult<Self> {
        let addressing = validate_addressing_params(addressing_format, addressing_type, ai)?;
        Self::build(addressing_format, addressing, data, options)
    }

    /// Wrap frame bytes that were encoded elsewhere
    pub fn from_raw(
        addressing_format: AddressingFormat,
        addressing_type: AddressingType,
        can_id: u32,
        raw_frame_data: Vec<u8>,
    ) -> CanResult<Self> {
        let addressing =
            decode_addressing(addressing_format, addressing_type, can_id, &raw_frame_data)?;
        Self::from_parts(addressing_format, addressing, raw_frame_data)
    }

    fn build(
        format: AddressingFormat,
        addressing: AddressingParams,
        data: &PacketData,
        options: FrameOptions,
    ) -> CanResult<Self> {
        let ai_byte = frame_ai_byte(format, &addressing);
        let FrameOptions { dlc, filler_byte } = options;
        let raw_frame_data = match data {
            PacketData::SingleFrame { payload } => {
                single_frame::create_data(format, ai_byte, payload, dlc, filler_byte)?
            }
            PacketData::FirstFrame {
                data_length,
                payload,
            } => {
                let dlc = dlc.ok_or_else(|| {
                    CanError::invalid_value("First Frame requires an explicit DLC")
                })?;
                first_frame::create_data(format, ai_byte, payload, dlc, *data_length)?
            }
            PacketData::ConsecutiveFrame {
                sequence_number,
                payload,
            } => consecutive_frame::create_data(
                format,
                ai_byte,
                payload,
                *sequence_number,
                dlc,
                filler_byte,
            )?,
            PacketData::FlowControl {
                flow_status,
                block_size,
                st_min,
            } => flow_control::create_data(
                format,
                ai_byte,
                *flow_status,
                *block_size,
                *st_min,
                dlc,
                filler_byte,
            )?,
        };
        Self::from_parts(format, addressing, raw_frame_data)
    }

    fn from_parts(
        addressing_format: AddressingFormat,
        addressing: AddressingParams,
        raw_frame_data: Vec<u8>,
    ) -> CanResult<Self> {
        let dlc = encode_dlc(raw_frame_data.len())?;
        let data = decode_packet_data(addressing_format, &raw_frame_data)?;
        let diagnostic = min_frame_dlc(addressing_format, &data)
            .and_then(|min_dlc| padding_diagnostic(dlc, min_dlc))
            .map(Diagnostic::emit);
        Ok(Self {
            addressing_format,
            addressing,
            dlc,
            raw_frame_data,
            data,
            diagnostic,
        })
    }

    /// Same packet content with different addressing.
    ///
    /// The addressing format is fixed at construction. Asking for a format
    /// with a different number of AI bytes would shift every encoded field.
    pub fn with_addressing(
        &self,
        addressing_format: AddressingFormat,
        addressing_type: AddressingType,
        ai: &AiParams,
    ) -> CanResult<Self> {
        if addressing_format != self.addressing_format {
            let current = self.addressing_format;
            if addressing_format.ai_data_bytes_number() != current.ai_data_bytes_number() {
                return Err(CanError::AddressingAmbiguity(format!(
                    "switching from {} to {} addressing changes the AI length of encoded data",
                    current, addressing_format
                )));
            }
            return Err(CanError::ImmutableFieldViolation(format!(
                "addressing format is {} and cannot become {}",
                current, addressing_format
            )));
        }
        let addressing = validate_addressing_params(addressing_format, addressing_type, ai)?;
        let mut raw_frame_data = self.raw_frame_data.clone();
        if let (Some(ai_byte), Some(slot)) = (
            frame_ai_byte(addressing_format, &addressing),
            raw_frame_data.first_mut(),
        ) {
            *slot = ai_byte;
        }
        Ok(Self {
            addressing_format,
            addressing,
            dlc: self.dlc,
            raw_frame_data,
            data: self.data.clone(),
            diagnostic: self.diagnostic,
        })
    }

    /// Same addressing with new packet content
    pub fn with_packet_data(&self, data: &PacketData, options: FrameOptions) -> CanResult<Self> {
        Self::build(self.addressing_format, self.addressing, data, options)
    }

    /// Non-fatal finding about the encoded frame, such as a CAN FD DLC
    /// larger than the content needs
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        self.diagnostic
    }
}

/// Decode frame addressing and check it against the given addressing type
pub(crate) fn decode_addressing(
    format: AddressingFormat,
    addressing_type: AddressingType,
    can_id: u32,
    raw_frame_data: &[u8],
) -> CanResult<AddressingParams> {
    let addressing = decode_frame_ai_params(format, can_id, raw_frame_data)?
        .with_addressing_type(addressing_type)?;
    validate_addressing_params(format, addressing_type, &AiParams::from(&addressing))
}

impl CanPacketContainer for CanPacket {
    fn raw_frame_data(&self) -> &[u8] {
        &self.raw_frame_data
    }

    fn addressing_format(&self) -> AddressingFormat {
        self.addressing_format
    }

    fn addressing_params(&self) -> &AddressingParams {
        &self.addressing
    }

    fn dlc(&self) -> u8 {
        self.dlc
    }

    fn data(&self) -> &PacketData {
        &self.data
    }

    fn container_kind(&self) -> ContainerKind {
        ContainerKind::Packet
    }
}

impl fmt::Display for CanPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} 0x{:X} [{}] {}",
            self.data.packet_type(),
            self.addressing.can_id,
            self.dlc,
            hex::encode_upper(&self.raw_frame_data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{CanPacketType, FlowStatus};
    use pretty_assertions::assert_eq;

    fn single_frame(payload: &[u8]) -> PacketData {
        PacketData::SingleFrame {
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn test_normal_single_frame() {
        let packet = CanPacket::new(
            AddressingFormat::Normal,
            AddressingType::Physical,
            &AiParams::normal(0x7E0),
            &single_frame(&[0x3E]),
            FrameOptions::default(),
        )
        .unwrap();
        assert_eq!(packet.raw_frame_data(), &[0x01, 0x3E]);
        assert_eq!(packet.dlc(), 2);
        assert_eq!(packet.can_id(), 0x7E0);
        assert_eq!(packet.packet_type(), CanPacketType::SingleFrame);
        assert_eq!(packet.data_length(), Some(1));
        assert_eq!(packet.sequence_number(), None);
        assert_eq!(packet.to_string(), "SF 0x7E0 [2] 013E");
    }

    #[test]
    fn test_inefficient_dlc_reported() {
        let packet = CanPacket::new(
            AddressingFormat::Normal,
            AddressingType::Physical,
            &AiParams::normal(0x7E0),
            &single_frame(&[0x3E]),
            FrameOptions::with_dlc(15),
        )
        .unwrap();
        assert_eq!(packet.raw_frame_data().len(), 64);
        assert_eq!(
            packet.diagnostic(),
            Some(Diagnostic::InefficientDlc { dlc: 15, min_dlc: 8 })
        );

        let padded = packet
            .with_packet_data(&single_frame(&[0x3E]), FrameOptions::with_dlc(8))
            .unwrap();
        assert_eq!(padded.diagnostic(), None);

        let received = CanPacket::from_raw(
            AddressingFormat::Normal,
            AddressingType::Physical,
            0x7E0,
            packet.raw_frame_data().to_vec(),
        )
        .unwrap();
        assert_eq!(received.diagnostic(), packet.diagnostic());
    }

    #[test]
    fn test_mixed_29bit_single_frame() {
        let packet = CanPacket::new(
            AddressingFormat::Mixed29Bit,
            AddressingType::Physical,
            &AiParams::mixed_29bit(0xE9, 0xB7, 0xDB),
            &single_frame(&[0x3E]),
            FrameOptions::with_dlc(8),
        )
        .unwrap();
        assert_eq!(packet.can_id(), 0x18CE_E9B7);
        assert_eq!(
            packet.raw_frame_data(),
            &[0xDB, 0x01, 0x3E, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC]
        );
        assert_eq!(packet.target_address(), Some(0xE9));
        assert_eq!(packet.source_address(), Some(0xB7));
        assert_eq!(packet.address_extension(), Some(0xDB));
    }

    #[test]
    fn test_first_frame_requires_dlc() {
        let data = PacketData::FirstFrame {
            data_length: 100,
            payload: vec![0; 6],
        };
        let ai = AiParams::normal(0x7E0);
        let result = CanPacket::new(
            AddressingFormat::Normal,
            AddressingType::Physical,
            &ai,
            &data,
            FrameOptions::default(),
        );
        assert!(matches!(result, Err(CanError::InvalidValue(_))));

        let packet = CanPacket::new(
            AddressingFormat::Normal,
            AddressingType::Physical,
            &ai,
            &data,
            FrameOptions::with_dlc(8),
        )
        .unwrap();
        assert_eq!(packet.data_length(), Some(100));
        assert_eq!(packet.payload(), Some(&[0u8; 6][..]));
    }

    #[test]
    fn test_flow_control_accessors() {
        let packet = CanPacket::new(
            AddressingFormat::Extended,
            AddressingType::Physical,
            &AiParams::extended(0x701, 0x20),
            &PacketData::FlowControl {
                flow_status: FlowStatus::ContinueToSend,
                block_size: Some(8),
                st_min: Some(0xF5),
            },
            FrameOptions::default(),
        )
        .unwrap();
        assert_eq!(packet.raw_frame_data(), &[0x20, 0x30, 0x08, 0xF5]);
        assert_eq!(packet.flow_status(), Some(FlowStatus::ContinueToSend));
        assert_eq!(packet.block_size(), Some(8));
        assert_eq!(packet.st_min(), Some(0xF5));
        assert_eq!(packet.payload(), None);
        assert_eq!(packet.data_length(), None);
    }

    #[test]
    fn test_with_addressing_rewrites_ai_byte() {
        let packet = CanPacket::new(
            AddressingFormat::Extended,
            AddressingType::Physical,
            &AiParams::extended(0x701, 0x20),
            &single_frame(&[0x10, 0x03]),
            FrameOptions::default(),
        )
        .unwrap();
        let moved = packet
            .with_addressing(
                AddressingFormat::Extended,
                AddressingType::Functional,
                &AiParams::extended(0x7DF, 0xFF),
            )
            .unwrap();
        assert_eq!(moved.raw_frame_data(), &[0xFF, 0x02, 0x10, 0x03]);
        assert_eq!(moved.can_id(), 0x7DF);
        assert_eq!(moved.addressing_type(), AddressingType::Functional);
        assert_eq!(packet.raw_frame_data(), &[0x20, 0x02, 0x10, 0x03]);
    }

    #[test]
    fn test_with_addressing_format_changes() {
        let packet = CanPacket::new(
            AddressingFormat::Normal,
            AddressingType::Physical,
            &AiParams::normal(0x7E0),
            &single_frame(&[0x3E]),
            FrameOptions::default(),
        )
        .unwrap();
        let result = packet.with_addressing(
            AddressingFormat::Extended,
            AddressingType::Physical,
            &AiParams::extended(0x7E0, 0x01),
        );
        assert!(matches!(result, Err(CanError::AddressingAmbiguity(_))));

        let result = packet.with_addressing(
            AddressingFormat::NormalFixed,
            AddressingType::Physical,
            &AiParams::normal_fixed(0x01, 0x02),
        );
        assert!(matches!(result, Err(CanError::ImmutableFieldViolation(_))));
    }

    #[test]
    fn test_with_packet_data() {
        let packet = CanPacket::new(
            AddressingFormat::Mixed11Bit,
            AddressingType::Physical,
            &AiParams::mixed_11bit(0x123, 0x7E),
            &single_frame(&[0x3E]),
            FrameOptions::default(),
        )
        .unwrap();
        let cf = packet
            .with_packet_data(
                &PacketData::ConsecutiveFrame {
                    sequence_number: 3,
                    payload: vec![0xAB, 0xCD],
                },
                FrameOptions::with_dlc(8),
            )
            .unwrap();
        assert_eq!(cf.raw_frame_data(), &[0x7E, 0x23, 0xAB, 0xCD, 0xCC, 0xCC, 0xCC, 0xCC]);
        assert_eq!(cf.sequence_number(), Some(3));
        assert_eq!(cf.address_extension(), Some(0x7E));
    }

    #[test]
    fn test_from_raw() {
        let packet = CanPacket::from_raw(
            AddressingFormat::NormalFixed,
            AddressingType::Functional,
            0x18DB_33F1,
            vec![0x02, 0x10, 0x03],
        )
        .unwrap();
        assert_eq!(packet.target_address(), Some(0x33));
        assert_eq!(packet.source_address(), Some(0xF1));

        let result = CanPacket::from_raw(
            AddressingFormat::NormalFixed,
            AddressingType::Physical,
            0x18DB_33F1,
            vec![0x02, 0x10, 0x03],
        );
        assert!(matches!(result, Err(CanError::ProtocolInconsistency(_))));
    }
}
