//! CAN packets of the ISO 15765-2 transport layer
//!
//! Every packet starts with optional addressing information (AI) followed
//! by the N_PCI, whose high nibble selects the packet type:
//!
//! ```text
//! ┌──────┬────────────┬──────────────────────────────┐
//! │ [AI] │ N_PCI      │ type specific fields/payload │
//! └──────┴────────────┴──────────────────────────────┘
//!          0x0_  Single Frame
//!          0x1_  First Frame
//!          0x2_  Consecutive Frame
//!          0x3_  Flow Control
//! ```
//!
//! The per-type codecs live in their own modules and each expose a strict
//! `create_data` builder next to a permissive `generate_data` one.
//! [`CanPacket`] and [`CanPacketRecord`] wrap encoded frames.

pub mod can_packet;
pub mod consecutive_frame;
pub mod container;
pub mod first_frame;
pub mod flow_control;
pub mod record;
pub mod single_frame;

pub use can_packet::CanPacket;
pub use container::{AnyCanPacket, CanPacketContainer, ContainerKind};
pub use flow_control::{FlowStatus, StMinDecoded};
pub use record::{CanFrame, CanPacketRecord, TransmissionDirection};

use std::fmt;

use crate::addressing::AddressingFormat;
use crate::dlc::{decode_dlc, DEFAULT_FILLER_BYTE};
use crate::error::{CanError, CanResult};

/// Packet type encoded in the high N_PCI nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CanPacketType {
    SingleFrame = 0x0,
    FirstFrame = 0x1,
    ConsecutiveFrame = 0x2,
    FlowControl = 0x3,
}

impl CanPacketType {
    pub fn from_n_pci(nibble: u8) -> CanResult<Self> {
        match nibble {
            0x0 => Ok(CanPacketType::SingleFrame),
            0x1 => Ok(CanPacketType::FirstFrame),
            0x2 => Ok(CanPacketType::ConsecutiveFrame),
            0x3 => Ok(CanPacketType::FlowControl),
            other => Err(CanError::UnsupportedVariant(format!(
                "N_PCI 0x{:X} is not a CAN packet type",
                other
            ))),
        }
    }
}

impl fmt::Display for CanPacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CanPacketType::SingleFrame => "SF",
            CanPacketType::FirstFrame => "FF",
            CanPacketType::ConsecutiveFrame => "CF",
            CanPacketType::FlowControl => "FC",
        };
        f.write_str(s)
    }
}

/// Type specific content of a packet.
///
/// Used both to describe a packet to build and as the decoded view of an
/// existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketData {
    SingleFrame {
        payload: Vec<u8>,
    },
    FirstFrame {
        /// FF_DL, the length of the whole message
        data_length: u32,
        payload: Vec<u8>,
    },
    ConsecutiveFrame {
        sequence_number: u8,
        /// Payload as carried, padding included
        payload: Vec<u8>,
    },
    FlowControl {
        flow_status: FlowStatus,
        /// Present only with ContinueToSend
        block_size: Option<u8>,
        /// Raw STmin byte, present only with ContinueToSend
        st_min: Option<u8>,
    },
}

impl PacketData {
    pub fn packet_type(&self) -> CanPacketType {
        match self {
            PacketData::SingleFrame { .. } => CanPacketType::SingleFrame,
            PacketData::FirstFrame { .. } => CanPacketType::FirstFrame,
            PacketData::ConsecutiveFrame { .. } => CanPacketType::ConsecutiveFrame,
            PacketData::FlowControl { .. } => CanPacketType::FlowControl,
        }
    }

    /// Payload bytes; `None` for Flow Control
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            PacketData::SingleFrame { payload }
            | PacketData::FirstFrame { payload, .. }
            | PacketData::ConsecutiveFrame { payload, .. } => Some(payload.as_slice()),
            PacketData::FlowControl { .. } => None,
        }
    }
}

/// Frame layout options for the strict builders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    /// DLC to use; `None` selects the smallest one that fits
    pub dlc: Option<u8>,
    pub filler_byte: u8,
}

impl FrameOptions {
    pub fn with_dlc(dlc: u8) -> Self {
        Self {
            dlc: Some(dlc),
            ..Self::default()
        }
    }
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            dlc: None,
            filler_byte: DEFAULT_FILLER_BYTE,
        }
    }
}

/// Validate a frame and decode its type specific content
pub fn decode_packet_data(
    format: AddressingFormat,
    raw_frame_data: &[u8],
) -> CanResult<PacketData> {
    let nibble = n_pci_of(format, raw_frame_data)
        .ok_or_else(|| CanError::invalid_value("frame too short to hold an N_PCI"))?;
    let data = match CanPacketType::from_n_pci(nibble)? {
        CanPacketType::SingleFrame => {
            single_frame::validate_frame_data(format, raw_frame_data)?;
            PacketData::SingleFrame {
                payload: single_frame::extract_payload(format, raw_frame_data)?.to_vec(),
            }
        }
        CanPacketType::FirstFrame => {
            first_frame::validate_frame_data(format, raw_frame_data)?;
            PacketData::FirstFrame {
                data_length: first_frame::extract_ff_dl(format, raw_frame_data)?,
                payload: first_frame::extract_payload(format, raw_frame_data)?.to_vec(),
            }
        }
        CanPacketType::ConsecutiveFrame => {
            consecutive_frame::validate_frame_data(format, raw_frame_data)?;
            PacketData::ConsecutiveFrame {
                sequence_number: consecutive_frame::extract_sequence_number(
                    format,
                    raw_frame_data,
                )?,
                payload: consecutive_frame::extract_payload(format, raw_frame_data)?.to_vec(),
            }
        }
        CanPacketType::FlowControl => {
            flow_control::validate_frame_data(format, raw_frame_data)?;
            let flow_status = flow_control::extract_flow_status(format, raw_frame_data)?;
            let (block_size, st_min) = if flow_status == FlowStatus::ContinueToSend {
                (
                    Some(flow_control::extract_block_size(format, raw_frame_data)?),
                    Some(flow_control::extract_st_min(format, raw_frame_data)?),
                )
            } else {
                (None, None)
            };
            PacketData::FlowControl {
                flow_status,
                block_size,
                st_min,
            }
        }
    };
    Ok(data)
}

/// AI bytes that open a frame of this format
pub(crate) fn ai_prefix(format: AddressingFormat, ai_byte: Option<u8>) -> CanResult<Vec<u8>> {
    match (format.ai_data_bytes_number(), ai_byte) {
        (0, None) => Ok(Vec::new()),
        (1, Some(byte)) => Ok(vec![byte]),
        (0, Some(_)) => Err(CanError::invalid_value(format!(
            "{} addressing carries no AI data byte",
            format
        ))),
        _ => Err(CanError::invalid_value(format!(
            "{} addressing requires an AI data byte",
            format
        ))),
    }
}

/// High N_PCI nibble, `None` when the frame ends before the N_PCI
pub(crate) fn n_pci_of(format: AddressingFormat, raw_frame_data: &[u8]) -> Option<u8> {
    raw_frame_data
        .get(format.ai_data_bytes_number())
        .map(|pci| pci >> 4)
}

/// Smallest DLC carrying the packet content unpadded.
///
/// First Frames always fill their frame, so they have no such minimum.
pub(crate) fn min_frame_dlc(format: AddressingFormat, data: &PacketData) -> Option<u8> {
    match data {
        PacketData::SingleFrame { payload } => {
            single_frame::get_min_dlc(format, payload.len()).ok()
        }
        PacketData::FirstFrame { .. } => None,
        PacketData::ConsecutiveFrame { payload, .. } => {
            consecutive_frame::get_min_dlc(format, payload.len()).ok()
        }
        PacketData::FlowControl { .. } => flow_control::get_min_dlc(format).ok(),
    }
}

/// Fill the frame up to the size of `dlc`
pub(crate) fn pad_to_dlc(frame: &mut Vec<u8>, dlc: u8, filler_byte: u8) -> CanResult<()> {
    let size = decode_dlc(dlc)?;
    if frame.len() > size {
        return Err(CanError::invalid_value(format!(
            "{} bytes do not fit into a frame with DLC {}",
            frame.len(),
            dlc
        )));
    }
    frame.resize(size, filler_byte);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_packet_type_from_n_pci() {
        assert_eq!(
            CanPacketType::from_n_pci(0x2).unwrap(),
            CanPacketType::ConsecutiveFrame
        );
        assert!(matches!(
            CanPacketType::from_n_pci(0x4),
            Err(CanError::UnsupportedVariant(_))
        ));
    }

    #[test]
    fn test_decode_packet_data() {
        assert_eq!(
            decode_packet_data(AddressingFormat::Normal, &[0x02, 0x10, 0x03]).unwrap(),
            PacketData::SingleFrame {
                payload: vec![0x10, 0x03]
            }
        );
        assert_eq!(
            decode_packet_data(AddressingFormat::Extended, &[0xF1, 0x30, 0x08, 0x14]).unwrap(),
            PacketData::FlowControl {
                flow_status: FlowStatus::ContinueToSend,
                block_size: Some(0x08),
                st_min: Some(0x14),
            }
        );
        assert_eq!(
            decode_packet_data(AddressingFormat::Normal, &[0x31, 0xCC, 0xCC]).unwrap(),
            PacketData::FlowControl {
                flow_status: FlowStatus::Wait,
                block_size: None,
                st_min: None,
            }
        );
        assert_eq!(
            decode_packet_data(AddressingFormat::Normal, &[0x2A, 0x01, 0x02]).unwrap(),
            PacketData::ConsecutiveFrame {
                sequence_number: 0xA,
                payload: vec![0x01, 0x02]
            }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_or_short() {
        assert!(matches!(
            decode_packet_data(AddressingFormat::Normal, &[0x40, 0x00]),
            Err(CanError::UnsupportedVariant(_))
        ));
        assert!(decode_packet_data(AddressingFormat::Extended, &[0xF1]).is_err());
        assert!(decode_packet_data(AddressingFormat::Normal, &[]).is_err());
    }

    #[test]
    fn test_ai_prefix() {
        assert_eq!(ai_prefix(AddressingFormat::Normal, None).unwrap(), Vec::<u8>::new());
        assert_eq!(ai_prefix(AddressingFormat::Mixed29Bit, Some(0xDB)).unwrap(), vec![0xDB]);
        assert!(ai_prefix(AddressingFormat::NormalFixed, Some(0x01)).is_err());
        assert!(ai_prefix(AddressingFormat::Extended, None).is_err());
    }

    #[test]
    fn test_min_frame_dlc() {
        let sf = PacketData::SingleFrame {
            payload: vec![0x3E],
        };
        assert_eq!(min_frame_dlc(AddressingFormat::Normal, &sf), Some(2));
        assert_eq!(min_frame_dlc(AddressingFormat::Extended, &sf), Some(3));
        let ff = PacketData::FirstFrame {
            data_length: 100,
            payload: vec![0; 6],
        };
        assert_eq!(min_frame_dlc(AddressingFormat::Normal, &ff), None);
        let fc = PacketData::FlowControl {
            flow_status: FlowStatus::Wait,
            block_size: None,
            st_min: None,
        };
        assert_eq!(min_frame_dlc(AddressingFormat::Normal, &fc), Some(3));
    }

    #[test]
    fn test_pad_to_dlc() {
        let mut frame = vec![0x01, 0x3E];
        pad_to_dlc(&mut frame, 4, 0xAA).unwrap();
        assert_eq!(frame, vec![0x01, 0x3E, 0xAA, 0xAA]);
        assert!(pad_to_dlc(&mut frame, 3, 0xAA).is_err());
    }

    #[test]
    fn test_packet_data_accessors() {
        let data = PacketData::FirstFrame {
            data_length: 100,
            payload: vec![1, 2, 3, 4, 5, 6],
        };
        assert_eq!(data.packet_type(), CanPacketType::FirstFrame);
        assert_eq!(data.payload(), Some(&[1u8, 2, 3, 4, 5, 6][..]));
        let fc = PacketData::FlowControl {
            flow_status: FlowStatus::Overflow,
            block_size: None,
            st_min: None,
        };
        assert_eq!(fc.payload(), None);
    }
}
