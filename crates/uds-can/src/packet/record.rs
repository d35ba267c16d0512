//! Read-only records of packets seen on the bus

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::can_packet::decode_addressing;
use super::{decode_packet_data, CanPacketContainer, ContainerKind, PacketData};
use crate::addressing::{AddressingFormat, AddressingParams, AddressingType};
use crate::dlc::encode_dlc;
use crate::error::CanResult;

/// Raw CAN frame as captured by the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanFrame {
    pub can_id: u32,
    pub data: Vec<u8>,
}

impl CanFrame {
    pub fn new(can_id: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            can_id,
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransmissionDirection {
    Transmitted,
    Received,
}

impl fmt::Display for TransmissionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmissionDirection::Transmitted => f.write_str("Tx"),
            TransmissionDirection::Received => f.write_str("Rx"),
        }
    }
}

/// A packet that was transmitted or received.
///
/// The frame is validated once at construction; all derived fields are
/// decoded up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanPacketRecord {
    frame: CanFrame,
    direction: TransmissionDirection,
    transmission_time: DateTime<Utc>,
    addressing_format: AddressingFormat,
    addressing: AddressingParams,
    dlc: u8,
    data: PacketData,
}

impl CanPacketRecord {
    pub fn new(
        frame: CanFrame,
        direction: TransmissionDirection,
        addressing_format: AddressingFormat,
        addressing_type: AddressingType,
        transmission_time: DateTime<Utc>,
    ) -> CanResult<Self> {
        let dlc = encode_dlc(frame.data.len())?;
        let addressing =
            decode_addressing(addressing_format, addressing_type, frame.can_id, &frame.data)?;
        let data = decode_packet_data(addressing_format, &frame.data)?;
        Ok(Self {
            frame,
            direction,
            transmission_time,
            addressing_format,
            addressing,
            dlc,
            data,
        })
    }

    pub fn frame(&self) -> &CanFrame {
        &self.frame
    }

    pub fn direction(&self) -> TransmissionDirection {
        self.direction
    }

    pub fn transmission_time(&self) -> DateTime<Utc> {
        self.transmission_time
    }
}

impl CanPacketContainer for CanPacketRecord {
    fn raw_frame_data(&self) -> &[u8] {
        &self.frame.data
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
        ContainerKind::Record
    }
}

impl fmt::Display for CanPacketRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} 0x{:X} [{}] {}",
            self.transmission_time.format("%H:%M:%S%.6f"),
            self.direction,
            self.data.packet_type(),
            self.frame.can_id,
            self.dlc,
            hex::encode_upper(&self.frame.data)
        )
    }
}
