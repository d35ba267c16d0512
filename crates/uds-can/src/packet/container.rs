//! Accessors shared by live packets and captured records

use super::{CanPacket, CanPacketRecord, CanPacketType, FlowStatus, PacketData};
use crate::addressing::{AddressingFormat, AddressingParams, AddressingType};

/// Which concrete container a packet view is backed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Packet,
    Record,
}

/// Read access to an encoded CAN packet.
///
/// Type specific accessors return `None` when the field does not exist for
/// the packet type.
pub trait CanPacketContainer {
    fn raw_frame_data(&self) -> &[u8];
    fn addressing_format(&self) -> AddressingFormat;
    fn addressing_params(&self) -> &AddressingParams;
    fn dlc(&self) -> u8;
    fn data(&self) -> &PacketData;
    fn container_kind(&self) -> ContainerKind;

    fn addressing_type(&self) -> AddressingType {
        self.addressing_params().addressing_type
    }

    fn can_id(&self) -> u32 {
        self.addressing_params().can_id
    }

    fn target_address(&self) -> Option<u8> {
        self.addressing_params().target_address
    }

    fn source_address(&self) -> Option<u8> {
        self.addressing_params().source_address
    }

    fn address_extension(&self) -> Option<u8> {
        self.addressing_params().address_extension
    }

    fn packet_type(&self) -> CanPacketType {
        self.data().packet_type()
    }

    fn payload(&self) -> Option<&[u8]> {
        self.data().payload()
    }

    /// SF_DL for Single Frames, FF_DL for First Frames
    fn data_length(&self) -> Option<u32> {
        match self.data() {
            PacketData::SingleFrame { payload } => Some(payload.len() as u32),
            PacketData::FirstFrame { data_length, .. } => Some(*data_length),
            _ => None,
        }
    }

    fn sequence_number(&self) -> Option<u8> {
        match self.data() {
            PacketData::ConsecutiveFrame {
                sequence_number, ..
            } => Some(*sequence_number),
            _ => None,
        }
    }

    fn flow_status(&self) -> Option<FlowStatus> {
        match self.data() {
            PacketData::FlowControl { flow_status, .. } => Some(*flow_status),
            _ => None,
        }
    }

    fn block_size(&self) -> Option<u8> {
        match self.data() {
            PacketData::FlowControl { block_size, .. } => *block_size,
            _ => None,
        }
    }

    fn st_min(&self) -> Option<u8> {
        match self.data() {
            PacketData::FlowControl { st_min, .. } => *st_min,
            _ => None,
        }
    }
}

/// Borrowed view of either container kind
#[derive(Debug, Clone, Copy)]
pub enum AnyCanPacket<'a> {
    Packet(&'a CanPacket),
    Record(&'a CanPacketRecord),
}

impl<'a> AnyCanPacket<'a> {
    fn inner(&self) -> &'a dyn CanPacketContainer {
        match *self {
            AnyCanPacket::Packet(packet) => packet,
            AnyCanPacket::Record(record) => record,
        }
    }
}

impl CanPacketContainer for AnyCanPacket<'_> {
    fn raw_frame_data(&self) -> &[u8] {
        self.inner().raw_frame_data()
    }

    fn addressing_format(&self) -> AddressingFormat {
        self.inner().addressing_format()
    }

    fn addressing_params(&self) -> &AddressingParams {
        self.inner().addressing_params()
    }

    fn dlc(&self) -> u8 {
        self.inner().dlc()
    }

    fn data(&self) -> &PacketData {
        self.inner().data()
    }

    fn container_kind(&self) -> ContainerKind {
        self.inner().container_kind()
    }
}

impl<'a> From<&'a CanPacket> for AnyCanPacket<'a> {
    fn from(packet: &'a CanPacket) -> Self {
        AnyCanPacket::Packet(packet)
    }
}

impl<'a> From<&'a CanPacketRecord> for AnyCanPacket<'a> {
    fn from(record: &'a CanPacketRecord) -> Self {
        AnyCanPacket::Record(record)
    }
}
