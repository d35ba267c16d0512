//! Message segmentation and desegmentation
//!
//! [`CanSegmenter`] splits a [`UdsMessage`] into the CAN packets that carry
//! it and reassembles packets into messages:
//!
//! ```text
//! payload ≤ SF capacity:   SF
//! payload  > SF capacity:  FF  CF(1)  CF(2) ... CF(15)  CF(0)  CF(1) ...
//! ```
//!
//! Flow Control packets travel in the opposite direction and carry no
//! payload; they are skipped during reassembly.

use crate::addressing::{AddressingType, AiParams, CanAddressingInformation};
use crate::config::{SegmenterConfig, UdsCanConfig};
use crate::dlc::{decode_dlc, MIN_BASE_UDS_DLC};
use crate::error::{CanError, CanResult};
use crate::message::{UdsMessage, UdsMessageRecord};
use crate::packet::first_frame::{MAX_LONG_FF_DL, MAX_SHORT_FF_DL};
use crate::packet::{
    consecutive_frame, first_frame, single_frame, CanPacket, CanPacketContainer, CanPacketRecord,
    CanPacketType, FlowStatus, FrameOptions, PacketData,
};

/// Segmenter bound to the addressing of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanSegmenter {
    addressing_information: CanAddressingInformation,
    dlc: u8,
    use_data_optimization: bool,
    filler_byte: u8,
}

fn validate_segmenter_dlc(dlc: u8) -> CanResult<()> {
    decode_dlc(dlc)?;
    if dlc < MIN_BASE_UDS_DLC {
        return Err(CanError::invalid_value(format!(
            "segmenter DLC must be at least {}, got {}",
            MIN_BASE_UDS_DLC, dlc
        )));
    }
    Ok(())
}

impl CanSegmenter {
    pub fn new(
        addressing_information: CanAddressingInformation,
        config: &SegmenterConfig,
    ) -> CanResult<Self> {
        validate_segmenter_dlc(config.dlc)?;
        Ok(Self {
            addressing_information,
            dlc: config.dlc,
            use_data_optimization: config.use_data_optimization,
            filler_byte: config.filler_byte,
        })
    }

    /// Build the node addressing and segmenter from a loaded configuration
    pub fn from_config(config: &UdsCanConfig) -> CanResult<Self> {
        let addressing_information = CanAddressingInformation::from_config(&config.addressing)?;
        Self::new(addressing_information, &config.segmenter)
    }

    pub fn addressing_information(&self) -> &CanAddressingInformation {
        &self.addressing_information
    }

    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    pub fn set_dlc(&mut self, dlc: u8) -> CanResult<()> {
        validate_segmenter_dlc(dlc)?;
        self.dlc = dlc;
        Ok(())
    }

    pub fn use_data_optimization(&self) -> bool {
        self.use_data_optimization
    }

    pub fn set_use_data_optimization(&mut self, use_data_optimization: bool) {
        self.use_data_optimization = use_data_optimization;
    }

    pub fn filler_byte(&self) -> u8 {
        self.filler_byte
    }

    pub fn set_filler_byte(&mut self, filler_byte: u8) {
        self.filler_byte = filler_byte;
    }

    /// Options for a packet that may be shortened by data optimization
    fn optimized_options(&self) -> FrameOptions {
        FrameOptions {
            dlc: (!self.use_data_optimization).then_some(self.dlc),
            filler_byte: self.filler_byte,
        }
    }

    fn full_options(&self) -> FrameOptions {
        FrameOptions {
            dlc: Some(self.dlc),
            filler_byte: self.filler_byte,
        }
    }

    fn tx_packet(
        &self,
        addressing_type: AddressingType,
        data: &PacketData,
        options: FrameOptions,
    ) -> CanResult<CanPacket> {
        let format = self.addressing_information.addressing_format();
        let params = self.addressing_information.tx_params(addressing_type);
        CanPacket::new(format, addressing_type, &AiParams::from(params), data, options)
    }

    /// Split a message into CAN packets.
    ///
    /// Functionally addressed messages must fit into a single frame.
    pub fn segmentation(&self, message: &UdsMessage) -> CanResult<Vec<CanPacket>> {
        let format = self.addressing_information.addressing_format();
        let payload = message.payload();
        let addressing_type = message.addressing_type();
        let sf_capacity = single_frame::get_max_payload_size(format, self.dlc)?;

        if payload.len() <= sf_capacity {
            let packet = self.tx_packet(
                addressing_type,
                &PacketData::SingleFrame {
                    payload: payload.to_vec(),
                },
                self.optimized_options(),
            )?;
            tracing::debug!(
                payload_len = payload.len(),
                addressing_type = %addressing_type,
                "Segmented message into Single Frame"
            );
            return Ok(vec![packet]);
        }
        if addressing_type == AddressingType::Functional {
            return Err(CanError::segmentation(format!(
                "functionally addressed message of {} bytes exceeds the {} bytes of a Single Frame",
                payload.len(),
                sf_capacity
            )));
        }
        let data_length = u32::try_from(payload.len()).map_err(|_| {
            CanError::segmentation(format!(
                "message of {} bytes exceeds the maximum FF_DL of {}",
                payload.len(),
                MAX_LONG_FF_DL
            ))
        })?;

        let ff_payload_size =
            first_frame::get_payload_size(format, self.dlc, data_length > MAX_SHORT_FF_DL)?;
        let (ff_payload, remaining) = payload.split_at(ff_payload_size.min(payload.len()));
        let first = self.tx_packet(
            addressing_type,
            &PacketData::FirstFrame {
                data_length,
                payload: ff_payload.to_vec(),
            },
            self.full_options(),
        )?;

        let cf_payload_size = consecutive_frame::get_max_payload_size(format, self.dlc)?;
        let chunks: Vec<&[u8]> = remaining.chunks(cf_payload_size).collect();
        let mut packets = Vec::with_capacity(chunks.len() + 1);
        packets.push(first);
        for (index, chunk) in chunks.iter().enumerate() {
            let options = if index + 1 == chunks.len() {
                self.optimized_options()
            } else {
                self.full_options()
            };
            let data = PacketData::ConsecutiveFrame {
                sequence_number: ((index + 1) % 16) as u8,
                payload: chunk.to_vec(),
            };
            let packet = packets[0].with_packet_data(&data, options)?;
            packets.push(packet);
        }

        tracing::debug!(
            payload_len = payload.len(),
            packets = packets.len(),
            dlc = self.dlc,
            "Segmented message into First Frame and Consecutive Frames"
        );
        Ok(packets)
    }

    /// Whether the packets form exactly one complete message.
    ///
    /// Packets must all be of the same container kind. The result depends
    /// on the packets alone, not on this segmenter's DLC or addressing.
    pub fn is_desegmented_message<P: CanPacketContainer>(&self, packets: &[P]) -> CanResult<bool> {
        let Some(first) = packets.first() else {
            return Err(CanError::invalid_value("no packets provided"));
        };
        let kind = first.container_kind();
        if packets.iter().any(|packet| packet.container_kind() != kind) {
            return Err(CanError::invalid_value(
                "packets mix live packets and packet records",
            ));
        }

        match first.data() {
            PacketData::SingleFrame { .. } => Ok(packets.len() == 1),
            PacketData::FirstFrame {
                data_length,
                payload,
            } => {
                let total = *data_length as usize;
                let mut found = payload.len();
                for packet in &packets[1..] {
                    let starts_message = matches!(
                        packet.packet_type(),
                        CanPacketType::SingleFrame | CanPacketType::FirstFrame
                    );
                    if starts_message || found >= total {
                        return Ok(false);
                    }
                    found += packet.payload().map_or(0, <[u8]>::len);
                }
                Ok(found >= total)
            }
            _ => Ok(false),
        }
    }

    fn desegmented_payload<P: CanPacketContainer>(&self, packets: &[P]) -> CanResult<Vec<u8>> {
        if !self.is_desegmented_message(packets)? {
            return Err(CanError::segmentation(
                "packets do not form exactly one complete message",
            ));
        }
        let mut payload = Vec::new();
        let mut data_length = None;
        for packet in packets {
            if let PacketData::FirstFrame { data_length: dl, .. } = packet.data() {
                data_length = Some(*dl as usize);
            }
            payload.extend_from_slice(packet.payload().unwrap_or_default());
        }
        if let Some(data_length) = data_length {
            payload.truncate(data_length);
        }
        Ok(payload)
    }

    /// Reassemble live packets into a message
    pub fn desegmentation(&self, packets: &[CanPacket]) -> CanResult<UdsMessage> {
        let payload = self.desegmented_payload(packets)?;
        let addressing_type = packets
            .first()
            .map(CanPacketContainer::addressing_type)
            .ok_or_else(|| CanError::invalid_value("no packets provided"))?;
        tracing::debug!(
            payload_len = payload.len(),
            packets = packets.len(),
            "Desegmented message"
        );
        UdsMessage::new(payload, addressing_type)
    }

    /// Reassemble captured packets into a message record
    pub fn desegmentation_records(
        &self,
        packets: Vec<CanPacketRecord>,
    ) -> CanResult<UdsMessageRecord> {
        let payload = self.desegmented_payload(&packets)?;
        tracing::debug!(
            payload_len = payload.len(),
            packets = packets.len(),
            "Desegmented message record"
        );
        UdsMessageRecord::new(payload, packets)
    }

    /// Flow Control packet sent with this node's physical tx addressing
    pub fn get_flow_control_packet(
        &self,
        flow_status: FlowStatus,
        block_size: Option<u8>,
        st_min: Option<u8>,
    ) -> CanResult<CanPacket> {
        self.tx_packet(
            AddressingType::Physical,
            &PacketData::FlowControl {
                flow_status,
                block_size,
                st_min,
            },
            self.optimized_options(),
        )
    }

    /// Addressing type of a frame received by this node, if addressed to it
    pub fn is_input_packet(&self, can_id: u32, raw_frame_data: &[u8]) -> Option<AddressingType> {
        self.addressing_information
            .is_input_packet(can_id, raw_frame_data)
    }
}
