//! Diagnostic messages carried by the transport layer

use std::fmt;

use chrono::{DateTime, Utc};

use crate::addressing::AddressingType;
use crate::error::{CanError, CanResult};
use crate::packet::{CanPacketContainer, CanPacketRecord, TransmissionDirection};

/// A UDS message to be segmented or produced by desegmentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdsMessage {
    payload: Vec<u8>,
    addressing_type: AddressingType,
}

impl UdsMessage {
    pub fn new(payload: impl Into<Vec<u8>>, addressing_type: AddressingType) -> CanResult<Self> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(CanError::invalid_value("UDS message payload cannot be empty"));
        }
        Ok(Self {
            payload,
            addressing_type,
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn addressing_type(&self) -> AddressingType {
        self.addressing_type
    }
}

impl fmt::Display for UdsMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.addressing_type,
            hex::encode_upper(&self.payload)
        )
    }
}

/// A message that was transmitted or received, with the packets that
/// carried it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdsMessageRecord {
    payload: Vec<u8>,
    packets: Vec<CanPacketRecord>,
}

impl UdsMessageRecord {
    pub fn new(payload: impl Into<Vec<u8>>, packets: Vec<CanPacketRecord>) -> CanResult<Self> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(CanError::invalid_value("UDS message payload cannot be empty"));
        }
        if packets.is_empty() {
            return Err(CanError::invalid_value(
                "UDS message record needs at least one packet",
            ));
        }
        Ok(Self { payload, packets })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn packets(&self) -> &[CanPacketRecord] {
        &self.packets
    }

    fn first(&self) -> &CanPacketRecord {
        // non-empty, checked in new()
        &self.packets[0]
    }

    fn last(&self) -> &CanPacketRecord {
        &self.packets[self.packets.len() - 1]
    }

    pub fn addressing_type(&self) -> AddressingType {
        self.first().addressing_type()
    }

    pub fn direction(&self) -> TransmissionDirection {
        self.first().direction()
    }

    pub fn transmission_start(&self) -> DateTime<Utc> {
        self.first().transmission_time()
    }

    pub fn transmission_end(&self) -> DateTime<Utc> {
        self.last().transmission_time()
    }
}
