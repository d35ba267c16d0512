//! Addressing formats and addressing types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CanError;

/// CAN addressing format (ISO 15765-2 clause 10.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressingFormat {
    /// CAN ID chosen freely, no addressing byte in the payload
    #[serde(rename = "normal")]
    Normal,
    /// 29-bit CAN ID carrying target and source address
    #[serde(rename = "normal_fixed")]
    NormalFixed,
    /// First data byte carries the target address
    #[serde(rename = "extended")]
    Extended,
    /// 11-bit CAN ID, first data byte carries the address extension
    #[serde(rename = "mixed_11bit")]
    Mixed11Bit,
    /// 29-bit fixed CAN ID plus address extension in the first data byte
    #[serde(rename = "mixed_29bit")]
    Mixed29Bit,
}

impl AddressingFormat {
    pub const ALL: [AddressingFormat; 5] = [
        AddressingFormat::Normal,
        AddressingFormat::NormalFixed,
        AddressingFormat::Extended,
        AddressingFormat::Mixed11Bit,
        AddressingFormat::Mixed29Bit,
    ];

    /// Number of payload bytes occupied by addressing information
    pub fn ai_data_bytes_number(&self) -> usize {
        match self {
            AddressingFormat::Normal | AddressingFormat::NormalFixed => 0,
            AddressingFormat::Extended
            | AddressingFormat::Mixed11Bit
            | AddressingFormat::Mixed29Bit => 1,
        }
    }

    /// Whether the CAN ID follows the fixed 29-bit layout
    pub fn has_fixed_can_id(&self) -> bool {
        matches!(
            self,
            AddressingFormat::NormalFixed | AddressingFormat::Mixed29Bit
        )
    }

    fn as_str(&self) -> &'static str {
        match self {
            AddressingFormat::Normal => "normal",
            AddressingFormat::NormalFixed => "normal_fixed",
            AddressingFormat::Extended => "extended",
            AddressingFormat::Mixed11Bit => "mixed_11bit",
            AddressingFormat::Mixed29Bit => "mixed_29bit",
        }
    }
}

impl fmt::Display for AddressingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressingFormat {
    type Err = CanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == normalized)
            .ok_or_else(|| CanError::InvalidType(format!("unknown addressing format: {}", s)))
    }
}

/// Addressing type of a message or packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingType {
    /// 1-to-1 communication
    Physical,
    /// 1-to-n communication
    Functional,
}

impl fmt::Display for AddressingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AddressingType::Physical => "physical",
            AddressingType::Functional => "functional",
        };
        f.write_str(s)
    }
}
