//! Transport configuration
//!
//! TOML representation of a node's addressing, its segmenter settings and
//! the flow control parameters it answers with.
//!
//! ```toml
//! [addressing]
//! addressing_format = "extended"
//! rx_physical = { can_id = 0x701, target_address = 0x10 }
//! tx_physical = { can_id = 0x702, target_address = 0x20 }
//! rx_functional = { can_id = 0x7DF, target_address = 0x10 }
//! tx_functional = { can_id = 0x7DF, target_address = 0xFF }
//!
//! [segmenter]
//! dlc = 8
//! use_data_optimization = true
//!
//! [flow_control]
//! block_size = 8
//! st_min = 0x14
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::addressing::{AddressingFormat, AiParams};
use crate::dlc::{DEFAULT_FILLER_BYTE, MIN_BASE_UDS_DLC};
use crate::error::CanResult;

/// Complete configuration of one transport node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdsCanConfig {
    /// rx/tx addressing of the node
    pub addressing: NodeAddressingConfig,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    #[serde(default)]
    pub flow_control: FlowControlConfig,
}

impl UdsCanConfig {
    pub fn from_toml_str(content: &str) -> CanResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> CanResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Unvalidated addressing parameters of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddressingConfig {
    pub addressing_format: AddressingFormat,
    pub rx_physical: AiParams,
    pub tx_physical: AiParams,
    pub rx_functional: AiParams,
    pub tx_functional: AiParams,
}

// =============================================================================
// Segmenter Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// DLC of transmitted packets (8-15)
    #[serde(default = "default_dlc")]
    pub dlc: u8,
    /// Send the last packet of a message unpadded with the smallest DLC
    #[serde(default)]
    pub use_data_optimization: bool,
    /// Padding byte value
    #[serde(default = "default_filler_byte")]
    pub filler_byte: u8,
}

fn default_dlc() -> u8 {
    MIN_BASE_UDS_DLC
}

fn default_filler_byte() -> u8 {
    DEFAULT_FILLER_BYTE
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            dlc: default_dlc(),
            use_data_optimization: false,
            filler_byte: default_filler_byte(),
        }
    }
}

// =============================================================================
// Flow Control Configuration
// =============================================================================

/// Parameters a receiver hands out in its Flow Control packets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowControlConfig {
    /// Block size, 0 for unlimited
    #[serde(default)]
    pub block_size: u8,
    /// Raw STmin byte
    #[serde(default)]
    pub st_min: u8,
    /// Wait packets sent before each ContinueToSend
    #[serde(default)]
    pub wait_count: u32,
    /// Send the Wait packets again before every block, not only the first
    #[serde(default)]
    pub repeat_wait: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CanError;
    use pretty_assertions::assert_eq;

    const NODE_TOML: &str = r#"
        [addressing]
        addressing_format = "normal_fixed"
        rx_physical = { target_address = 0xF1, source_address = 0x12 }
        tx_physical = { target_address = 0x12, source_address = 0xF1 }
        rx_functional = { target_address = 0xF1, source_address = 0x33 }
        tx_functional = { target_address = 0x33, source_address = 0xF1 }
    "#;

    #[test]
    fn test_defaults_apply() {
        let config = UdsCanConfig::from_toml_str(NODE_TOML).unwrap();
        assert_eq!(config.addressing.addressing_format, AddressingFormat::NormalFixed);
        assert_eq!(config.addressing.tx_physical, AiParams::normal_fixed(0x12, 0xF1));
        assert_eq!(config.segmenter, SegmenterConfig::default());
        assert_eq!(config.segmenter.filler_byte, 0xCC);
        assert_eq!(config.flow_control, FlowControlConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let content = format!(
            "{}\n[segmenter]\ndlc = 15\n\n[flow_control]\nwait_count = 2\nrepeat_wait = true\n",
            NODE_TOML
        );
        let config = UdsCanConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.segmenter.dlc, 15);
        assert!(!config.segmenter.use_data_optimization);
        assert_eq!(config.flow_control.wait_count, 2);
        assert!(config.flow_control.repeat_wait);
        assert_eq!(config.flow_control.block_size, 0);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("uds-can.toml");
        std::fs::write(&path, NODE_TOML).unwrap();
        let config = UdsCanConfig::from_file(&path).unwrap();
        assert_eq!(config.addressing.rx_functional, AiParams::normal_fixed(0xF1, 0x33));
    }

    #[test]
    fn test_invalid_toml() {
        let result = UdsCanConfig::from_toml_str("[addressing]\naddressing_format = \"j1939\"");
        assert!(matches!(result, Err(CanError::Toml(_))));
        assert!(matches!(
            UdsCanConfig::from_file("/nonexistent/uds-can.toml"),
            Err(CanError::Io(_))
        ));
    }
}
