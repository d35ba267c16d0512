//! uds-can - ISO 15765-2 transport core for UDS over CAN
//!
//! This crate encodes and decodes the CAN packets that carry diagnostic
//! messages and splits messages into packets and back. It performs no I/O;
//! frames come from and go to whatever CAN driver the caller uses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CanSegmenter                           │
//! │  segmentation / desegmentation / Flow Control packets       │
//! │                                                             │
//! │  ┌──────────────────────┐    ┌────────────────────────────┐ │
//! │  │CanAddressingInfo     │    │ CanPacket / CanPacketRecord│ │
//! │  │ (node rx/tx params)  │    │ (encoded frames)           │ │
//! │  └──────────┬───────────┘    └─────────────┬──────────────┘ │
//! │             │                              │                │
//! │       ┌─────┴──────┐             ┌─────────┴─────────┐      │
//! │       │ addressing │             │ SF / FF / CF / FC │      │
//! │       │ (AI bytes) │             │ codecs            │      │
//! │       └─────┬──────┘             └─────────┬─────────┘      │
//! │             └──────────┬───────────────────┘                │
//! │                  ┌─────┴─────┐                              │
//! │                  │ dlc/can_id│                              │
//! │                  └───────────┘                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Receivers pick their Flow Control answers from a
//! [`FlowControlParametersGenerator`].
//!
//! # Example
//!
//! ```
//! use uds_can::{
//!     AddressingFormat, AddressingType, AiParams, CanAddressingInformation, CanPacketContainer,
//!     CanSegmenter, SegmenterConfig, UdsMessage,
//! };
//!
//! let info = CanAddressingInformation::new(
//!     AddressingFormat::Normal,
//!     &AiParams::normal(0x7E8),
//!     &AiParams::normal(0x7E0),
//!     &AiParams::normal(0x7DF),
//!     &AiParams::normal(0x7DE),
//! )?;
//! let segmenter = CanSegmenter::new(info, &SegmenterConfig::default())?;
//! let message = UdsMessage::new([0x22, 0xF1, 0x90], AddressingType::Physical)?;
//! let packets = segmenter.segmentation(&message)?;
//! assert_eq!(packets[0].raw_frame_data(), &[0x03, 0x22, 0xF1, 0x90, 0xCC, 0xCC, 0xCC, 0xCC]);
//! assert_eq!(segmenter.desegmentation(&packets)?, message);
//! # Ok::<(), uds_can::CanError>(())
//! ```

pub mod addressing;
pub mod can_id;
pub mod config;
pub mod diagnostic;
pub mod dlc;
pub mod error;
pub mod flow_parameters;
pub mod message;
pub mod packet;
pub mod segmenter;

pub use addressing::{
    AddressingFormat, AddressingParams, AddressingType, AiParams, CanAddressingInformation,
};
pub use config::{FlowControlConfig, NodeAddressingConfig, SegmenterConfig, UdsCanConfig};
pub use diagnostic::Diagnostic;
pub use error::{CanError, CanResult};
pub use flow_parameters::{
    DefaultFlowControlParametersGenerator, FlowControlParameters, FlowControlParametersGenerator,
};
pub use message::{UdsMessage, UdsMessageRecord};
pub use packet::{
    AnyCanPacket, CanFrame, CanPacket, CanPacketContainer, CanPacketRecord, CanPacketType,
    ContainerKind, FlowStatus, FrameOptions, PacketData, TransmissionDirection,
};
pub use segmenter::CanSegmenter;
