//! CAN addressing information
//!
//! Encodes and decodes the Target Address (TA), Source Address (SA),
//! Address Extension (AE) and addressing type carried by the CAN ID and
//! the optional first data byte of every packet.

mod format;
mod node;
mod params;

pub use format::{AddressingFormat, AddressingType};
pub use node::CanAddressingInformation;
pub(crate) use params::frame_ai_byte;
pub use params::{
    decode_frame_ai_params, encode_ai_data_bytes, get_ai_data_bytes_number,
    validate_addressing_params, AddressingParams, AiParams, DecodedAiParams,
};
