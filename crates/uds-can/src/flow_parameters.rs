//! Flow Control parameters handed out by a receiving node
//!
//! A generator is reset when a First Frame arrives and then asked for the
//! parameters of every Flow Control packet sent during that reception.

use crate::config::FlowControlConfig;
use crate::packet::FlowStatus;

/// Content of one Flow Control packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowControlParameters {
    pub flow_status: FlowStatus,
    /// Present only with ContinueToSend
    pub block_size: Option<u8>,
    /// Raw STmin byte, present only with ContinueToSend
    pub st_min: Option<u8>,
}

impl FlowControlParameters {
    pub fn continue_to_send(block_size: u8, st_min: u8) -> Self {
        Self {
            flow_status: FlowStatus::ContinueToSend,
            block_size: Some(block_size),
            st_min: Some(st_min),
        }
    }

    pub fn wait() -> Self {
        Self {
            flow_status: FlowStatus::Wait,
            block_size: None,
            st_min: None,
        }
    }
}

/// Source of Flow Control parameters for a reception
pub trait FlowControlParametersGenerator {
    /// Start a new reception
    fn reset(&mut self);

    /// Parameters of the next Flow Control packet
    fn next_parameters(&mut self) -> FlowControlParameters;
}

/// Generator that optionally delays each ContinueToSend with Wait packets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultFlowControlParametersGenerator {
    block_size: u8,
    st_min: u8,
    wait_count: u32,
    repeat_wait: bool,
    remaining_wait: Option<u32>,
}

impl DefaultFlowControlParametersGenerator {
    pub fn new(block_size: u8, st_min: u8, wait_count: u32, repeat_wait: bool) -> Self {
        let mut generator = Self {
            block_size,
            st_min,
            wait_count,
            repeat_wait,
            remaining_wait: None,
        };
        generator.reset();
        generator
    }

    pub fn from_config(config: &FlowControlConfig) -> Self {
        Self::new(
            config.block_size,
            config.st_min,
            config.wait_count,
            config.repeat_wait,
        )
    }

    pub fn block_size(&self) -> u8 {
        self.block_size
    }

    pub fn st_min(&self) -> u8 {
        self.st_min
    }

    pub fn wait_count(&self) -> u32 {
        self.wait_count
    }

    pub fn repeat_wait(&self) -> bool {
        self.repeat_wait
    }

    fn initial_wait(&self) -> Option<u32> {
        (self.wait_count > 0).then_some(self.wait_count)
    }
}

impl Default for DefaultFlowControlParametersGenerator {
    fn default() -> Self {
        Self::from_config(&FlowControlConfig::default())
    }
}

impl FlowControlParametersGenerator for DefaultFlowControlParametersGenerator {
    fn reset(&mut self) {
        self.remaining_wait = self.initial_wait();
    }

    fn next_parameters(&mut self) -> FlowControlParameters {
        match self.remaining_wait {
            Some(remaining) if remaining > 0 => {
                self.remaining_wait = Some(remaining - 1);
                FlowControlParameters::wait()
            }
            Some(_) => {
                self.remaining_wait = if self.repeat_wait {
                    self.initial_wait()
                } else {
                    None
                };
                FlowControlParameters::continue_to_send(self.block_size, self.st_min)
            }
            None => FlowControlParameters::continue_to_send(self.block_size, self.st_min),
        }
    }
}

impl Iterator for DefaultFlowControlParametersGenerator {
    type Item = FlowControlParameters;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_parameters())
    }
}
