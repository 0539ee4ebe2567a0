//! Single-frame ISO-TP encapsulation.
//!
//! Only single frames are supported; the gateway handshake never needs
//! flow-controlled multi-frame transfers.

use crate::error::{Error, Result};

// Frame type tags, stored in the high nibble of byte 0
pub const FT_SINGLE: u8 = 0;
pub const FT_FIRST: u8 = 1;
pub const FT_CONSECUTIVE: u8 = 2;
pub const FT_FLOW: u8 = 3;

/// A fixed-width CAN frame carrying an ISO-TP PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub data: [u8; 8],
}

impl Frame {
    pub fn new(data: [u8; 8]) -> Frame {
        Frame { data }
    }

    /// Builds a single frame from a payload of up to 7 bytes.
    /// Byte 0 is `(FT_SINGLE << 4) | payload_len`; the rest is zero-padded.
    pub fn from_single(payload: &[u8]) -> Result<Frame> {
        if payload.len() > 7 {
            return Err(Error::TooMuchData);
        }
        let mut data = [0; 8];
        data[0] = (FT_SINGLE << 4) | payload.len() as u8;
        data[1..=payload.len()].copy_from_slice(payload);
        Ok(Frame { data })
    }

    /// Returns the payload of a single frame.
    pub fn single_payload(&self) -> Result<&[u8]> {
        if self.data[0] >> 4 != FT_SINGLE {
            return Err(Error::InvalidFrame);
        }
        let len = (self.data[0] & 0x0F) as usize;
        if len > 7 {
            return Err(Error::InvalidFrame);
        }
        Ok(&self.data[1..=len])
    }
}
