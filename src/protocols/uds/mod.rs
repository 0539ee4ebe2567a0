//! UDS service ids used by the gateway handshake.

// Request SIDs
pub const UDS_REQ_SESSION: u8 = 0x10;
pub const UDS_REQ_SECURITY: u8 = 0x27;
pub const UDS_REQ_ROUTINECONTROL: u8 = 0x31;
