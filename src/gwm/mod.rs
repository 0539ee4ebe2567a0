//! Gateway module (GWM) unlock handshake.
//!
//! The gateway gates diagnostic access behind a fixed sequence: open the
//! extended diagnostic session, answer two seed/key challenges, then close
//! two routine control sub-sessions. The driver keeps no state of its own;
//! the gateway's responses are enough to identify the current step, so each
//! response is mapped to the next request by content alone.

pub mod seedkey;

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, error, info};

use crate::definition::GatewayDefinition;
use crate::protocols::can::{CanInterface, Message};
use crate::protocols::isotp::Frame;
use crate::protocols::uds::{UDS_REQ_ROUTINECONTROL, UDS_REQ_SECURITY, UDS_REQ_SESSION};

/// Arbitration id the MG gateway module listens on.
pub const GWM_ID: u32 = 0x710;

/// Result of feeding one diagnostic response to the authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The next request of the sequence was transmitted.
    Sent(Message),
    /// A step was recognized but its frame could not be written. The write
    /// is not retried; the caller may restart with `start_authentication`.
    NoAction,
    /// The gateway acknowledged the final routine control; nothing to send.
    Complete,
    /// The response matches no step of the sequence. Unrelated traffic
    /// shares the bus, so this is not an error.
    Unrecognized,
}

/// Next step computed from a response, before any I/O happens.
enum Step {
    Request(Frame),
    Complete,
    Unknown,
}

fn request(payload: &[u8]) -> Step {
    match Frame::from_single(payload) {
        Ok(frame) => Step::Request(frame),
        Err(_) => Step::Unknown,
    }
}

fn read_seed(data: &[u8]) -> Option<u32> {
    if data.len() < 6 {
        return None;
    }
    Some(BigEndian::read_u32(&data[2..6]))
}

/// The full protocol, keyed on the response's service id and echoed
/// sub-function byte. `data` is the raw single-frame payload: ISO-TP header
/// in byte 0, sub-function in byte 1, seed bytes in 2..6 where present.
fn next_request(service_id: u8, data: &[u8]) -> Step {
    if data.len() < 2 {
        return Step::Unknown;
    }
    match (service_id, data[1]) {
        (UDS_REQ_SESSION, 0x01) => {
            // Default session opened, request the extended session
            debug!("gwm auth: sending 1003");
            request(&[UDS_REQ_SESSION, 0x03])
        }
        (UDS_REQ_SESSION, 0x03) => {
            debug!("gwm auth: requesting seed1");
            request(&[UDS_REQ_SECURITY, 0x41, 0x3e, 0xab, 0x00, 0x0d])
        }
        (UDS_REQ_SECURITY, 0x41) => match read_seed(data) {
            Some(seed) => {
                let key = seedkey::level1(seed);
                debug!("gwm auth: seed1 received {:08x}, replying with key1 {:08x}", seed, key);
                let mut payload = [UDS_REQ_SECURITY, 0x42, 0, 0, 0, 0];
                BigEndian::write_u32(&mut payload[2..], key);
                request(&payload)
            }
            None => Step::Unknown,
        },
        (UDS_REQ_SECURITY, 0x42) => {
            debug!("gwm auth: key1 accepted, requesting seed2");
            request(&[UDS_REQ_SECURITY, 0x01])
        }
        (UDS_REQ_SECURITY, 0x01) => match read_seed(data) {
            Some(seed) => {
                let key = seedkey::level2(seed);
                debug!("gwm auth: seed2 received {:08x}, replying with key2 {:08x}", seed, key);
                let mut payload = [UDS_REQ_SECURITY, 0x02, 0, 0, 0, 0];
                BigEndian::write_u32(&mut payload[2..], key);
                request(&payload)
            }
            None => Step::Unknown,
        },
        (UDS_REQ_SECURITY, 0x02) => {
            debug!("gwm auth: key2 accepted, ending session 1");
            request(&[UDS_REQ_ROUTINECONTROL, 0x01, 0xaa, 0xff, 0x00])
        }
        (UDS_REQ_ROUTINECONTROL, 0x01) => {
            debug!("gwm auth: session 1 ended, ending session 3");
            request(&[UDS_REQ_ROUTINECONTROL, 0x03, 0xaa, 0xff])
        }
        (UDS_REQ_ROUTINECONTROL, 0x03) => Step::Complete,
        _ => Step::Unknown,
    }
}

/// Drives the unlock handshake against one gateway.
///
/// The authenticator is stateless; it holds nothing but the gateway's
/// arbitration id, so it is safe to reuse across handshakes and buses.
pub struct GwmAuthenticator {
    gwm_id: u32,
}

impl Default for GwmAuthenticator {
    fn default() -> GwmAuthenticator {
        GwmAuthenticator { gwm_id: GWM_ID }
    }
}

impl GwmAuthenticator {
    pub fn new(gwm_id: u32) -> GwmAuthenticator {
        GwmAuthenticator { gwm_id }
    }

    pub fn from_definition(definition: &GatewayDefinition) -> GwmAuthenticator {
        GwmAuthenticator::new(definition.gwm_id)
    }

    /// Kicks off the handshake by opening the default diagnostic session.
    /// Returns whether the frame was written; a failed write is logged and
    /// not retried.
    pub fn start_authentication(&self, can: &dyn CanInterface) -> bool {
        info!("starting gateway authentication");
        let frame = match Frame::from_single(&[UDS_REQ_SESSION, 0x01]) {
            Ok(frame) => frame,
            Err(_) => return false,
        };
        match can.send(self.gwm_id, &frame.data) {
            Ok(()) => true,
            Err(err) => {
                error!("error writing authentication frame: {}", err);
                false
            }
        }
    }

    /// Feeds one diagnostic response into the handshake and transmits the
    /// next request, if any.
    ///
    /// `service_id` is the request SID the response echoes; `data` is the
    /// raw single-frame payload with the sub-function in byte 1.
    ///
    /// Every call is handled independently. There is no memory of earlier
    /// steps, so a repeated or stray response is answered (or ignored) the
    /// same way whether or not the handshake already completed.
    pub fn on_response(&self, can: &dyn CanInterface, service_id: u8, data: &[u8]) -> AuthOutcome {
        match next_request(service_id, data) {
            Step::Request(frame) => {
                let msg = Message {
                    id: self.gwm_id,
                    data: frame.data.to_vec(),
                };
                if let Err(err) = can.send_msg(&msg) {
                    error!("error writing authentication frame: {}", err);
                    return AuthOutcome::NoAction;
                }
                AuthOutcome::Sent(msg)
            }
            Step::Complete => {
                info!("gateway authentication complete");
                AuthOutcome::Complete
            }
            Step::Unknown => AuthOutcome::Unrecognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_for(service_id: u8, data: &[u8]) -> Option<[u8; 8]> {
        match next_request(service_id, data) {
            Step::Request(frame) => Some(frame.data),
            _ => None,
        }
    }

    #[test]
    fn session_responses_advance_the_session() {
        assert_eq!(
            frame_for(UDS_REQ_SESSION, &[0x02, 0x01]),
            Some([0x02, 0x10, 0x03, 0, 0, 0, 0, 0])
        );
        assert_eq!(
            frame_for(UDS_REQ_SESSION, &[0x02, 0x03]),
            Some([0x06, 0x27, 0x41, 0x3e, 0xab, 0x00, 0x0d, 0])
        );
    }

    #[test]
    fn seed_responses_produce_big_endian_keys() {
        let key1 = seedkey::level1(0x1234_5678);
        assert_eq!(
            frame_for(UDS_REQ_SECURITY, &[0x06, 0x41, 0x12, 0x34, 0x56, 0x78]),
            Some([
                0x06,
                0x27,
                0x42,
                (key1 >> 24) as u8,
                (key1 >> 16) as u8,
                (key1 >> 8) as u8,
                key1 as u8,
                0,
            ])
        );

        let key2 = seedkey::level2(0x9abc_def0);
        assert_eq!(
            frame_for(UDS_REQ_SECURITY, &[0x06, 0x01, 0x9a, 0xbc, 0xde, 0xf0]),
            Some([
                0x06,
                0x27,
                0x02,
                (key2 >> 24) as u8,
                (key2 >> 16) as u8,
                (key2 >> 8) as u8,
                key2 as u8,
                0,
            ])
        );
    }

    #[test]
    fn key_acknowledgements_advance_the_handshake() {
        assert_eq!(
            frame_for(UDS_REQ_SECURITY, &[0x02, 0x42]),
            Some([0x02, 0x27, 0x01, 0, 0, 0, 0, 0])
        );
        assert_eq!(
            frame_for(UDS_REQ_SECURITY, &[0x02, 0x02]),
            Some([0x05, 0x31, 0x01, 0xaa, 0xff, 0x00, 0, 0])
        );
        assert_eq!(
            frame_for(UDS_REQ_ROUTINECONTROL, &[0x02, 0x01]),
            Some([0x04, 0x31, 0x03, 0xaa, 0xff, 0, 0, 0])
        );
    }

    #[test]
    fn final_routine_ack_completes_without_a_frame() {
        assert!(matches!(
            next_request(UDS_REQ_ROUTINECONTROL, &[0x02, 0x03]),
            Step::Complete
        ));
    }

    #[test]
    fn table_is_total_over_unknown_pairs() {
        let known: &[(u8, u8)] = &[
            (UDS_REQ_SESSION, 0x01),
            (UDS_REQ_SESSION, 0x03),
            (UDS_REQ_SECURITY, 0x41),
            (UDS_REQ_SECURITY, 0x42),
            (UDS_REQ_SECURITY, 0x01),
            (UDS_REQ_SECURITY, 0x02),
            (UDS_REQ_ROUTINECONTROL, 0x01),
            (UDS_REQ_ROUTINECONTROL, 0x03),
        ];
        for service_id in 0..=0xff_u8 {
            for sub in 0..=0xff_u8 {
                if known.contains(&(service_id, sub)) {
                    continue;
                }
                // Long enough to carry a seed so every row could match
                let data = [0x06, sub, 0x11, 0x22, 0x33, 0x44];
                assert!(
                    matches!(next_request(service_id, &data), Step::Unknown),
                    "({:#04x}, {:#04x}) should be unrecognized",
                    service_id,
                    sub
                );
            }
        }
    }

    #[test]
    fn short_payloads_are_unrecognized() {
        assert!(matches!(next_request(UDS_REQ_SESSION, &[]), Step::Unknown));
        assert!(matches!(
            next_request(UDS_REQ_SESSION, &[0x02]),
            Step::Unknown
        ));
        // Seed rows need 6 bytes
        assert!(matches!(
            next_request(UDS_REQ_SECURITY, &[0x06, 0x41, 0x12]),
            Step::Unknown
        ));
        assert!(matches!(
            next_request(UDS_REQ_SECURITY, &[0x06, 0x01, 0x9a, 0xbc, 0xde]),
            Step::Unknown
        ));
    }
}
