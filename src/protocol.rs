//! Bus messages exchanged with the command station.
//!
//! The transport underneath handles framing and checksums; this module only
//! deals with application payloads.
//!
//! # Outbound
//!
//! | Message | Bytes | Encoding |
//! |---------|-------|----------|
//! | Switch request | 3 | `[0xB0][addr & 0x7F][dir<<5 \| on<<4 \| (addr>>7) & 0xF]` |
//! | Power on | 1 | `[0x83]` |
//! | Power off | 1 | `[0x82]` |
//!
//! `addr` on the wire is zero-based: the panel stores the 1-based accessory
//! address an operator sees and subtracts one when encoding.
//!
//! # Retransmission
//!
//! The bus has been seen to drop messages without any error. Every switch
//! change is therefore sent as two activate/release pairs with a short pause
//! between them, see [`switch_sequence`].
//!
//! # Example
//!
//! ```rust
//! use rs_trackpanel::element::SwitchState;
//! use rs_trackpanel::protocol::BusMessage;
//!
//! let msg = BusMessage::switch_request(101, SwitchState::Straight, true).unwrap();
//! assert_eq!(msg.encode().as_slice(), &[0xB0, 100, 0x30]);
//! ```

use heapless::Vec;

use crate::element::SwitchState;
use crate::error::Error;

/// Switch request opcode.
pub const OPC_SW_REQ: u8 = 0xB0;
/// Global power on opcode.
pub const OPC_GPON: u8 = 0x83;
/// Global power off opcode.
pub const OPC_GPOFF: u8 = 0x82;

/// Longest application payload the panel sends.
pub const MAX_MESSAGE_LEN: usize = 3;

/// Highest 1-based accessory address that fits the 11-bit wire field.
pub const MAX_SWITCH_ADDRESS: u16 = 2048;

/// An outbound application message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusMessage {
    /// Drive a turnout output.
    SwitchRequest {
        /// Zero-based wire address.
        wire_address: u16,
        /// Requested position.
        state: SwitchState,
        /// Activation (`true`) or release (`false`) of the output.
        on: bool,
    },
    /// Switch track power on.
    PowerOn,
    /// Switch track power off.
    PowerOff,
}

impl BusMessage {
    /// Build a switch request from a 1-based accessory address.
    ///
    /// # Errors
    ///
    /// [`Error::AddressOutOfRange`] for address 0 (spare slot) or above
    /// [`MAX_SWITCH_ADDRESS`].
    pub fn switch_request(address: u16, state: SwitchState, on: bool) -> Result<Self, Error> {
        if address == 0 || address > MAX_SWITCH_ADDRESS {
            return Err(Error::AddressOutOfRange(address));
        }
        Ok(BusMessage::SwitchRequest {
            wire_address: address - 1,
            state,
            on,
        })
    }

    /// Power on or off.
    pub const fn power(on: bool) -> Self {
        if on {
            BusMessage::PowerOn
        } else {
            BusMessage::PowerOff
        }
    }

    /// Encode to application payload bytes.
    pub fn encode(&self) -> Vec<u8, MAX_MESSAGE_LEN> {
        let mut out = Vec::new();
        match *self {
            BusMessage::SwitchRequest {
                wire_address,
                state,
                on,
            } => {
                let mut status = ((wire_address >> 7) & 0x0F) as u8;
                if state == SwitchState::Straight {
                    status |= 1 << 5;
                }
                if on {
                    status |= 1 << 4;
                }
                // capacity is MAX_MESSAGE_LEN, three pushes always fit
                let _ = out.push(OPC_SW_REQ);
                let _ = out.push((wire_address & 0x7F) as u8);
                let _ = out.push(status);
            }
            BusMessage::PowerOn => {
                let _ = out.push(OPC_GPON);
            }
            BusMessage::PowerOff => {
                let _ = out.push(OPC_GPOFF);
            }
        }
        out
    }

    /// Decode an application payload produced by [`encode`](Self::encode).
    ///
    /// Used by loopback transports and for diagnostics. Returns `None` for
    /// unknown opcodes or short payloads.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [OPC_GPON, ..] => Some(BusMessage::PowerOn),
            [OPC_GPOFF, ..] => Some(BusMessage::PowerOff),
            [OPC_SW_REQ, low, status, ..] => {
                let wire_address = u16::from(low & 0x7F) | (u16::from(status & 0x0F) << 7);
                let state = if status & (1 << 5) != 0 {
                    SwitchState::Straight
                } else {
                    SwitchState::Thrown
                };
                Some(BusMessage::SwitchRequest {
                    wire_address,
                    state,
                    on: status & (1 << 4) != 0,
                })
            }
            _ => None,
        }
    }

    /// 1-based accessory address of a switch request.
    pub const fn switch_address(&self) -> Option<u16> {
        match self {
            BusMessage::SwitchRequest { wire_address, .. } => Some(*wire_address + 1),
            _ => None,
        }
    }
}

/// A switch notification decoded by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwitchNotice {
    /// 1-based accessory address.
    pub address: u16,
    /// Whether the output is being activated.
    pub output_on: bool,
    /// Reported position.
    pub state: SwitchState,
}

/// Inbound notification delivered by the transport on poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusEvent {
    /// Some device (possibly this panel) requested a switch change.
    SwitchRequest(SwitchNotice),
    /// A switch output reported its state.
    SwitchReport(SwitchNotice),
    /// Command station answered a switch state query.
    SwitchState(SwitchNotice),
    /// Global power changed.
    Power(bool),
}

impl BusEvent {
    /// The switch notice, for the three switch notification kinds.
    pub const fn switch_notice(&self) -> Option<&SwitchNotice> {
        match self {
            BusEvent::SwitchRequest(n) | BusEvent::SwitchReport(n) | BusEvent::SwitchState(n) => {
                Some(n)
            }
            BusEvent::Power(_) => None,
        }
    }
}

/// One step of an outbound sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Send a message.
    Send(BusMessage),
    /// Wait this many milliseconds.
    Pause(u32),
}

/// The switch-set sequence: activate, release, pause, activate, release.
///
/// The second pair repeats the first; the bus is known to drop messages
/// without notice.
///
/// ```
/// use rs_trackpanel::element::SwitchState;
/// use rs_trackpanel::protocol::{switch_sequence, Step};
///
/// let steps = switch_sequence(501, SwitchState::Thrown, 50).unwrap();
/// let sends = steps.iter().filter(|s| matches!(s, Step::Send(_))).count();
/// assert_eq!(sends, 4);
/// assert_eq!(steps[2], Step::Pause(50));
/// ```
///
/// # Errors
///
/// [`Error::AddressOutOfRange`] as for [`BusMessage::switch_request`].
pub fn switch_sequence(address: u16, state: SwitchState, pulse_gap_ms: u32) -> Result<[Step; 5], Error> {
    let activate = Step::Send(BusMessage::switch_request(address, state, true)?);
    let release = Step::Send(BusMessage::switch_request(address, state, false)?);
    Ok([activate, release, Step::Pause(pulse_gap_ms), activate, release])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_encoding_address_101() {
        let msg = BusMessage::switch_request(101, SwitchState::Straight, true).unwrap();
        let bytes = msg.encode();
        assert_eq!(bytes[0], OPC_SW_REQ);
        assert_eq!(bytes[1], 100);
        // direction bit, on bit, high nibble 0
        assert_eq!(bytes[2], 0b0011_0000);
    }

    #[test]
    fn thrown_release_clears_both_bits() {
        let msg = BusMessage::switch_request(101, SwitchState::Thrown, false).unwrap();
        assert_eq!(msg.encode().as_slice(), &[OPC_SW_REQ, 100, 0x00]);
    }

    #[test]
    fn high_address_bits() {
        // 501 -> wire 500 = 0b11_1110100: low 0x74, high nibble 3
        let msg = BusMessage::switch_request(501, SwitchState::Thrown, true).unwrap();
        assert_eq!(msg.encode().as_slice(), &[OPC_SW_REQ, 0x74, 0x13]);

        let top = BusMessage::switch_request(MAX_SWITCH_ADDRESS, SwitchState::Straight, false)
            .unwrap();
        assert_eq!(top.encode().as_slice(), &[OPC_SW_REQ, 0x7F, 0x2F]);
    }

    #[test]
    fn address_bounds() {
        assert_eq!(
            BusMessage::switch_request(0, SwitchState::Straight, true),
            Err(Error::AddressOutOfRange(0))
        );
        assert_eq!(
            BusMessage::switch_request(2049, SwitchState::Straight, true),
            Err(Error::AddressOutOfRange(2049))
        );
    }

    #[test]
    fn power_messages() {
        assert_eq!(BusMessage::power(true).encode().as_slice(), &[OPC_GPON]);
        assert_eq!(BusMessage::power(false).encode().as_slice(), &[OPC_GPOFF]);
    }

    #[test]
    fn decode_recovers_switch_request() {
        let msg = BusMessage::switch_request(1234, SwitchState::Thrown, true).unwrap();
        let decoded = BusMessage::decode(&msg.encode()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.switch_address(), Some(1234));
    }

    #[test]
    fn decode_rejects_unknown() {
        assert_eq!(BusMessage::decode(&[]), None);
        assert_eq!(BusMessage::decode(&[0xE7, 1, 2]), None);
        assert_eq!(BusMessage::decode(&[OPC_SW_REQ, 1]), None);
    }

    #[test]
    fn sequence_shape() {
        let steps = switch_sequence(101, SwitchState::Straight, 40).unwrap();
        let on = BusMessage::switch_request(101, SwitchState::Straight, true).unwrap();
        let off = BusMessage::switch_request(101, SwitchState::Straight, false).unwrap();
        assert_eq!(
            steps,
            [
                Step::Send(on),
                Step::Send(off),
                Step::Pause(40),
                Step::Send(on),
                Step::Send(off)
            ]
        );
    }

    #[test]
    fn sequence_rejects_spare() {
        assert!(switch_sequence(0, SwitchState::Straight, 40).is_err());
    }

    #[test]
    fn switch_notice_accessor() {
        let notice = SwitchNotice {
            address: 101,
            output_on: true,
            state: SwitchState::Thrown,
        };
        assert_eq!(BusEvent::SwitchReport(notice).switch_notice(), Some(&notice));
        assert_eq!(BusEvent::Power(true).switch_notice(), None);
    }
}
