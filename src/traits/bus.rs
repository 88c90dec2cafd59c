//! Bus transport abstraction.
//!
//! The transport owns the serial line, framing, and checksums. The panel
//! hands it application payloads and polls it for decoded notifications.
//!
//! Notifications are only ever produced from inside
//! [`poll_receive`](BusTransport::poll_receive), on the caller's stack. An
//! implementation fed by a UART interrupt must queue raw frames there and
//! decode them during the poll, never call back into the panel from the
//! interrupt.

use crate::protocol::BusEvent;

/// Multi-drop bus transport.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_trackpanel::traits::BusTransport;
/// use rs_trackpanel::protocol::BusEvent;
///
/// struct UartBus { /* uart, rx ring buffer */ }
///
/// impl BusTransport for UartBus {
///     type Error = ();
///
///     fn send(&mut self, payload: &[u8]) -> Result<(), ()> {
///         // append checksum, wait for idle line, transmit
///         Ok(())
///     }
///
///     fn poll_receive(&mut self) -> Result<Option<BusEvent>, ()> {
///         // decode one complete frame from the ring buffer if present
///         Ok(None)
///     }
/// }
/// ```
pub trait BusTransport {
    /// Error type for bus operations.
    type Error: core::fmt::Debug;

    /// Frame and transmit one application payload.
    fn send(&mut self, payload: &[u8]) -> Result<(), Self::Error>;

    /// Return one decoded notification if available. Never blocks.
    ///
    /// Frames the panel does not care about are consumed and skipped.
    fn poll_receive(&mut self) -> Result<Option<BusEvent>, Self::Error>;
}
