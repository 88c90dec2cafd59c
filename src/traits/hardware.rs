//! Hardware abstraction traits for indicators, keys, and storage.
//!
//! These are the panel's leaf collaborators. Real implementations talk to
//! I/O expanders, a scanned key matrix, and EEPROM/flash; the mocks in
//! [`crate::hal::mock`] record everything for tests.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`IndicatorDriver`] | Banked digital outputs driving panel LEDs |
//! | [`KeyInput`] | Debounced key identifiers from the button matrix |
//! | [`Storage`] | Byte-addressed non-volatile memory |
//!
//! Delays use [`embedded_hal::delay::DelayNs`] directly.
//!
//! # Example
//!
//! ```rust
//! use rs_trackpanel::traits::IndicatorDriver;
//! use rs_trackpanel::hal::MockIndicators;
//!
//! let mut leds = MockIndicators::new();
//! leds.set_pin(2, 5, true).unwrap();
//! assert_eq!(leds.pin(2, 5), Some(true));
//! ```

use core::fmt::Debug;

/// Banked digital outputs.
///
/// A bank is one expander chip (16 pins on an MCP23017). Banks are numbered
/// from zero in the order the expanders are chained.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_trackpanel::traits::IndicatorDriver;
///
/// struct ShiftRegisterLeds { /* hardware handles */ }
///
/// impl IndicatorDriver for ShiftRegisterLeds {
///     type Error = ();
///
///     fn set_pin(&mut self, bank: u8, pin: u8, on: bool) -> Result<(), ()> {
///         // Update latch and clock it out...
///         Ok(())
///     }
/// }
/// ```
pub trait IndicatorDriver {
    /// Error type for output operations.
    type Error: Debug;

    /// Drive one output high (`true`) or low.
    fn set_pin(&mut self, bank: u8, pin: u8, on: bool) -> Result<(), Self::Error>;
}

/// Source of key presses from the panel's button matrix.
///
/// Scanning and debouncing happen in the implementation; the panel only
/// sees discrete 1-based key identifiers.
pub trait KeyInput {
    /// Returns the next pressed key, or `None` without blocking.
    fn poll_key(&mut self) -> Option<u8>;
}

/// Byte-addressed non-volatile storage (EEPROM, flash page, file).
pub trait Storage {
    /// Error type for storage operations.
    type Error: Debug;

    /// Fill `buf` from `offset`.
    fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `bytes` at `offset`.
    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Total size in bytes.
    fn capacity(&self) -> usize;
}
