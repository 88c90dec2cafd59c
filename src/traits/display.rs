//! Character display abstraction.
//!
//! This module defines the [`PanelDisplay`] trait for the panel's status
//! display, typically a 20x4 HD44780 LCD behind an I2C backpack.

/// Row/column addressed text display.
///
/// # Example
///
/// ```ignore
/// use rs_trackpanel::traits::PanelDisplay;
///
/// struct Lcd { /* ... */ }
///
/// impl PanelDisplay for Lcd {
///     type Error = ();
///
///     fn clear(&mut self) -> Result<(), ()> { Ok(()) }
///     fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), ()> {
///         // set cursor, print
///         Ok(())
///     }
/// }
/// ```
pub trait PanelDisplay {
    /// Error type for display operations.
    type Error: core::fmt::Debug;

    /// Blank the whole display.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Write `text` starting at `row`, `col`.
    ///
    /// Text past the end of the row is dropped by the implementation.
    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), Self::Error>;
}
