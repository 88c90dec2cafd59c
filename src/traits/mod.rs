//! Trait definitions for the panel's external collaborators.
//!
//! This module defines the abstractions that let the panel core:
//! - Run on different hardware (AVR/ESP32 boards, desktop simulator)
//! - Be tested end to end with recording mocks
//!
//! # Submodules
//!
//! - `hardware`: Indicator outputs, key input, non-volatile storage
//! - `bus`: Command station bus transport
//! - `display`: Character status display
//!
//! # Collaborators
//!
//! - [`IndicatorDriver`]: LED banks on I/O expanders
//! - [`KeyInput`]: Button matrix key identifiers
//! - [`Storage`]: EEPROM-style byte storage
//! - [`BusTransport`]: Send payloads, poll decoded notifications
//! - [`PanelDisplay`]: Row/column text output

pub mod bus;
pub mod display;
pub mod hardware;

pub use bus::*;
pub use display::*;
pub use hardware::*;
