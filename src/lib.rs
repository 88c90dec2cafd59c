//! # rs-trackpanel
//!
//! Firmware core for a model railway control panel: a button matrix, LED
//! indicators and a status display in front of a LocoNet-style command
//! station bus.
//!
//! ## Features
//!
//! - **Element table**: switches, locomotives, functions and track power in one fixed table
//! - **Persistence**: the whole table stored as one checksummed image, recalled at boot
//! - **Synchronization**: replay switch positions and power onto the layout
//! - **Reconciliation**: changes made elsewhere on the bus are reflected on the panel
//! - **Hardware abstraction**: traits for LEDs, keys, storage, bus and display
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Collaborator abstractions
//! - `element`, `table` - Panel rows and the indexed table
//! - `protocol` - Bus messages and the switch-set sequence
//! - `persistence` - Stored image format
//! - `panel`, `sync` - The controller: dispatch, reconciliation, store/recall/activate
//! - `hal` - Concrete implementations (mocks for testing, MCP23017 for LEDs)
//!
//! ## Example
//!
//! ```rust
//! use rs_trackpanel::{Panel, PanelConfig, PanelIo, SwitchState};
//! use rs_trackpanel::hal::{MockBus, MockDelay, MockDisplay, MockIndicators, MockKeys, MockStorage};
//! use rs_trackpanel::layout::factory_table;
//! use rs_trackpanel::protocol::{BusEvent, SwitchNotice};
//!
//! let io = PanelIo {
//!     indicators: MockIndicators::new(),
//!     bus: MockBus::new(),
//!     display: MockDisplay::new(20, 4),
//!     storage: MockStorage::new(1024),
//!     delay: MockDelay::new(),
//! };
//! let mut panel = Panel::new(factory_table().unwrap(), PanelConfig::default(), io).unwrap();
//!
//! // Blank storage: factory layout, power on, every switch replayed
//! let report = panel.startup().unwrap();
//! assert!(report.power_on);
//! assert_eq!(report.switches_sent, 25);
//!
//! // Someone throws switch 501 from a handheld
//! panel.io_mut().bus.queue_event(BusEvent::SwitchReport(SwitchNotice {
//!     address: 501,
//!     output_on: true,
//!     state: SwitchState::Thrown,
//! }));
//! panel.tick(&mut MockKeys::new()).unwrap();
//! assert_eq!(panel.io().display.row(1).trim_end(), "SW 0501 THROWN");
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Panel configuration with builder methods.
pub mod config;
/// Panel rows: switches, locomotives, functions, power.
pub mod element;
/// Crate error types.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// The reference panel's factory layout.
pub mod layout;
/// Main controller: key dispatch and bus reconciliation.
pub mod panel;
/// Stored table image.
pub mod persistence;
/// Bus messages and notifications.
pub mod protocol;
/// Status display fields.
pub mod status;
/// Store, recall and activate.
pub mod sync;
/// Fixed-capacity element table and indicator mapping.
pub mod table;
/// Core traits for the panel's collaborators.
pub mod traits;

// Re-exports for convenience
pub use config::{DisplayConfig, IndicatorConfig, PanelConfig, StorageConfig, TimingConfig};
pub use element::{Direction, Element, ElementKind, FunctionCode, Locomotive, Power, Switch, SwitchState};
pub use error::{Error, ImageError, LayoutError, Result};
pub use panel::{Panel, PanelIo, PanelPhase};
pub use protocol::{BusEvent, BusMessage, Step, SwitchNotice};
pub use sync::{ActivateReport, RecallOutcome};
pub use table::{ElementTable, IndicatorMap, IndicatorSlot};
pub use traits::{BusTransport, IndicatorDriver, KeyInput, PanelDisplay, Storage};
