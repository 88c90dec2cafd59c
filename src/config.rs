//! Panel configuration.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_trackpanel::config::{PanelConfig, TimingConfig, IndicatorConfig};
//!
//! // Use defaults (the reference panel)
//! let config = PanelConfig::default();
//! assert_eq!(config.indicators.bank_capacity, 16);
//!
//! // Or customize
//! let config = PanelConfig::default()
//!     .with_timing(TimingConfig::default().with_switch_pace_ms(1000))
//!     .with_indicators(IndicatorConfig::default().with_power_led(6, 15));
//! ```

use heapless::String as HString;

use crate::table::IndicatorMap;

/// Maximum length for the display title
pub const MAX_TITLE: usize = 20;

/// Type alias for the display title
pub type TitleString = HString<MAX_TITLE>;

/// Create a TitleString from a &str, truncating if too long
pub fn title_string(s: &str) -> TitleString {
    let mut hs = TitleString::new();
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= MAX_TITLE)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete panel configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanelConfig {
    /// Indicator bank geometry and power LED
    pub indicators: IndicatorConfig,
    /// Bus pacing and operator feedback delays
    pub timing: TimingConfig,
    /// Status display
    pub display: DisplayConfig,
    /// Stored image placement
    pub storage: StorageConfig,
}

impl PanelConfig {
    /// Set indicator configuration
    pub fn with_indicators(mut self, indicators: IndicatorConfig) -> Self {
        self.indicators = indicators;
        self
    }

    /// Set timing configuration
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set display configuration
    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    /// Set storage configuration
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }
}

// ============================================================================
// Indicator Config
// ============================================================================

/// Indicator bank configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorConfig {
    /// Switches served by one bank (pins per expander)
    pub bank_capacity: u8,
    /// Banks in one switch group (thrown bank + straight bank)
    pub banks_per_switch: u8,
    /// Bank holding the track power LED
    pub power_bank: u8,
    /// Pin of the track power LED
    pub power_pin: u8,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        // Four expanders (0x20-0x23) serve 32 switches; the fifth carries
        // single LEDs such as power.
        Self {
            bank_capacity: 16,
            banks_per_switch: 2,
            power_bank: 4,
            power_pin: 0,
        }
    }
}

impl IndicatorConfig {
    /// Set the bank geometry
    pub fn with_geometry(mut self, bank_capacity: u8, banks_per_switch: u8) -> Self {
        self.bank_capacity = bank_capacity;
        self.banks_per_switch = banks_per_switch;
        self
    }

    /// Set the power LED location
    pub fn with_power_led(mut self, bank: u8, pin: u8) -> Self {
        self.power_bank = bank;
        self.power_pin = pin;
        self
    }

    /// Index-to-bank mapping for switches
    pub fn map(&self) -> IndicatorMap {
        IndicatorMap::new(self.bank_capacity, self.banks_per_switch)
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// Delays used by the synchronizer
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Pause between the two activate/release pairs of a switch change
    pub pulse_gap_ms: u32,
    /// Pause between switches while activating
    pub switch_pace_ms: u32,
    /// How long store/recall feedback stays on the display
    pub feedback_dwell_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pulse_gap_ms: 50,
            switch_pace_ms: 250,
            feedback_dwell_ms: 1000,
        }
    }
}

impl TimingConfig {
    /// Set the pulse gap
    pub fn with_pulse_gap_ms(mut self, ms: u32) -> Self {
        self.pulse_gap_ms = ms;
        self
    }

    /// Set the activation pace
    pub fn with_switch_pace_ms(mut self, ms: u32) -> Self {
        self.switch_pace_ms = ms;
        self
    }

    /// Set the feedback dwell
    pub fn with_feedback_dwell_ms(mut self, ms: u32) -> Self {
        self.feedback_dwell_ms = ms;
        self
    }
}

// ============================================================================
// Display Config
// ============================================================================

/// Status display configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayConfig {
    /// Characters per row
    pub cols: u8,
    /// Title shown on the first row
    pub title: TitleString,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            cols: 20,
            title: title_string("MR-control"),
        }
    }
}

impl DisplayConfig {
    /// Set the row width
    pub fn with_cols(mut self, cols: u8) -> Self {
        self.cols = cols;
        self
    }

    /// Set the title
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title_string(title);
        self
    }
}

// ============================================================================
// Storage Config
// ============================================================================

/// Stored image placement
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StorageConfig {
    /// Offset of the image within the storage device
    pub base_offset: usize,
}

impl StorageConfig {
    /// Set the base offset
    pub fn with_base_offset(mut self, offset: usize) -> Self {
        self.base_offset = offset;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PanelConfig::default();
        assert_eq!(config.indicators.bank_capacity, 16);
        assert_eq!(config.indicators.banks_per_switch, 2);
        assert_eq!(config.timing.pulse_gap_ms, 50);
        assert_eq!(config.display.cols, 20);
        assert_eq!(config.storage.base_offset, 0);
    }

    #[test]
    fn builder_pattern() {
        let config = PanelConfig::default()
            .with_indicators(IndicatorConfig::default().with_geometry(8, 2).with_power_led(6, 3))
            .with_timing(
                TimingConfig::default()
                    .with_pulse_gap_ms(20)
                    .with_switch_pace_ms(1000)
                    .with_feedback_dwell_ms(0),
            )
            .with_display(DisplayConfig::default().with_cols(16).with_title("Yard"))
            .with_storage(StorageConfig::default().with_base_offset(128));

        assert_eq!(config.indicators.bank_capacity, 8);
        assert_eq!(config.indicators.power_bank, 6);
        assert_eq!(config.indicators.power_pin, 3);
        assert_eq!(config.timing.pulse_gap_ms, 20);
        assert_eq!(config.timing.switch_pace_ms, 1000);
        assert_eq!(config.timing.feedback_dwell_ms, 0);
        assert_eq!(config.display.cols, 16);
        assert_eq!(config.display.title.as_str(), "Yard");
        assert_eq!(config.storage.base_offset, 128);
    }

    #[test]
    fn indicator_map_from_config() {
        let map = IndicatorConfig::default().map();
        assert_eq!(map.locate(31).bank, 2);
        assert_eq!(map.locate(31).pin, 15);
    }

    #[test]
    fn title_truncation() {
        let long_input = "a".repeat(40);
        let s = title_string(&long_input);
        assert_eq!(s.len(), MAX_TITLE);
    }

    #[test]
    fn title_utf8_boundary() {
        // 19 ASCII bytes then a 2-byte char that would cross the limit
        let input = "abcdefghijklmnopqrsé";
        let s = title_string(input);
        assert_eq!(s.as_str(), "abcdefghijklmnopqrs");
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }
}
