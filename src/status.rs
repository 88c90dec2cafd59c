//! Fixed status fields on the character display.
//!
//! ```text
//!   col 0          col 12
//! ┌────────────────────┐
//! │MR-control  PWR ON  │  row 0: title, power
//! │SW 0501 THROWN      │  row 1: last switch change
//! │LOC 0344 FWD        │  row 2: active locomotive
//! │Stored              │  row 3: feedback message
//! └────────────────────┘
//! ```
//!
//! Every field is padded to its full width so shorter text overwrites
//! longer stale text.

use core::fmt::{self, Write};

use heapless::String;

use crate::element::{Direction, SwitchState};

/// Widest supported display row.
pub const MAX_COLS: usize = 40;

/// One formatted field.
pub type Field = String<MAX_COLS>;

/// Row of the title and power fields.
pub const ROW_TITLE: u8 = 0;
/// Column where the power field starts.
pub const COL_POWER: u8 = 12;
/// Row of the switch field.
pub const ROW_SWITCH: u8 = 1;
/// Row of the locomotive field.
pub const ROW_LOCO: u8 = 2;
/// Row of the feedback message.
pub const ROW_MESSAGE: u8 = 3;

/// Format `args` and pad with spaces to `width`. Overflow is cut off.
pub fn field(width: usize, args: fmt::Arguments<'_>) -> Field {
    let width = width.min(MAX_COLS);
    let mut out = Field::new();
    let _ = out.write_fmt(args);
    while out.len() > width {
        out.pop();
    }
    while out.len() < width {
        let _ = out.push(' ');
    }
    out
}

/// Title field, row 0 up to the power field.
pub fn title(text: &str) -> Field {
    field(COL_POWER as usize, format_args!("{}", text))
}

/// Power field.
///
/// ```
/// use rs_trackpanel::status::power;
///
/// assert_eq!(power(20, true).as_str(), "PWR ON  ");
/// assert_eq!(power(20, false).as_str(), "PWR OFF ");
/// ```
pub fn power(cols: u8, on: bool) -> Field {
    let width = usize::from(cols).saturating_sub(COL_POWER as usize);
    field(width, format_args!("PWR {}", if on { "ON" } else { "OFF" }))
}

/// Switch field.
///
/// ```
/// use rs_trackpanel::element::SwitchState;
/// use rs_trackpanel::status::switch;
///
/// assert_eq!(switch(20, 501, SwitchState::Thrown).as_str(), "SW 0501 THROWN      ");
/// ```
pub fn switch(cols: u8, address: u16, state: SwitchState) -> Field {
    field(
        cols.into(),
        format_args!("SW {:04} {}", address, state.as_str()),
    )
}

/// Locomotive field; `None` when no locomotive is selected.
pub fn locomotive(cols: u8, selected: Option<(u16, Direction)>) -> Field {
    match selected {
        Some((address, dir)) => field(
            cols.into(),
            format_args!("LOC {:04} {}", address, dir.short_label()),
        ),
        None => field(cols.into(), format_args!("LOC ----")),
    }
}

/// Feedback message field.
pub fn message(cols: u8, text: &str) -> Field {
    field(cols.into(), format_args!("{}", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_pads_and_truncates() {
        assert_eq!(field(6, format_args!("ab")).as_str(), "ab    ");
        assert_eq!(field(3, format_args!("abcdef")).as_str(), "abc");
        assert_eq!(field(0, format_args!("abc")).as_str(), "");
    }

    #[test]
    fn title_stops_before_power() {
        assert_eq!(title("MR-control").len(), COL_POWER as usize);
        assert_eq!(title("A very long panel title").as_str(), "A very long ");
    }

    #[test]
    fn locomotive_fields() {
        assert_eq!(
            locomotive(20, Some((344, Direction::Forward))).as_str(),
            "LOC 0344 FWD        "
        );
        assert_eq!(
            locomotive(16, Some((2412, Direction::Reverse))).as_str(),
            "LOC 2412 REV    "
        );
        assert_eq!(locomotive(20, None).as_str(), "LOC ----            ");
    }

    #[test]
    fn switch_field_straight() {
        assert_eq!(
            switch(20, 101, SwitchState::Straight).as_str(),
            "SW 0101 STRAIGHT    "
        );
    }

    #[test]
    fn message_field() {
        assert_eq!(message(10, "Stored").as_str(), "Stored    ");
    }
}
