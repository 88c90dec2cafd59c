//! Layout elements: the rows of the panel's control table.
//!
//! Every controllable thing on the layout is an [`Element`]. Each kind
//! carries only the state that makes sense for it, so a switch can never
//! hold a speed step and a function can never be "thrown".
//!
//! | Kind | State |
//! |------|-------|
//! | [`Element::Switch`] | group, accessory address, [`SwitchState`] |
//! | [`Element::Locomotive`] | decoder address, [`Direction`], speed step |
//! | [`Element::Function`] | operator command code |
//! | [`Element::Power`] | command code, on/off |
//!
//! # Example
//!
//! ```rust
//! use rs_trackpanel::element::{Element, SwitchState};
//!
//! let mut sw = Element::switch(1, 101);
//! assert_eq!(sw.address(), 101);
//!
//! if let Element::Switch(s) = &mut sw {
//!     s.state = s.state.flipped();
//!     assert_eq!(s.state, SwitchState::Thrown);
//! }
//! ```

/// Position of a turnout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SwitchState {
    /// Through route (the "closed" position on the bus).
    #[default]
    Straight,
    /// Diverging route.
    Thrown,
}

impl SwitchState {
    /// Returns the opposite position.
    #[inline]
    pub const fn flipped(self) -> Self {
        match self {
            SwitchState::Straight => SwitchState::Thrown,
            SwitchState::Thrown => SwitchState::Straight,
        }
    }

    /// True when thrown. This is the level of the primary (thrown) LED.
    #[inline]
    pub const fn is_thrown(self) -> bool {
        matches!(self, SwitchState::Thrown)
    }

    /// Upper-case label used on the display.
    ///
    /// ```
    /// use rs_trackpanel::element::SwitchState;
    ///
    /// assert_eq!(SwitchState::Straight.as_str(), "STRAIGHT");
    /// assert_eq!(SwitchState::Thrown.as_str(), "THROWN");
    /// ```
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            SwitchState::Straight => "STRAIGHT",
            SwitchState::Thrown => "THROWN",
        }
    }
}

/// Direction of a locomotive.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Moving forward.
    Forward,
    /// Moving in reverse.
    Reverse,
    /// Not moving.
    #[default]
    Stopped,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// ```
    /// use rs_trackpanel::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Reverse.as_str(), "reverse");
    /// assert_eq!(Direction::Stopped.as_str(), "stopped");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
            Direction::Stopped => "stopped",
        }
    }

    /// Three-letter label for the display field.
    #[inline]
    pub const fn short_label(&self) -> &'static str {
        match self {
            Direction::Forward => "FWD",
            Direction::Reverse => "REV",
            Direction::Stopped => "STP",
        }
    }

    /// Signed encoding used in the stored image (1, 0, -1).
    #[inline]
    pub const fn as_i8(&self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Stopped => 0,
            Direction::Reverse => -1,
        }
    }

    /// Inverse of [`as_i8`](Self::as_i8).
    ///
    /// ```
    /// use rs_trackpanel::Direction;
    ///
    /// assert_eq!(Direction::from_i8(1), Some(Direction::Forward));
    /// assert_eq!(Direction::from_i8(-1), Some(Direction::Reverse));
    /// assert_eq!(Direction::from_i8(0), Some(Direction::Stopped));
    /// assert_eq!(Direction::from_i8(2), None);
    /// ```
    pub const fn from_i8(value: i8) -> Option<Self> {
        match value {
            1 => Some(Direction::Forward),
            0 => Some(Direction::Stopped),
            -1 => Some(Direction::Reverse),
            _ => None,
        }
    }
}

/// Discriminant of an [`Element`], used for lookups and layout checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElementKind {
    /// Turnout with two indicator LEDs.
    Switch,
    /// Selectable locomotive.
    Locomotive,
    /// Operator command button.
    Function,
    /// Track power.
    Power,
}

impl ElementKind {
    /// Numeric kind code used in the stored image.
    pub const fn code(self) -> u8 {
        match self {
            ElementKind::Switch => 0,
            ElementKind::Locomotive => 1,
            ElementKind::Function => 90,
            ElementKind::Power => 99,
        }
    }

    /// Inverse of [`code`](Self::code).
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ElementKind::Switch),
            1 => Some(ElementKind::Locomotive),
            90 => Some(ElementKind::Function),
            99 => Some(ElementKind::Power),
            _ => None,
        }
    }
}

/// A turnout row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Switch {
    /// Layout module the switch belongs to. Administrative only.
    pub group: u8,
    /// 1-based accessory address. Zero marks a spare slot.
    pub address: u16,
    /// Current position.
    pub state: SwitchState,
}

impl Switch {
    /// Spare slots hold an index (and so an LED pair) but have no address.
    #[inline]
    pub const fn is_spare(&self) -> bool {
        self.address == 0
    }
}

/// A locomotive row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Locomotive {
    /// Decoder address.
    pub address: u16,
    /// Last commanded direction.
    pub direction: Direction,
    /// Speed step. Persisted but not acted on.
    pub speed_step: u8,
}

/// Track power row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Power {
    /// Command code of the power button.
    pub address: u16,
    /// Whether track power is on.
    pub on: bool,
}

/// One row of the element table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum Element {
    /// Turnout.
    Switch(Switch),
    /// Locomotive.
    Locomotive(Locomotive),
    /// Operator function with its command code.
    Function {
        /// Command code, see [`FunctionCode`].
        code: u16,
    },
    /// Track power.
    Power(Power),
}

impl Element {
    /// A switch in its straight position.
    pub const fn switch(group: u8, address: u16) -> Self {
        Element::Switch(Switch {
            group,
            address,
            state: SwitchState::Straight,
        })
    }

    /// A reserved switch slot with no address.
    pub const fn spare_switch() -> Self {
        Element::switch(0, 0)
    }

    /// A locomotive facing forward at speed step 0.
    pub const fn locomotive(address: u16) -> Self {
        Element::Locomotive(Locomotive {
            address,
            direction: Direction::Forward,
            speed_step: 0,
        })
    }

    /// An operator function button.
    pub const fn function(code: FunctionCode) -> Self {
        Element::Function { code: code.code() }
    }

    /// The track power element.
    pub const fn power(on: bool) -> Self {
        Element::Power(Power {
            address: FunctionCode::POWER,
            on,
        })
    }

    /// Kind of this row.
    pub const fn kind(&self) -> ElementKind {
        match self {
            Element::Switch(_) => ElementKind::Switch,
            Element::Locomotive(_) => ElementKind::Locomotive,
            Element::Function { .. } => ElementKind::Function,
            Element::Power(_) => ElementKind::Power,
        }
    }

    /// External address: accessory/decoder address, or command code for
    /// functions and power.
    pub const fn address(&self) -> u16 {
        match self {
            Element::Switch(s) => s.address,
            Element::Locomotive(l) => l.address,
            Element::Function { code } => *code,
            Element::Power(p) => p.address,
        }
    }
}

/// Operator command codes carried by [`Element::Function`] rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FunctionCode {
    /// Save the table to storage.
    Store,
    /// Reload the table from storage.
    Recall,
    /// Replay table state onto the layout.
    Activate,
    /// Log a dump of the whole table.
    Show,
    /// Active locomotive forward.
    Forward,
    /// Active locomotive stop.
    Stop,
    /// Active locomotive reverse.
    Reverse,
    /// Reserved.
    Lights,
    /// Reserved.
    Sound,
    /// Reserved.
    Whistle,
    /// Reserved.
    Horn,
    /// Reserved.
    TwoToneHorn,
}

impl FunctionCode {
    /// Command code of the power element.
    pub const POWER: u16 = 9999;

    /// Numeric command code.
    pub const fn code(self) -> u16 {
        match self {
            FunctionCode::Store => 9001,
            FunctionCode::Recall => 9002,
            FunctionCode::Activate => 9003,
            FunctionCode::Show => 9004,
            FunctionCode::Forward => 9101,
            FunctionCode::Stop => 9102,
            FunctionCode::Reverse => 9103,
            FunctionCode::Lights => 9104,
            FunctionCode::Sound => 9105,
            FunctionCode::Whistle => 9106,
            FunctionCode::Horn => 9107,
            FunctionCode::TwoToneHorn => 9108,
        }
    }

    /// Parse a command code.
    ///
    /// ```
    /// use rs_trackpanel::element::FunctionCode;
    ///
    /// assert_eq!(FunctionCode::from_code(9001), Some(FunctionCode::Store));
    /// assert_eq!(FunctionCode::from_code(9103), Some(FunctionCode::Reverse));
    /// assert_eq!(FunctionCode::from_code(1234), None);
    /// ```
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            9001 => Some(FunctionCode::Store),
            9002 => Some(FunctionCode::Recall),
            9003 => Some(FunctionCode::Activate),
            9004 => Some(FunctionCode::Show),
            9101 => Some(FunctionCode::Forward),
            9102 => Some(FunctionCode::Stop),
            9103 => Some(FunctionCode::Reverse),
            9104 => Some(FunctionCode::Lights),
            9105 => Some(FunctionCode::Sound),
            9106 => Some(FunctionCode::Whistle),
            9107 => Some(FunctionCode::Horn),
            9108 => Some(FunctionCode::TwoToneHorn),
            _ => None,
        }
    }

    /// Direction requested by the locomotive direction commands.
    pub const fn direction(self) -> Option<Direction> {
        match self {
            FunctionCode::Forward => Some(Direction::Forward),
            FunctionCode::Stop => Some(Direction::Stopped),
            FunctionCode::Reverse => Some(Direction::Reverse),
            _ => None,
        }
    }
}
