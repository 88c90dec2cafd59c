//! The element table and index arithmetic.
//!
//! The table is the panel's single piece of mutable state. Its ordering is
//! load-bearing: switches sit at the lowest indices so that a switch's index
//! alone decides which expander pins carry its LEDs (see [`IndicatorMap`]).
//! Everything after the switch range (locomotives, functions, power) may
//! appear in any order.
//!
//! # Example
//!
//! ```rust
//! use rs_trackpanel::element::{Element, ElementKind, FunctionCode};
//! use rs_trackpanel::table::ElementTable;
//!
//! let table = ElementTable::new(&[
//!     Element::switch(1, 101),
//!     Element::switch(1, 102),
//!     Element::locomotive(344),
//!     Element::function(FunctionCode::Store),
//!     Element::power(false),
//! ])
//! .unwrap();
//!
//! assert_eq!(table.switch_count(), 2);
//! assert_eq!(table.find_by_address(ElementKind::Switch, 102), Some(1));
//! assert_eq!(table.key_to_index(3), Some(2));
//! assert_eq!(table.key_to_index(0), None);
//! ```

use heapless::Vec;

use crate::element::{Element, ElementKind, Switch};
use crate::error::LayoutError;
use crate::protocol::MAX_SWITCH_ADDRESS;

/// Maximum number of table rows (one 8x8 key matrix).
pub const MAX_ELEMENTS: usize = 64;

/// Fixed-capacity ordered registry of layout elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementTable {
    elements: Vec<Element, MAX_ELEMENTS>,
    switch_count: usize,
}

impl ElementTable {
    /// Build a table, checking the switch-first invariant.
    ///
    /// # Errors
    ///
    /// - [`LayoutError::TooManyElements`] past [`MAX_ELEMENTS`]
    /// - [`LayoutError::SwitchOutOfOrder`] when a switch follows another kind
    /// - [`LayoutError::DuplicateSwitchAddress`] for repeated non-zero addresses
    /// - [`LayoutError::AddressOutOfRange`] for switch addresses above
    ///   [`MAX_SWITCH_ADDRESS`]
    pub fn new(elements: &[Element]) -> Result<Self, LayoutError> {
        let elements: Vec<Element, MAX_ELEMENTS> = Vec::from_slice(elements)
            .map_err(|_| LayoutError::TooManyElements(elements.len()))?;

        let switch_count = elements
            .iter()
            .take_while(|e| e.kind() == ElementKind::Switch)
            .count();

        if let Some(stray) = elements[switch_count..]
            .iter()
            .position(|e| e.kind() == ElementKind::Switch)
        {
            return Err(LayoutError::SwitchOutOfOrder(switch_count + stray));
        }

        for (i, a) in elements[..switch_count].iter().enumerate() {
            let addr = a.address();
            if addr > MAX_SWITCH_ADDRESS {
                return Err(LayoutError::AddressOutOfRange(addr));
            }
            if addr != 0 && elements[i + 1..switch_count].iter().any(|b| b.address() == addr) {
                return Err(LayoutError::DuplicateSwitchAddress(addr));
            }
        }

        Ok(Self {
            elements,
            switch_count,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of switch rows (including spares). They occupy `0..switch_count`.
    pub fn switch_count(&self) -> usize {
        self.switch_count
    }

    /// Row at `index`.
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Mutable row at `index`. The caller is responsible for pushing the
    /// change out to indicators and the bus.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.elements.get_mut(index)
    }

    /// All rows in table order.
    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    /// Iterate rows in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Iterate switch rows with their indices, spares included.
    pub fn switches(&self) -> impl Iterator<Item = (usize, &Switch)> {
        self.elements[..self.switch_count]
            .iter()
            .enumerate()
            .filter_map(|(i, e)| match e {
                Element::Switch(s) => Some((i, s)),
                _ => None,
            })
    }

    /// First row of `kind` with `address`. Linear scan; tables hold tens of
    /// rows and switch/power addresses are unique.
    pub fn find_by_address(&self, kind: ElementKind, address: u16) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| e.kind() == kind && e.address() == address)
    }

    /// Index of the switch with `address`. Spare slots never match.
    pub fn find_switch(&self, address: u16) -> Option<usize> {
        if address == 0 {
            return None;
        }
        self.find_by_address(ElementKind::Switch, address)
    }

    /// Index of the power row.
    pub fn power_index(&self) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| e.kind() == ElementKind::Power)
    }

    /// Map a 1-based key identifier to a row index, `None` when out of range.
    pub fn key_to_index(&self, key_id: u8) -> Option<usize> {
        let index = usize::from(key_id).checked_sub(1)?;
        (index < self.elements.len()).then_some(index)
    }

    /// Overwrite every row. Lengths must match; the replacement must keep the
    /// kind at every index so the switch range is unchanged.
    pub(crate) fn overwrite(&mut self, rows: &[Element]) {
        debug_assert_eq!(rows.len(), self.elements.len());
        for (dst, src) in self.elements.iter_mut().zip(rows) {
            debug_assert_eq!(dst.kind(), src.kind());
            *dst = *src;
        }
    }
}

/// Expander pins carrying one switch's LED pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndicatorSlot {
    /// Bank driving the thrown LED.
    pub bank: u8,
    /// Bank driving the straight LED (always `bank + 1`).
    pub complement_bank: u8,
    /// Pin within both banks.
    pub pin: u8,
}

/// Mapping from switch index to indicator banks.
///
/// Banks come in groups: each group of `banks_per_switch` banks serves
/// `bank_capacity` consecutive switches. The first bank of a group lights
/// the thrown LEDs and the next one the straight LEDs.
///
/// ```
/// use rs_trackpanel::table::IndicatorMap;
///
/// let map = IndicatorMap::new(16, 2);
/// let slot = map.locate(17);
/// assert_eq!(slot.bank, 2);
/// assert_eq!(slot.complement_bank, 3);
/// assert_eq!(slot.pin, 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorMap {
    bank_capacity: u8,
    banks_per_switch: u8,
}

impl IndicatorMap {
    /// Create a mapping. Capacity is clamped to at least 1 and banks per
    /// switch to at least 2 (a thrown and a straight bank).
    pub const fn new(bank_capacity: u8, banks_per_switch: u8) -> Self {
        Self {
            bank_capacity: if bank_capacity == 0 { 1 } else { bank_capacity },
            banks_per_switch: if banks_per_switch < 2 { 2 } else { banks_per_switch },
        }
    }

    /// Switches served by one bank.
    pub const fn bank_capacity(&self) -> u8 {
        self.bank_capacity
    }

    /// Banks in one group.
    pub const fn banks_per_switch(&self) -> u8 {
        self.banks_per_switch
    }

    /// Banks and pin for the switch at `index`.
    ///
    /// Bank numbers saturate at `u8::MAX` for indices past the last
    /// addressable bank.
    pub const fn locate(&self, index: usize) -> IndicatorSlot {
        let cap = self.bank_capacity as usize;
        let group = index / cap;
        let bank = match group.checked_mul(self.banks_per_switch as usize) {
            Some(bank) if bank <= u8::MAX as usize => bank as u8,
            _ => u8::MAX,
        };
        IndicatorSlot {
            bank,
            complement_bank: bank.saturating_add(1),
            pin: (index % cap) as u8,
        }
    }

    /// Index of the first switch below `switch_count` whose LED pair uses
    /// `bank`/`pin`.
    pub fn conflict(&self, switch_count: usize, bank: u8, pin: u8) -> Option<usize> {
        (0..switch_count).find(|&index| {
            let slot = self.locate(index);
            slot.pin == pin && (slot.bank == bank || slot.complement_bank == bank)
        })
    }
}

impl Default for IndicatorMap {
    fn default() -> Self {
        Self::new(16, 2)
    }
}
