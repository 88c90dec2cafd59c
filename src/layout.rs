//! Factory layout of the reference panel.
//!
//! This is the image the table starts from and falls back to when storage
//! holds nothing usable. Switches come first: their index decides which
//! expander pins carry their LEDs, so the order below must never change.
//! New switches replace spare slots rather than being inserted.

use crate::element::{Element, FunctionCode};
use crate::error::LayoutError;
use crate::table::ElementTable;

/// Key matrix rows.
pub const KEY_ROWS: usize = 8;
/// Key matrix columns.
pub const KEY_COLS: usize = 8;

/// Layout modules, named by compass bearing.
pub mod module {
    /// Not on a module (spares).
    pub const NONE: u8 = 0;
    /// North-west-west.
    pub const NWW: u8 = 1;
    /// North-west.
    pub const NW: u8 = 2;
    /// North-east.
    pub const NE: u8 = 3;
    /// North-east-east.
    pub const NEE: u8 = 4;
    /// South-west-west.
    pub const SWW: u8 = 5;
    /// South-west.
    pub const SW: u8 = 6;
    /// South-east.
    pub const SE: u8 = 7;
    /// South-east-east.
    pub const SEE: u8 = 8;
}

/// Rows of the reference layout, in table order.
pub const FACTORY_ELEMENTS: &[Element] = &[
    // Module NWW
    Element::switch(module::NWW, 101),
    Element::switch(module::NWW, 102),
    Element::switch(module::NWW, 103),
    Element::switch(module::NWW, 104),
    // Module NW
    Element::switch(module::NW, 201),
    Element::switch(module::NW, 202),
    Element::switch(module::NW, 203),
    // Module NEE
    Element::switch(module::NEE, 401),
    Element::switch(module::NEE, 402),
    Element::switch(module::NEE, 403),
    Element::switch(module::NEE, 404),
    Element::switch(module::NEE, 405),
    Element::switch(module::NEE, 406),
    Element::switch(module::NEE, 407),
    // Module SWW
    Element::switch(module::SWW, 501),
    Element::switch(module::SWW, 502),
    // Module SW
    Element::switch(module::SW, 601),
    Element::switch(module::SW, 602),
    Element::switch(module::SW, 603),
    // Module SE
    Element::switch(module::SE, 701),
    // Module SEE
    Element::switch(module::SEE, 801),
    Element::switch(module::SEE, 802),
    Element::switch(module::SEE, 803),
    Element::switch(module::SEE, 804),
    Element::switch(module::SEE, 805),
    // Spares, filling the second expander pair to 32
    Element::spare_switch(),
    Element::spare_switch(),
    Element::spare_switch(),
    Element::spare_switch(),
    Element::spare_switch(),
    Element::spare_switch(),
    Element::spare_switch(),
    // Locomotives
    Element::locomotive(344),
    Element::locomotive(386),
    Element::locomotive(611),
    Element::locomotive(612),
    Element::locomotive(2412),
    // Panel functions
    Element::function(FunctionCode::Store),
    Element::function(FunctionCode::Recall),
    Element::function(FunctionCode::Activate),
    Element::function(FunctionCode::Show),
    // Locomotive functions
    Element::function(FunctionCode::Forward),
    Element::function(FunctionCode::Stop),
    Element::function(FunctionCode::Reverse),
    Element::function(FunctionCode::Lights),
    Element::function(FunctionCode::Sound),
    Element::function(FunctionCode::Whistle),
    Element::function(FunctionCode::Horn),
    Element::function(FunctionCode::TwoToneHorn),
    // Track power
    Element::power(true),
];

/// Build the factory table.
///
/// ```
/// use rs_trackpanel::layout::factory_table;
///
/// let table = factory_table().unwrap();
/// assert_eq!(table.switch_count(), 32);
/// ```
pub fn factory_table() -> Result<ElementTable, LayoutError> {
    ElementTable::new(FACTORY_ELEMENTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    #[test]
    fn factory_layout_is_valid() {
        assert!(ElementTable::new(FACTORY_ELEMENTS).is_ok());
    }

    #[test]
    fn factory_layout_shape() {
        let table = factory_table().unwrap();
        assert_eq!(table.len(), 50);
        assert_eq!(table.switch_count(), 32);
        assert_eq!(table.switches().filter(|(_, s)| s.is_spare()).count(), 7);
        assert!(table.len() <= KEY_ROWS * KEY_COLS);
    }

    #[test]
    fn every_key_maps_to_a_row_or_nothing() {
        let table = factory_table().unwrap();
        for key in 1..=(KEY_ROWS * KEY_COLS) as u8 {
            match table.key_to_index(key) {
                Some(index) => assert!(index < table.len()),
                None => assert!(usize::from(key) > table.len()),
            }
        }
    }

    #[test]
    fn power_is_last_and_on() {
        let table = factory_table().unwrap();
        let index = table.power_index().unwrap();
        assert_eq!(index, table.len() - 1);
        assert_eq!(table.get(index).unwrap().kind(), ElementKind::Power);
    }
}
