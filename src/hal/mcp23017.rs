//! MCP23017 indicator driver.
//!
//! Each bank is one MCP23017 16-bit expander. Pins 0-7 are port A, 8-15
//! port B. Chips are addressed from `base_address` upward in bank order, so
//! the reference panel uses 0x20-0x23 for the 32 switch LED pairs and 0x24
//! for single LEDs such as track power.
//!
//! Output levels are kept in a per-chip latch so a single pin change costs
//! one register write.

use embedded_hal::i2c::I2c;

use crate::traits::IndicatorDriver;

/// Default address of the first expander (A2..A0 tied low).
pub const DEFAULT_BASE_ADDRESS: u8 = 0x20;

/// Expanders one I2C bus can address.
pub const MAX_CHIPS: usize = 8;

/// Pins per expander.
pub const PINS_PER_CHIP: u8 = 16;

/// Register addresses in the power-on `IOCON.BANK = 0` layout.
pub mod registers {
    /// Port A direction.
    pub const IODIRA: u8 = 0x00;
    /// Port B direction.
    pub const IODIRB: u8 = 0x01;
    /// Port A output latch.
    pub const OLATA: u8 = 0x14;
    /// Port B output latch.
    pub const OLATB: u8 = 0x15;
}

/// Driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mcp23017Error<E> {
    /// Bus transfer failed.
    I2c(E),
    /// Bank beyond the configured chip count.
    BankOutOfRange(u8),
    /// Pin above 15.
    PinOutOfRange(u8),
}

/// A chain of MCP23017 expanders driving panel LEDs.
pub struct Mcp23017Bank<I2C> {
    i2c: I2C,
    base_address: u8,
    chips: u8,
    latch: [u16; MAX_CHIPS],
}

impl<I2C: I2c> Mcp23017Bank<I2C> {
    /// Create a driver for `chips` expanders starting at [`DEFAULT_BASE_ADDRESS`].
    ///
    /// `chips` is clamped to [`MAX_CHIPS`]. Call [`init`](Self::init) before use.
    pub fn new(i2c: I2C, chips: u8) -> Self {
        Self {
            i2c,
            base_address: DEFAULT_BASE_ADDRESS,
            chips: chips.min(MAX_CHIPS as u8),
            latch: [0; MAX_CHIPS],
        }
    }

    /// Use a different first address.
    pub fn with_base_address(mut self, address: u8) -> Self {
        self.base_address = address;
        self
    }

    /// Make every pin an output and drive it low.
    pub fn init(&mut self) -> Result<(), Mcp23017Error<I2C::Error>> {
        for chip in 0..self.chips {
            let address = self.base_address + chip;
            for reg in [
                registers::IODIRA,
                registers::IODIRB,
                registers::OLATA,
                registers::OLATB,
            ] {
                self.write_register(address, reg, 0x00)?;
            }
            self.latch[usize::from(chip)] = 0;
        }
        log::debug!("mcp23017: {} expanders initialised", self.chips);
        Ok(())
    }

    /// Latched output levels of `bank`, bit `n` is pin `n`.
    pub fn latch(&self, bank: u8) -> Option<u16> {
        (bank < self.chips).then(|| self.latch[usize::from(bank)])
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_register(&mut self, address: u8, reg: u8, value: u8) -> Result<(), Mcp23017Error<I2C::Error>> {
        self.i2c
            .write(address, &[reg, value])
            .map_err(Mcp23017Error::I2c)
    }
}

impl<I2C: I2c> IndicatorDriver for Mcp23017Bank<I2C> {
    type Error = Mcp23017Error<I2C::Error>;

    fn set_pin(&mut self, bank: u8, pin: u8, on: bool) -> Result<(), Self::Error> {
        if bank >= self.chips {
            return Err(Mcp23017Error::BankOutOfRange(bank));
        }
        if pin >= PINS_PER_CHIP {
            return Err(Mcp23017Error::PinOutOfRange(pin));
        }

        let latch = &mut self.latch[usize::from(bank)];
        if on {
            *latch |= 1 << pin;
        } else {
            *latch &= !(1 << pin);
        }
        let [port_a, port_b] = latch.to_le_bytes();

        let address = self.base_address + bank;
        if pin < 8 {
            self.write_register(address, registers::OLATA, port_a)
        } else {
            self.write_register(address, registers::OLATB, port_b)
        }
    }
}
