//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `mcp23017`: Indicator banks on MCP23017 I2C expanders (any `embedded-hal` 1.0 bus)

pub mod mcp23017;
pub mod mock;

pub use mcp23017::{Mcp23017Bank, Mcp23017Error};
pub use mock::*;
