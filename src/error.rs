//! Error types for the panel core.
//!
//! Collaborator traits each carry their own `Error` type. The panel logs the
//! collaborator's error where it happens and reports one of the variants
//! below, so callers get a single error type without the panel being generic
//! over five of them.

use core::fmt;

/// Result type for panel operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Panel-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The indicator driver rejected a pin write.
    Indicator,
    /// The bus transport failed to send or receive.
    Bus,
    /// Storage read or write failed.
    Storage,
    /// The element list violates a table invariant.
    InvalidLayout(LayoutError),
    /// Accessory address cannot be encoded on the bus.
    AddressOutOfRange(u16),
    /// Storage cannot hold the image.
    StorageTooSmall {
        /// Bytes needed, base offset included.
        needed: usize,
        /// Bytes available.
        capacity: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Indicator => write!(f, "indicator driver error"),
            Error::Bus => write!(f, "bus transport error"),
            Error::Storage => write!(f, "storage error"),
            Error::InvalidLayout(e) => write!(f, "invalid layout: {}", e),
            Error::AddressOutOfRange(a) => write!(f, "accessory address {} out of range", a),
            Error::StorageTooSmall { needed, capacity } => {
                write!(f, "storage too small: need {} bytes, have {}", needed, capacity)
            }
        }
    }
}

impl From<LayoutError> for Error {
    fn from(e: LayoutError) -> Self {
        Error::InvalidLayout(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Reasons a list of elements cannot form a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// More elements than the table can hold.
    TooManyElements(usize),
    /// A switch appears after a non-switch element at this index.
    SwitchOutOfOrder(usize),
    /// Two switches share this non-zero address.
    DuplicateSwitchAddress(u16),
    /// Switch address cannot be encoded on the bus.
    AddressOutOfRange(u16),
    /// The switch at this index shares a pin with the power LED.
    PowerLedConflict(usize),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::TooManyElements(n) => write!(f, "{} elements exceed table capacity", n),
            LayoutError::SwitchOutOfOrder(i) => {
                write!(f, "switch at index {} follows a non-switch element", i)
            }
            LayoutError::DuplicateSwitchAddress(a) => write!(f, "duplicate switch address {}", a),
            LayoutError::AddressOutOfRange(a) => write!(f, "switch address {} out of range", a),
            LayoutError::PowerLedConflict(i) => {
                write!(f, "switch at index {} drives the power LED pin", i)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LayoutError {}

/// Reasons a stored image is rejected on recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageError {
    /// No image marker (blank or foreign storage).
    BadMagic,
    /// Image written by an unknown format version.
    UnsupportedVersion(u8),
    /// Element count differs from the running layout.
    CountMismatch {
        /// Count in the image.
        stored: usize,
        /// Count in the running table.
        expected: usize,
    },
    /// Checksum mismatch.
    Checksum,
    /// Record at this index does not decode.
    BadRecord(usize),
    /// Record at this index has a different kind than the running layout.
    KindMismatch(usize),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::BadMagic => write!(f, "no stored image"),
            ImageError::UnsupportedVersion(v) => write!(f, "unsupported image version {}", v),
            ImageError::CountMismatch { stored, expected } => {
                write!(f, "image holds {} elements, layout has {}", stored, expected)
            }
            ImageError::Checksum => write!(f, "image checksum mismatch"),
            ImageError::BadRecord(i) => write!(f, "record {} is malformed", i),
            ImageError::KindMismatch(i) => write!(f, "record {} has a different kind", i),
        }
    }
}
