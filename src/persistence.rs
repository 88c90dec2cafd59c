//! Stored image of the element table.
//!
//! # Image Format
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Magic: [u8; 4] = b"TPNL"                      │  Offset: 0
//! ├───────────────────────────────────────────────┤
//! │ Version: u8 = 1                               │  Offset: 4
//! │ Element count: u8                             │  Offset: 5
//! │ Reserved: [u8; 2]                             │  Offset: 6
//! ├───────────────────────────────────────────────┤
//! │ Records: [u8; 6] per element, table order     │  Offset: 8 + index * 6
//! │   kind, group, addr lo, addr hi,              │
//! │   primary, secondary                          │
//! ├───────────────────────────────────────────────┤
//! │ CRC32 (ISO-HDLC, LE) over header + records    │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Offsets are relative to the configured base offset in storage. Writes are
//! not atomic; an interrupted store is caught by the checksum on the next
//! recall.

use crc::{Crc, CRC_32_ISO_HDLC};
use heapless::Vec;

use crate::element::{Direction, Element, ElementKind, Locomotive, Power, Switch, SwitchState};
use crate::error::{Error, ImageError};
use crate::protocol::MAX_SWITCH_ADDRESS;
use crate::table::{ElementTable, MAX_ELEMENTS};
use crate::traits::Storage;

/// Image marker.
pub const IMAGE_MAGIC: [u8; 4] = *b"TPNL";

/// Image format version.
pub const IMAGE_VERSION: u8 = 1;

/// Header length in bytes.
pub const HEADER_LEN: usize = 8;

/// Bytes per element record.
pub const RECORD_SIZE: usize = 6;

/// Checksum length in bytes.
pub const CRC_LEN: usize = 4;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Bytes needed to store `count` elements.
pub const fn image_len(count: usize) -> usize {
    HEADER_LEN + count * RECORD_SIZE + CRC_LEN
}

/// Offset of record `index` within the image.
pub const fn record_offset(index: usize) -> usize {
    HEADER_LEN + index * RECORD_SIZE
}

/// Encode one element as a fixed-size record.
pub fn encode_record(element: &Element) -> [u8; RECORD_SIZE] {
    let kind = element.kind().code();
    let [lo, hi] = element.address().to_le_bytes();
    let (group, primary, secondary) = match element {
        Element::Switch(s) => (
            s.group,
            s.state.is_thrown() as u8,
            s.state.flipped().is_thrown() as u8,
        ),
        Element::Locomotive(l) => (0, l.direction.as_i8() as u8, l.speed_step),
        Element::Function { .. } => (0, 0, 0),
        Element::Power(p) => (0, p.on as u8, 0),
    };
    [kind, group, lo, hi, primary, secondary]
}

/// Decode one record. `None` for unknown kinds or out-of-range states.
pub fn decode_record(record: &[u8; RECORD_SIZE]) -> Option<Element> {
    let [kind, group, lo, hi, primary, secondary] = *record;
    let address = u16::from_le_bytes([lo, hi]);
    let element = match ElementKind::from_code(kind)? {
        ElementKind::Switch if address > MAX_SWITCH_ADDRESS => return None,
        ElementKind::Switch => Element::Switch(Switch {
            group,
            address,
            state: match primary {
                0 => SwitchState::Straight,
                1 => SwitchState::Thrown,
                _ => return None,
            },
        }),
        ElementKind::Locomotive => Element::Locomotive(Locomotive {
            address,
            direction: Direction::from_i8(primary as i8)?,
            speed_step: secondary,
        }),
        ElementKind::Function => Element::Function { code: address },
        ElementKind::Power => Element::Power(Power {
            address,
            on: match primary {
                0 => false,
                1 => true,
                _ => return None,
            },
        }),
    };
    Some(element)
}

fn header(count: usize) -> [u8; HEADER_LEN] {
    let m = IMAGE_MAGIC;
    [m[0], m[1], m[2], m[3], IMAGE_VERSION, count as u8, 0, 0]
}

/// Write the whole table at `base`.
///
/// Records go first, then the checksum, then the header, so a store cut
/// short leaves either the old header with a bad checksum or no header.
///
/// # Errors
///
/// [`Error::StorageTooSmall`] when the image does not fit, [`Error::Storage`]
/// when the medium fails.
pub fn store_table<S: Storage>(storage: &mut S, base: usize, table: &ElementTable) -> Result<(), Error> {
    let needed = base + image_len(table.len());
    if needed > storage.capacity() {
        return Err(Error::StorageTooSmall {
            needed,
            capacity: storage.capacity(),
        });
    }

    let header = header(table.len());
    let mut digest = CRC32.digest();
    digest.update(&header);

    for (index, element) in table.iter().enumerate() {
        let record = encode_record(element);
        digest.update(&record);
        write(storage, base + record_offset(index), &record)?;
    }

    let crc = digest.finalize().to_le_bytes();
    write(storage, base + record_offset(table.len()), &crc)?;
    write(storage, base, &header)
}

/// Read and validate the image at `base` against the running `layout`.
///
/// The outer `Result` carries medium failures; the inner one tells whether
/// the image is usable. On success the returned rows have the same length
/// and per-index kinds as `layout`.
pub fn load_table<S: Storage>(
    storage: &mut S,
    base: usize,
    layout: &ElementTable,
) -> Result<Result<Vec<Element, MAX_ELEMENTS>, ImageError>, Error> {
    let expected = layout.len();
    if base + HEADER_LEN > storage.capacity() {
        return Ok(Err(ImageError::BadMagic));
    }

    let mut header = [0u8; HEADER_LEN];
    read(storage, base, &mut header)?;

    if header[0..4] != IMAGE_MAGIC {
        return Ok(Err(ImageError::BadMagic));
    }
    if header[4] != IMAGE_VERSION {
        return Ok(Err(ImageError::UnsupportedVersion(header[4])));
    }
    let stored = header[5] as usize;
    if stored != expected || base + image_len(stored) > storage.capacity() {
        return Ok(Err(ImageError::CountMismatch { stored, expected }));
    }

    let mut digest = CRC32.digest();
    digest.update(&header);

    let mut rows: Vec<Element, MAX_ELEMENTS> = Vec::new();
    let mut bad: Option<ImageError> = None;
    for (index, current) in layout.iter().enumerate() {
        let mut record = [0u8; RECORD_SIZE];
        read(storage, base + record_offset(index), &mut record)?;
        digest.update(&record);

        if bad.is_some() {
            continue;
        }
        match decode_record(&record) {
            Some(element) if element.kind() == current.kind() => {
                // count was checked against layout, which fits MAX_ELEMENTS
                let _ = rows.push(element);
            }
            Some(_) => bad = Some(ImageError::KindMismatch(index)),
            None => bad = Some(ImageError::BadRecord(index)),
        }
    }

    let mut crc = [0u8; CRC_LEN];
    read(storage, base + record_offset(stored), &mut crc)?;
    if u32::from_le_bytes(crc) != digest.finalize() {
        return Ok(Err(ImageError::Checksum));
    }

    match bad {
        Some(e) => Ok(Err(e)),
        None => Ok(Ok(rows)),
    }
}

fn read<S: Storage>(storage: &mut S, offset: usize, buf: &mut [u8]) -> Result<(), Error> {
    storage.read_at(offset, buf).map_err(|e| {
        log::error!("storage read at {} failed: {:?}", offset, e);
        Error::Storage
    })
}

fn write<S: Storage>(storage: &mut S, offset: usize, bytes: &[u8]) -> Result<(), Error> {
    storage.write_at(offset, bytes).map_err(|e| {
        log::error!("storage write at {} failed: {:?}", offset, e);
        Error::Storage
    })
}
