//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for every panel collaborator, enabling
//! development and testing on desktop without a panel or a command station.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockIndicators`] | [`IndicatorDriver`] | Pin levels and write log |
//! | [`MockKeys`] | [`KeyInput`] | Queued key presses |
//! | [`MockStorage`] | [`Storage`] | In-memory EEPROM, erased to `0xFF` |
//! | [`MockBus`] | [`BusTransport`] | Sent payloads and queued notifications |
//! | [`MockDisplay`] | [`PanelDisplay`] | Row text buffers |
//! | [`MockDelay`] | [`DelayNs`] | Records pauses instead of sleeping |
//!
//! # Example
//!
//! ```rust
//! use rs_trackpanel::hal::MockBus;
//! use rs_trackpanel::protocol::BusMessage;
//! use rs_trackpanel::traits::BusTransport;
//!
//! let mut bus = MockBus::new();
//! bus.send(&BusMessage::PowerOn.encode()).unwrap();
//! assert_eq!(bus.sent_messages(), vec![BusMessage::PowerOn]);
//! ```
//!
//! [`IndicatorDriver`]: crate::traits::IndicatorDriver
//! [`KeyInput`]: crate::traits::KeyInput
//! [`Storage`]: crate::traits::Storage
//! [`BusTransport`]: crate::traits::BusTransport
//! [`PanelDisplay`]: crate::traits::PanelDisplay
//! [`DelayNs`]: embedded_hal::delay::DelayNs

use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::protocol::{BusEvent, BusMessage};
use crate::traits::{BusTransport, IndicatorDriver, KeyInput, PanelDisplay, Storage};

// ============================================================================
// Panel Hardware Mocks
// ============================================================================

/// Mock indicator banks.
///
/// Remembers the last level of every pin and logs each write in order.
///
/// # Example
///
/// ```rust
/// use rs_trackpanel::hal::MockIndicators;
/// use rs_trackpanel::traits::IndicatorDriver;
///
/// let mut leds = MockIndicators::new();
/// leds.set_pin(0, 3, true).unwrap();
/// leds.set_pin(1, 3, false).unwrap();
///
/// assert_eq!(leds.pin(0, 3), Some(true));
/// assert_eq!(leds.pin(1, 3), Some(false));
/// assert_eq!(leds.pin(2, 3), None); // never written
/// assert_eq!(leds.writes.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockIndicators {
    levels: BTreeMap<(u8, u8), bool>,
    /// Every write as `(bank, pin, on)`.
    pub writes: Vec<(u8, u8, bool)>,
}

impl MockIndicators {
    /// Creates mock banks with every pin unwritten.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level written to `bank`/`pin`.
    pub fn pin(&self, bank: u8, pin: u8) -> Option<bool> {
        self.levels.get(&(bank, pin)).copied()
    }

    /// Forget the write log, keeping levels.
    pub fn clear_log(&mut self) {
        self.writes.clear();
    }
}

impl IndicatorDriver for MockIndicators {
    type Error = ();

    fn set_pin(&mut self, bank: u8, pin: u8, on: bool) -> Result<(), ()> {
        self.levels.insert((bank, pin), on);
        self.writes.push((bank, pin, on));
        Ok(())
    }
}

/// Mock key matrix.
///
/// Keys come out in the order they were pressed.
#[derive(Debug, Default)]
pub struct MockKeys {
    queue: VecDeque<u8>,
}

impl MockKeys {
    /// Creates a key source with nothing pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one key press.
    pub fn press(&mut self, key_id: u8) {
        self.queue.push_back(key_id);
    }

    /// Queue several key presses.
    pub fn press_all(&mut self, keys: &[u8]) {
        self.queue.extend(keys.iter().copied());
    }

    /// Presses not yet polled.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl KeyInput for MockKeys {
    fn poll_key(&mut self) -> Option<u8> {
        self.queue.pop_front()
    }
}

/// Mock EEPROM.
///
/// Starts erased (`0xFF`). Accesses past the end fail, as do reads while
/// `fail_reads` is set and writes while `fail_writes` is set.
#[derive(Debug, Clone)]
pub struct MockStorage {
    data: Vec<u8>,
    /// Reject every read.
    pub fail_reads: bool,
    /// Reject every write.
    pub fail_writes: bool,
    /// Number of successful writes.
    pub write_count: usize,
}

impl MockStorage {
    /// Creates an erased storage of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0xFF; size],
            fail_reads: false,
            fail_writes: false,
            write_count: 0,
        }
    }

    /// Raw contents.
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Invert `len` bytes from `offset`.
    pub fn corrupt(&mut self, offset: usize, len: usize) {
        let end = (offset + len).min(self.data.len());
        for byte in &mut self.data[offset.min(end)..end] {
            *byte = !*byte;
        }
    }

    /// Erase everything back to `0xFF`.
    pub fn erase(&mut self) {
        self.data.fill(0xFF);
    }
}

impl Storage for MockStorage {
    type Error = ();

    fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), ()> {
        if self.fail_reads {
            return Err(());
        }
        let src = self.data.get(offset..offset + buf.len()).ok_or(())?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        let dst = self.data.get_mut(offset..offset + bytes.len()).ok_or(())?;
        dst.copy_from_slice(bytes);
        self.write_count += 1;
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

// ============================================================================
// Bus and Display Mocks
// ============================================================================

/// Mock command station bus.
///
/// Captures every outbound payload and hands out queued notifications one
/// per poll.
///
/// # Example
///
/// ```rust
/// use rs_trackpanel::hal::MockBus;
/// use rs_trackpanel::protocol::BusEvent;
/// use rs_trackpanel::traits::BusTransport;
///
/// let mut bus = MockBus::new();
/// bus.queue_event(BusEvent::Power(false));
///
/// assert_eq!(bus.poll_receive().unwrap(), Some(BusEvent::Power(false)));
/// assert_eq!(bus.poll_receive().unwrap(), None);
/// ```
#[derive(Debug, Default)]
pub struct MockBus {
    /// Payloads passed to `send`, in order.
    pub sent: Vec<Vec<u8>>,
    /// Notifications waiting to be polled.
    pub incoming: VecDeque<BusEvent>,
    /// Reject every send.
    pub fail_sends: bool,
}

impl MockBus {
    /// Creates an idle bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one inbound notification.
    pub fn queue_event(&mut self, event: BusEvent) {
        self.incoming.push_back(event);
    }

    /// Sent payloads decoded back into messages. Undecodable payloads are
    /// left out.
    pub fn sent_messages(&self) -> Vec<BusMessage> {
        self.sent
            .iter()
            .filter_map(|payload| BusMessage::decode(payload))
            .collect()
    }

    /// Only the switch requests among [`sent_messages`](Self::sent_messages).
    pub fn sent_switch_requests(&self) -> Vec<BusMessage> {
        self.sent_messages()
            .into_iter()
            .filter(|m| m.switch_address().is_some())
            .collect()
    }

    /// Forget everything sent so far.
    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl BusTransport for MockBus {
    type Error = ();

    fn send(&mut self, payload: &[u8]) -> Result<(), ()> {
        if self.fail_sends {
            return Err(());
        }
        self.sent.push(payload.to_vec());
        Ok(())
    }

    fn poll_receive(&mut self) -> Result<Option<BusEvent>, ()> {
        Ok(self.incoming.pop_front())
    }
}

/// Mock character display.
///
/// Keeps one space-filled buffer per row. Text past the row end is dropped;
/// writes to a row that does not exist fail.
///
/// # Example
///
/// ```rust
/// use rs_trackpanel::hal::MockDisplay;
/// use rs_trackpanel::traits::PanelDisplay;
///
/// let mut lcd = MockDisplay::new(8, 2);
/// lcd.write_at(1, 2, "ABCDEFGH").unwrap();
/// assert_eq!(lcd.row(1), "  ABCDEF");
/// assert!(lcd.write_at(2, 0, "x").is_err());
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    cols: usize,
    rows: Vec<String>,
    /// Number of `clear` calls.
    pub clear_count: usize,
}

impl MockDisplay {
    /// Creates a blank `cols` x `rows` display.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows: vec![Self::blank(cols); rows],
            clear_count: 0,
        }
    }

    fn blank(cols: usize) -> String {
        " ".repeat(cols)
    }

    /// Current text of `row`, empty when out of range.
    pub fn row(&self, row: usize) -> &str {
        self.rows.get(row).map(String::as_str).unwrap_or("")
    }
}

impl PanelDisplay for MockDisplay {
    type Error = ();

    fn clear(&mut self) -> Result<(), ()> {
        let blank = Self::blank(self.cols);
        for row in &mut self.rows {
            row.clone_from(&blank);
        }
        self.clear_count += 1;
        Ok(())
    }

    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), ()> {
        let cols = self.cols;
        let line = self.rows.get_mut(usize::from(row)).ok_or(())?;
        let mut chars: Vec<char> = line.chars().collect();
        for (slot, c) in chars.iter_mut().skip(usize::from(col)).zip(text.chars()) {
            *slot = c;
        }
        chars.truncate(cols);
        *line = chars.into_iter().collect();
        Ok(())
    }
}

/// Mock delay.
///
/// Millisecond pauses are recorded in `pauses`; finer delays only add to
/// `total_ns`. Nothing actually sleeps.
///
/// # Example
///
/// ```rust
/// use embedded_hal::delay::DelayNs;
/// use rs_trackpanel::hal::MockDelay;
///
/// let mut delay = MockDelay::new();
/// delay.delay_ms(50);
/// delay.delay_us(10);
/// assert_eq!(delay.pauses, vec![50]);
/// assert_eq!(delay.total_ns, 50_010_000);
/// ```
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Every `delay_ms` argument, in order.
    pub pauses: Vec<u32>,
    /// Sum of all delays in nanoseconds.
    pub total_ns: u64,
}

impl MockDelay {
    /// Creates a delay with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all delays in whole milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.total_ns += u64::from(us) * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.pauses.push(ms);
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}
