//! Desktop panel simulator.
//!
//! Runs the panel core against stand-ins for the real hardware:
//! - Keys are typed on stdin as 1-based key numbers, one per line
//! - The bus is a loopback that echoes every activation back as a notification
//! - The stored image lives in a file
//! - The display is redrawn on the terminal
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --features sim --bin panel_sim -- panel.img
//! ```
//!
//! Type `show` to dump the table, `q` to quit. Set `PANEL_SIM_FAST=1` to skip
//! bus pacing and feedback delays.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use embedded_hal::delay::DelayNs;
use rs_trackpanel::layout::{self, factory_table};
use rs_trackpanel::persistence::image_len;
use rs_trackpanel::traits::{BusTransport, IndicatorDriver, KeyInput, PanelDisplay, Storage};
use rs_trackpanel::{BusEvent, BusMessage, Element, FunctionCode, Panel, PanelConfig, PanelIo, SwitchNotice};

/// Main loop interval in milliseconds
const LOOP_INTERVAL_MS: u64 = 10;

/// Size of the simulated EEPROM
const STORAGE_SIZE: usize = 1024;

// ============================================================================
// Keys
// ============================================================================

struct StdinKeys {
    rx: Receiver<u8>,
}

impl StdinKeys {
    fn spawn(quit: Arc<AtomicBool>, show_key: Option<u8>) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                let line = line.trim();
                if line == "q" {
                    break;
                }
                let key = if line == "show" {
                    show_key
                } else {
                    line.parse::<u8>().ok()
                };
                match key {
                    Some(key) => {
                        if tx.send(key).is_err() {
                            break;
                        }
                    }
                    None if line.is_empty() => {}
                    None => log::warn!("not a key number: {:?}", line),
                }
            }
            quit.store(true, Ordering::Relaxed);
        });
        Self { rx }
    }
}

impl KeyInput for StdinKeys {
    fn poll_key(&mut self) -> Option<u8> {
        self.rx.try_recv().ok()
    }
}

// ============================================================================
// Bus
// ============================================================================

/// Echoes activations back the way a command station reports them.
#[derive(Default)]
struct LoopbackBus {
    echoes: VecDeque<BusEvent>,
}

impl BusTransport for LoopbackBus {
    type Error = std::convert::Infallible;

    fn send(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        let Some(msg) = BusMessage::decode(payload) else {
            log::warn!("loopback: undecodable payload {:02X?}", payload);
            return Ok(());
        };
        log::debug!("loopback tx {:02X?} {:?}", payload, msg);
        match msg {
            BusMessage::SwitchRequest { state, on: true, .. } => {
                if let Some(address) = msg.switch_address() {
                    self.echoes.push_back(BusEvent::SwitchRequest(SwitchNotice {
                        address,
                        output_on: true,
                        state,
                    }));
                }
            }
            BusMessage::SwitchRequest { on: false, .. } => {}
            BusMessage::PowerOn => self.echoes.push_back(BusEvent::Power(true)),
            BusMessage::PowerOff => self.echoes.push_back(BusEvent::Power(false)),
        }
        Ok(())
    }

    fn poll_receive(&mut self) -> Result<Option<BusEvent>, Self::Error> {
        Ok(self.echoes.pop_front())
    }
}

// ============================================================================
// Storage
// ============================================================================

/// EEPROM image kept in a file, rewritten on every write.
struct FileStorage {
    path: PathBuf,
    data: Vec<u8>,
}

impl FileStorage {
    fn open(path: PathBuf, size: usize) -> anyhow::Result<Self> {
        let mut data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        data.resize(size, 0xFF);
        Ok(Self { path, data })
    }
}

impl Storage for FileStorage {
    type Error = std::io::Error;

    fn read_at(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), Self::Error> {
        let src = self
            .data
            .get(offset..offset + buf.len())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "read past end"))?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), Self::Error> {
        let dst = self
            .data
            .get_mut(offset..offset + bytes.len())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::WriteZero, "write past end"))?;
        dst.copy_from_slice(bytes);
        std::fs::write(&self.path, &self.data)
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

// ============================================================================
// Indicators and display
// ============================================================================

/// Logs LED changes.
struct LogIndicators;

impl IndicatorDriver for LogIndicators {
    type Error = std::convert::Infallible;

    fn set_pin(&mut self, bank: u8, pin: u8, on: bool) -> Result<(), Self::Error> {
        log::trace!("led {}/{} {}", bank, pin, if on { "on" } else { "off" });
        Ok(())
    }
}

/// Character display drawn on the terminal when it changes.
struct TermDisplay {
    cols: usize,
    rows: Vec<Vec<char>>,
    dirty: bool,
}

impl TermDisplay {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows: vec![vec![' '; cols]; rows],
            dirty: true,
        }
    }

    fn render(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        let border = "-".repeat(self.cols);
        println!("+{}+", border);
        for row in &self.rows {
            println!("|{}|", row.iter().collect::<String>());
        }
        println!("+{}+", border);
    }
}

impl PanelDisplay for TermDisplay {
    type Error = std::convert::Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        for row in &mut self.rows {
            row.fill(' ');
        }
        self.dirty = true;
        Ok(())
    }

    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), Self::Error> {
        if let Some(line) = self.rows.get_mut(usize::from(row)) {
            for (slot, c) in line.iter_mut().skip(usize::from(col)).zip(text.chars()) {
                *slot = c;
            }
            self.dirty = true;
        }
        Ok(())
    }
}

/// Sleeping delay, or a no-op in fast mode.
struct StdDelay {
    fast: bool,
}

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        if !self.fast {
            thread::sleep(Duration::from_nanos(u64::from(ns)));
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        if !self.fast {
            thread::sleep(Duration::from_millis(u64::from(ms)));
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("panel.img"));
    let fast = std::env::var_os("PANEL_SIM_FAST").is_some();

    let table = factory_table().context("factory layout is invalid")?;
    log::info!(
        "layout: {} elements on a {}x{} key matrix, image {} bytes",
        table.len(),
        layout::KEY_ROWS,
        layout::KEY_COLS,
        image_len(table.len())
    );

    let show_key = table
        .iter()
        .position(|e| *e == Element::function(FunctionCode::Show))
        .and_then(|i| u8::try_from(i + 1).ok());

    let config = PanelConfig::default();
    let io = PanelIo {
        indicators: LogIndicators,
        bus: LoopbackBus::default(),
        display: TermDisplay::new(usize::from(config.display.cols), 4),
        storage: FileStorage::open(path.clone(), STORAGE_SIZE)?,
        delay: StdDelay { fast },
    };
    let mut panel = Panel::new(table, config, io).context("invalid panel layout")?;

    log::info!("storage image: {}", path.display());
    panel.startup().context("startup failed")?;
    panel.io_mut().display.render();

    let quit = Arc::new(AtomicBool::new(false));
    let mut keys = StdinKeys::spawn(quit.clone(), show_key);
    println!("Enter key numbers (1-{}), 'show', or 'q' to quit", panel.table().len());

    while !quit.load(Ordering::Relaxed) {
        if let Err(e) = panel.tick(&mut keys) {
            log::error!("tick failed: {}", e);
        }
        panel.io_mut().display.render();
        thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }

    log::info!("bye");
    Ok(())
}
