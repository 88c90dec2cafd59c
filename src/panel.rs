//! The panel controller: operator dispatch and bus reconciliation.
//!
//! [`Panel`] owns the element table and every collaborator. It is driven
//! from a single cooperative loop:
//!
//! 1. [`Panel::startup`] once: recall the stored table and replay it onto the
//!    layout (see [`crate::sync`]).
//! 2. [`Panel::tick`] forever: handle at most one bus notification, then at
//!    most one key press.
//!
//! Bus notifications are handled before keys within a tick, so an update
//! reported by the command station is never overwritten by a key press that
//! was queued in the same pass.
//!
//! # Example
//!
//! ```rust
//! use rs_trackpanel::{Panel, PanelConfig, PanelIo};
//! use rs_trackpanel::hal::{MockBus, MockDelay, MockDisplay, MockIndicators, MockKeys, MockStorage};
//! use rs_trackpanel::layout::factory_table;
//!
//! let io = PanelIo {
//!     indicators: MockIndicators::new(),
//!     bus: MockBus::new(),
//!     display: MockDisplay::new(20, 4),
//!     storage: MockStorage::new(1024),
//!     delay: MockDelay::new(),
//! };
//! let mut panel = Panel::new(factory_table().unwrap(), PanelConfig::default(), io).unwrap();
//! panel.startup().unwrap();
//! panel.io_mut().bus.clear_sent();
//!
//! // Press the key of the first switch
//! let mut keys = MockKeys::new();
//! keys.press(1);
//! panel.tick(&mut keys).unwrap();
//!
//! // Two activate/release pairs went out
//! assert_eq!(panel.io().bus.sent_switch_requests().len(), 4);
//! ```

use embedded_hal::delay::DelayNs;

use crate::config::PanelConfig;
use crate::element::{Element, FunctionCode, SwitchState};
use crate::error::{Error, LayoutError, Result};
use crate::protocol::{switch_sequence, BusEvent, BusMessage, Step, SwitchNotice};
use crate::status;
use crate::table::{ElementTable, IndicatorMap};
use crate::traits::{BusTransport, IndicatorDriver, KeyInput, PanelDisplay, Storage};

/// The panel's collaborators.
pub struct PanelIo<I, B, D, S, T> {
    /// LED banks.
    pub indicators: I,
    /// Command station bus.
    pub bus: B,
    /// Status display.
    pub display: D,
    /// Non-volatile storage for the table image.
    pub storage: S,
    /// Blocking delay used for bus pacing and feedback dwell.
    pub delay: T,
}

/// Where the panel is in its life.
///
/// `Boot → Recall → (PowerOff | SyncSwitches) → Ready`. `Ready` has no exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelPhase {
    /// Constructed, nothing done yet.
    Boot,
    /// Loading the stored table.
    Recall,
    /// Power is off; switches are not replayed.
    PowerOff,
    /// Replaying switch positions onto the layout.
    SyncSwitches,
    /// Steady state.
    Ready,
}

/// Main panel controller.
///
/// # Type Parameters
///
/// - `I`: [`IndicatorDriver`]
/// - `B`: [`BusTransport`]
/// - `D`: [`PanelDisplay`]
/// - `S`: [`Storage`]
/// - `T`: [`DelayNs`]
pub struct Panel<I, B, D, S, T> {
    pub(crate) table: ElementTable,
    pub(crate) factory: ElementTable,
    pub(crate) config: PanelConfig,
    pub(crate) map: IndicatorMap,
    pub(crate) io: PanelIo<I, B, D, S, T>,
    active_loco: Option<usize>,
    pub(crate) phase: PanelPhase,
}

impl<I, B, D, S, T> Panel<I, B, D, S, T>
where
    I: IndicatorDriver,
    B: BusTransport,
    D: PanelDisplay,
    S: Storage,
    T: DelayNs,
{
    /// Create a panel around `layout`, which also becomes the factory image.
    ///
    /// # Errors
    ///
    /// [`LayoutError::PowerLedConflict`] if a switch LED would land on the
    /// configured power LED pin.
    pub fn new(
        layout: ElementTable,
        config: PanelConfig,
        io: PanelIo<I, B, D, S, T>,
    ) -> Result<Self> {
        let map = config.indicators.map();
        let (bank, pin) = (config.indicators.power_bank, config.indicators.power_pin);
        if let Some(index) = map.conflict(layout.switch_count(), bank, pin) {
            log::error!("switch {} collides with power LED {}/{}", index, bank, pin);
            return Err(Error::InvalidLayout(LayoutError::PowerLedConflict(index)));
        }
        Ok(Self {
            factory: layout.clone(),
            table: layout,
            config,
            map,
            io,
            active_loco: None,
            phase: PanelPhase::Boot,
        })
    }

    /// Boot sequence: draw the display, recall, activate, enter `Ready`.
    pub fn startup(&mut self) -> Result<crate::sync::ActivateReport> {
        self.phase = PanelPhase::Boot;
        if let Err(e) = self.io.display.clear() {
            log::warn!("display clear failed: {:?}", e);
        }
        let title = status::title(self.config.display.title.as_str());
        self.show(status::ROW_TITLE, 0, &title);
        self.show_locomotive();

        self.phase = PanelPhase::Recall;
        if let Err(e) = self.recall() {
            log::error!("recall failed ({}), using factory layout", e);
            self.table = self.factory.clone();
            self.show_locomotive();
            self.show_message("Factory defaults");
        }

        let report = self.activate()?;
        self.phase = PanelPhase::Ready;
        self.show_message("Ready");
        log::info!(
            "panel ready: power {}, {} switches replayed",
            if report.power_on { "on" } else { "off" },
            report.switches_sent
        );
        Ok(report)
    }

    /// One pass of the main loop: one bus poll, then one key poll.
    pub fn tick<K: KeyInput>(&mut self, keys: &mut K) -> Result<()> {
        if let Some(event) = self.poll_bus()? {
            self.handle_bus_event(event)?;
        }
        if let Some(key) = keys.poll_key() {
            self.handle_key(key)?;
        }
        Ok(())
    }

    // ========================================================================
    // Operator dispatch
    // ========================================================================

    /// Dispatch a 1-based key identifier to the handler for its row.
    ///
    /// Keys outside the table are ignored.
    pub fn handle_key(&mut self, key_id: u8) -> Result<()> {
        let Some(index) = self.table.key_to_index(key_id) else {
            log::debug!("key {} has no element", key_id);
            return Ok(());
        };

        match self.table.get(index).copied() {
            Some(Element::Switch(_)) => self.flip_switch(index),
            Some(Element::Locomotive(_)) => {
                self.select_locomotive(index);
                Ok(())
            }
            Some(Element::Function { code }) => self.run_function(code),
            Some(Element::Power(_)) => self.toggle_power(index),
            None => Ok(()),
        }
    }

    /// Flip the switch at `index` and tell the command station.
    ///
    /// Spare slots flip their LEDs only.
    pub fn flip_switch(&mut self, index: usize) -> Result<()> {
        let Some(Element::Switch(sw)) = self.table.get_mut(index) else {
            return Ok(());
        };
        sw.state = sw.state.flipped();
        let sw = *sw;

        self.apply_switch_indicators(index, sw.state)?;
        if sw.is_spare() {
            log::debug!("spare switch slot {} flipped locally", index);
        } else {
            log::info!("switch {} -> {}", sw.address, sw.state.as_str());
            self.set_switch(sw.address, sw.state)?;
        }
        self.show_switch(sw.address, sw.state);
        Ok(())
    }

    /// Make the locomotive at `index` the target of direction commands.
    pub fn select_locomotive(&mut self, index: usize) {
        if let Some(Element::Locomotive(loco)) = self.table.get(index) {
            log::info!("locomotive {} selected", loco.address);
            self.active_loco = Some(index);
            self.show_locomotive();
        }
    }

    /// Run the operator command `code`.
    pub fn run_function(&mut self, code: u16) -> Result<()> {
        let Some(function) = FunctionCode::from_code(code) else {
            log::warn!("unknown function code {}", code);
            return Ok(());
        };

        match function {
            FunctionCode::Store => self.store(),
            FunctionCode::Recall => self.recall().map(|_| ()),
            FunctionCode::Activate => self.activate().map(|_| ()),
            FunctionCode::Show => {
                self.dump_table();
                Ok(())
            }
            FunctionCode::Forward | FunctionCode::Stop | FunctionCode::Reverse => {
                self.steer_locomotive(function);
                Ok(())
            }
            FunctionCode::Lights
            | FunctionCode::Sound
            | FunctionCode::Whistle
            | FunctionCode::Horn
            | FunctionCode::TwoToneHorn => {
                log::debug!("function {:?} is reserved", function);
                Ok(())
            }
        }
    }

    /// Toggle track power through the power row at `index`.
    pub fn toggle_power(&mut self, index: usize) -> Result<()> {
        let Some(Element::Power(power)) = self.table.get_mut(index) else {
            return Ok(());
        };
        power.on = !power.on;
        let on = power.on;

        log::info!("track power {}", if on { "on" } else { "off" });
        self.apply_power(on)
    }

    fn steer_locomotive(&mut self, function: FunctionCode) {
        let Some(direction) = function.direction() else {
            return;
        };
        let Some(index) = self.active_loco else {
            log::warn!("{:?} ignored: no locomotive selected", function);
            self.show_message("No loco selected");
            return;
        };
        if let Some(Element::Locomotive(loco)) = self.table.get_mut(index) {
            loco.direction = direction;
            log::info!("locomotive {} {}", loco.address, direction.as_str());
        }
        self.show_locomotive();
    }

    /// Log every row at info level.
    pub fn dump_table(&self) {
        log::info!(
            "element table: {} rows, {} switches",
            self.table.len(),
            self.table.switch_count()
        );
        for (index, element) in self.table.iter().enumerate() {
            match element {
                Element::Switch(s) => {
                    let slot = self.map.locate(index);
                    log::info!(
                        "[{:2}] switch  group {} addr {:4} {:8} bank {}/{} pin {}",
                        index,
                        s.group,
                        s.address,
                        s.state.as_str(),
                        slot.bank,
                        slot.complement_bank,
                        slot.pin
                    );
                }
                Element::Locomotive(l) => log::info!(
                    "[{:2}] loco    addr {:4} {} step {}",
                    index,
                    l.address,
                    l.direction.as_str(),
                    l.speed_step
                ),
                Element::Function { code } => log::info!("[{:2}] func    code {}", index, code),
                Element::Power(p) => log::info!(
                    "[{:2}] power   {}",
                    index,
                    if p.on { "on" } else { "off" }
                ),
            }
        }
    }

    // ========================================================================
    // Bus reconciliation
    // ========================================================================

    /// Reflect an inbound notification into the table, LEDs and display.
    ///
    /// Nothing is sent back, so the panel's own echoes do not loop. Unknown
    /// addresses are logged and skipped.
    pub fn handle_bus_event(&mut self, event: BusEvent) -> Result<()> {
        match event {
            BusEvent::SwitchRequest(notice)
            | BusEvent::SwitchReport(notice)
            | BusEvent::SwitchState(notice) => self.reconcile_switch(notice),
            BusEvent::Power(on) => {
                let Some(index) = self.table.power_index() else {
                    log::warn!("power notification but layout has no power element");
                    return Ok(());
                };
                if let Some(Element::Power(p)) = self.table.get_mut(index) {
                    p.on = on;
                }
                self.set_power_indicator(on)?;
                self.show_power(on);
                Ok(())
            }
        }
    }

    fn reconcile_switch(&mut self, notice: SwitchNotice) -> Result<()> {
        let Some(index) = self.table.find_switch(notice.address) else {
            log::warn!("notification for unknown switch address {}", notice.address);
            return Ok(());
        };
        if let Some(Element::Switch(sw)) = self.table.get_mut(index) {
            sw.state = notice.state;
        }
        log::debug!(
            "switch {} reported {} (output {})",
            notice.address,
            notice.state.as_str(),
            if notice.output_on { "on" } else { "off" }
        );
        self.apply_switch_indicators(index, notice.state)?;
        self.show_switch(notice.address, notice.state);
        Ok(())
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    /// Send the double activate/release sequence for one switch.
    pub(crate) fn set_switch(&mut self, address: u16, state: SwitchState) -> Result<()> {
        let steps = switch_sequence(address, state, self.config.timing.pulse_gap_ms)?;
        self.run_steps(&steps)
    }

    fn run_steps(&mut self, steps: &[Step]) -> Result<()> {
        for step in steps {
            match *step {
                Step::Send(msg) => self.send(msg)?,
                Step::Pause(ms) => self.io.delay.delay_ms(ms),
            }
        }
        Ok(())
    }

    pub(crate) fn send(&mut self, msg: BusMessage) -> Result<()> {
        log::trace!("bus tx {:?}", msg);
        self.io.bus.send(&msg.encode()).map_err(|e| {
            log::error!("bus send of {:?} failed: {:?}", msg, e);
            Error::Bus
        })
    }

    pub(crate) fn poll_bus(&mut self) -> Result<Option<BusEvent>> {
        self.io.bus.poll_receive().map_err(|e| {
            log::error!("bus receive failed: {:?}", e);
            Error::Bus
        })
    }

    /// Light the LED of `state` and darken the other one.
    pub(crate) fn apply_switch_indicators(&mut self, index: usize, state: SwitchState) -> Result<()> {
        let slot = self.map.locate(index);
        self.set_pin(slot.bank, slot.pin, state.is_thrown())?;
        self.set_pin(slot.complement_bank, slot.pin, !state.is_thrown())
    }

    /// Power LED, command station, and display for a power change.
    pub(crate) fn apply_power(&mut self, on: bool) -> Result<()> {
        self.set_power_indicator(on)?;
        self.send(BusMessage::power(on))?;
        self.show_power(on);
        Ok(())
    }

    fn set_power_indicator(&mut self, on: bool) -> Result<()> {
        let (bank, pin) = (
            self.config.indicators.power_bank,
            self.config.indicators.power_pin,
        );
        self.set_pin(bank, pin, on)
    }

    fn set_pin(&mut self, bank: u8, pin: u8, on: bool) -> Result<()> {
        self.io.indicators.set_pin(bank, pin, on).map_err(|e| {
            log::error!("indicator {}/{} failed: {:?}", bank, pin, e);
            Error::Indicator
        })
    }

    // ========================================================================
    // Display fields (best effort)
    // ========================================================================

    fn show(&mut self, row: u8, col: u8, text: &str) {
        if let Err(e) = self.io.display.write_at(row, col, text) {
            log::warn!("display write at {},{} failed: {:?}", row, col, e);
        }
    }

    fn show_switch(&mut self, address: u16, state: SwitchState) {
        let text = status::switch(self.config.display.cols, address, state);
        self.show(status::ROW_SWITCH, 0, &text);
    }

    fn show_power(&mut self, on: bool) {
        let text = status::power(self.config.display.cols, on);
        self.show(status::ROW_TITLE, status::COL_POWER, &text);
    }

    pub(crate) fn show_locomotive(&mut self) {
        let selected = self.active_loco.and_then(|i| match self.table.get(i) {
            Some(Element::Locomotive(l)) => Some((l.address, l.direction)),
            _ => None,
        });
        let text = status::locomotive(self.config.display.cols, selected);
        self.show(status::ROW_LOCO, 0, &text);
    }

    pub(crate) fn show_message(&mut self, text: &str) {
        let text = status::message(self.config.display.cols, text);
        self.show(status::ROW_MESSAGE, 0, &text);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The element table.
    pub fn table(&self) -> &ElementTable {
        &self.table
    }

    /// Index of the selected locomotive.
    pub fn active_locomotive(&self) -> Option<usize> {
        self.active_loco
    }

    /// Current phase.
    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    /// The configuration.
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// The collaborators.
    pub fn io(&self) -> &PanelIo<I, B, D, S, T> {
        &self.io
    }

    /// Mutable access to the collaborators (tests, simulators).
    pub fn io_mut(&mut self) -> &mut PanelIo<I, B, D, S, T> {
        &mut self.io
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use crate::hal::{MockBus, MockDelay, MockDisplay, MockIndicators, MockKeys, MockStorage};
    use crate::protocol::SwitchNotice;

    type TestPanel = Panel<MockIndicators, MockBus, MockDisplay, MockStorage, MockDelay>;

    fn panel() -> TestPanel {
        let table = ElementTable::new(&[
            Element::switch(1, 101),
            Element::switch(1, 102),
            Element::spare_switch(),
            Element::locomotive(344),
            Element::locomotive(611),
            Element::function(FunctionCode::Forward),
            Element::function(FunctionCode::Reverse),
            Element::function(FunctionCode::Horn),
            Element::Function { code: 4242 },
            Element::power(false),
        ])
        .unwrap();
        let io = PanelIo {
            indicators: MockIndicators::new(),
            bus: MockBus::new(),
            display: MockDisplay::new(20, 4),
            storage: MockStorage::new(512),
            delay: MockDelay::new(),
        };
        Panel::new(table, PanelConfig::default(), io).unwrap()
    }

    fn switch_state(panel: &TestPanel, index: usize) -> SwitchState {
        match panel.table().get(index) {
            Some(Element::Switch(s)) => s.state,
            other => panic!("expected switch, got {:?}", other),
        }
    }

    #[test]
    fn key_flips_switch_and_sends_sequence() {
        let mut panel = panel();
        panel.handle_key(2).unwrap();

        assert_eq!(switch_state(&panel, 1), SwitchState::Thrown);
        let sent = panel.io().bus.sent_messages();
        let on = BusMessage::switch_request(102, SwitchState::Thrown, true).unwrap();
        let off = BusMessage::switch_request(102, SwitchState::Thrown, false).unwrap();
        assert_eq!(sent, vec![on, off, on, off]);
        assert_eq!(panel.io().delay.pauses, vec![50]);

        // thrown LED on bank 0, straight LED off on bank 1
        assert_eq!(panel.io().indicators.pin(0, 1), Some(true));
        assert_eq!(panel.io().indicators.pin(1, 1), Some(false));
        assert_eq!(panel.io().display.row(1).trim_end(), "SW 0102 THROWN");
    }

    #[test]
    fn spare_switch_flips_locally() {
        let mut panel = panel();
        panel.handle_key(3).unwrap();
        assert_eq!(switch_state(&panel, 2), SwitchState::Thrown);
        assert!(panel.io().bus.sent.is_empty());
        assert_eq!(panel.io().indicators.pin(0, 2), Some(true));
    }

    #[test]
    fn out_of_range_keys_do_nothing() {
        let mut panel = panel();
        let before = panel.table().clone();
        panel.handle_key(0).unwrap();
        panel.handle_key(11).unwrap();
        panel.handle_key(64).unwrap();
        assert_eq!(panel.table(), &before);
        assert!(panel.io().bus.sent.is_empty());
        assert!(panel.io().indicators.writes.is_empty());
    }

    #[test]
    fn locomotive_selection_and_direction() {
        let mut panel = panel();
        assert_eq!(panel.active_locomotive(), None);

        panel.handle_key(5).unwrap();
        assert_eq!(panel.active_locomotive(), Some(4));

        panel.handle_key(7).unwrap();
        match panel.table().get(4) {
            Some(Element::Locomotive(l)) => assert_eq!(l.direction, crate::Direction::Reverse),
            other => panic!("expected locomotive, got {:?}", other),
        }
        assert_eq!(panel.io().display.row(2).trim_end(), "LOC 0611 REV");
        // direction commands stay off the bus
        assert!(panel.io().bus.sent.is_empty());
    }

    #[test]
    fn direction_without_selection_warns() {
        let mut panel = panel();
        panel.handle_key(6).unwrap();
        assert_eq!(panel.io().display.row(3).trim_end(), "No loco selected");
        match panel.table().get(3) {
            Some(Element::Locomotive(l)) => assert_eq!(l.direction, crate::Direction::Forward),
            other => panic!("expected locomotive, got {:?}", other),
        }
    }

    #[test]
    fn reserved_and_unknown_functions_are_noops() {
        let mut panel = panel();
        let before = panel.table().clone();
        panel.handle_key(8).unwrap();
        panel.handle_key(9).unwrap();
        assert_eq!(panel.table(), &before);
        assert!(panel.io().bus.sent.is_empty());
    }

    #[test]
    fn power_toggle() {
        let mut panel = panel();
        panel.handle_key(10).unwrap();
        assert_eq!(panel.io().bus.sent_messages(), vec![BusMessage::PowerOn]);
        assert_eq!(panel.io().indicators.pin(4, 0), Some(true));
        assert_eq!(panel.io().display.row(0), "            PWR ON  ");

        panel.handle_key(10).unwrap();
        assert_eq!(
            panel.io().bus.sent_messages(),
            vec![BusMessage::PowerOn, BusMessage::PowerOff]
        );
        assert_eq!(panel.io().indicators.pin(4, 0), Some(false));
    }

    #[test]
    fn inbound_switch_updates_without_echo() {
        let mut panel = panel();
        let notice = SwitchNotice {
            address: 101,
            output_on: true,
            state: SwitchState::Thrown,
        };
        panel.handle_bus_event(BusEvent::SwitchReport(notice)).unwrap();

        assert_eq!(switch_state(&panel, 0), SwitchState::Thrown);
        assert_eq!(panel.io().indicators.pin(0, 0), Some(true));
        assert_eq!(panel.io().indicators.pin(1, 0), Some(false));
        assert!(panel.io().bus.sent.is_empty());
    }

    #[test]
    fn all_switch_notification_kinds_reconcile() {
        let mut panel = panel();
        let thrown = SwitchNotice {
            address: 102,
            output_on: false,
            state: SwitchState::Thrown,
        };
        let straight = SwitchNotice {
            state: SwitchState::Straight,
            ..thrown
        };

        panel.handle_bus_event(BusEvent::SwitchRequest(thrown)).unwrap();
        assert_eq!(switch_state(&panel, 1), SwitchState::Thrown);
        panel.handle_bus_event(BusEvent::SwitchState(straight)).unwrap();
        assert_eq!(switch_state(&panel, 1), SwitchState::Straight);
        assert_eq!(panel.io().indicators.pin(1, 1), Some(true));
    }

    #[test]
    fn unknown_address_is_skipped() {
        let mut panel = panel();
        let before = panel.table().clone();
        let notice = SwitchNotice {
            address: 999,
            output_on: true,
            state: SwitchState::Thrown,
        };
        assert!(panel.handle_bus_event(BusEvent::SwitchState(notice)).is_ok());
        assert_eq!(panel.table(), &before);
        assert!(panel.io().indicators.writes.is_empty());
    }

    #[test]
    fn inbound_power_reflected() {
        let mut panel = panel();
        panel.handle_bus_event(BusEvent::Power(true)).unwrap();
        let index = panel.table().find_by_address(ElementKind::Power, 9999).unwrap();
        assert_eq!(panel.table().get(index), Some(&Element::power(true)));
        assert_eq!(panel.io().indicators.pin(4, 0), Some(true));
        assert!(panel.io().bus.sent.is_empty());
    }

    #[test]
    fn tick_handles_bus_before_keys() {
        let mut panel = panel();
        let mut keys = MockKeys::new();
        keys.press(1);
        panel.io_mut().bus.queue_event(BusEvent::SwitchState(SwitchNotice {
            address: 101,
            output_on: true,
            state: SwitchState::Thrown,
        }));

        panel.tick(&mut keys).unwrap();

        // bus set it thrown, then the key flipped it back
        assert_eq!(switch_state(&panel, 0), SwitchState::Straight);
        let sent = panel.io().bus.sent_messages();
        assert_eq!(
            sent[0],
            BusMessage::switch_request(101, SwitchState::Straight, true).unwrap()
        );
    }

    #[test]
    fn tick_idle() {
        let mut panel = panel();
        let mut keys = MockKeys::new();
        panel.tick(&mut keys).unwrap();
        assert!(panel.io().bus.sent.is_empty());
        assert!(panel.io().indicators.writes.is_empty());
    }
}
