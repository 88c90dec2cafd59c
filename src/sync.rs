//! State synchronizer: store, recall and activate.
//!
//! These three operations keep the table, the stored image and the layout
//! in agreement. Recall and activate together form the startup sequence.

use embedded_hal::delay::DelayNs;

use crate::element::Element;
use crate::error::Result;
use crate::panel::{Panel, PanelPhase};
use crate::persistence::{load_table, store_table};
use crate::traits::{BusTransport, IndicatorDriver, PanelDisplay, Storage};

/// Notifications handled per switch while activating, at most.
///
/// Keeps a chatty bus from stalling the replay.
pub const MAX_PUMP_EVENTS: usize = 16;

/// Where the table came from after a recall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecallOutcome {
    /// The stored image was valid and loaded.
    Stored,
    /// No usable image; the factory layout was restored.
    FactoryDefaults,
}

/// Result of [`Panel::activate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ActivateReport {
    /// Whether track power was on.
    pub power_on: bool,
    /// Switches whose set sequence went out.
    pub switches_sent: usize,
}

impl<I, B, D, S, T> Panel<I, B, D, S, T>
where
    I: IndicatorDriver,
    B: BusTransport,
    D: PanelDisplay,
    S: Storage,
    T: DelayNs,
{
    /// Persist the whole table.
    pub fn store(&mut self) -> Result<()> {
        let base = self.config.storage.base_offset;
        store_table(&mut self.io.storage, base, &self.table)?;
        log::info!("stored {} elements at offset {}", self.table.len(), base);
        self.feedback("Stored");
        Ok(())
    }

    /// Replace the table with the stored image, or the factory layout when
    /// there is no usable image.
    ///
    /// Only a failing storage medium is an error; a missing, corrupt or
    /// foreign image is not.
    pub fn recall(&mut self) -> Result<RecallOutcome> {
        let base = self.config.storage.base_offset;
        let outcome = match load_table(&mut self.io.storage, base, &self.factory)? {
            Ok(rows) => {
                self.table.overwrite(&rows);
                log::info!("recalled {} elements", rows.len());
                RecallOutcome::Stored
            }
            Err(e) => {
                log::warn!("no usable stored image ({}), using factory layout", e);
                self.table = self.factory.clone();
                RecallOutcome::FactoryDefaults
            }
        };

        self.show_locomotive();
        self.feedback(match outcome {
            RecallOutcome::Stored => "Recalled",
            RecallOutcome::FactoryDefaults => "Factory defaults",
        });
        Ok(outcome)
    }

    /// Replay the table onto the layout.
    ///
    /// Every switch LED pair is refreshed first. Power is then applied; with
    /// power off nothing else is sent. With power on each addressed switch
    /// gets its set sequence, followed by a drain of pending notifications
    /// and the pacing delay. A power-off reported during the drain ends the
    /// replay.
    pub fn activate(&mut self) -> Result<ActivateReport> {
        for index in 0..self.table.switch_count() {
            if let Some(Element::Switch(sw)) = self.table.get(index) {
                let state = sw.state;
                self.apply_switch_indicators(index, state)?;
            }
        }

        let power_on = self.power_row_on();
        if self.table.power_index().is_none() {
            log::warn!("layout has no power element, treating power as off");
        }
        self.apply_power(power_on)?;

        if self.phase == PanelPhase::Recall {
            self.phase = if power_on {
                PanelPhase::SyncSwitches
            } else {
                PanelPhase::PowerOff
            };
        }

        let mut report = ActivateReport {
            power_on,
            switches_sent: 0,
        };
        if !power_on {
            log::info!("activate: power off, switches not replayed");
            return Ok(report);
        }

        for index in 0..self.table.switch_count() {
            // Re-read each time: the pump may have changed rows
            let Some(Element::Switch(sw)) = self.table.get(index).copied() else {
                continue;
            };
            if sw.is_spare() {
                continue;
            }
            self.apply_switch_indicators(index, sw.state)?;
            self.set_switch(sw.address, sw.state)?;
            report.switches_sent += 1;
            self.pump_bus()?;
            if !self.power_row_on() {
                log::warn!("activate: power went off, replay stopped");
                report.power_on = false;
                break;
            }
            self.io.delay.delay_ms(self.config.timing.switch_pace_ms);
        }

        log::info!("activate: {} switches replayed", report.switches_sent);
        Ok(report)
    }

    fn power_row_on(&self) -> bool {
        matches!(
            self.table.power_index().and_then(|i| self.table.get(i)),
            Some(Element::Power(p)) if p.on
        )
    }

    /// Handle pending notifications, up to [`MAX_PUMP_EVENTS`].
    fn pump_bus(&mut self) -> Result<()> {
        for _ in 0..MAX_PUMP_EVENTS {
            match self.poll_bus()? {
                Some(event) => self.handle_bus_event(event)?,
                None => break,
            }
        }
        Ok(())
    }

    fn feedback(&mut self, text: &str) {
        self.show_message(text);
        self.io.delay.delay_ms(self.config.timing.feedback_dwell_ms);
    }
}
