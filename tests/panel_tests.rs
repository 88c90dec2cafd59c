//! End-to-end tests of the panel against the reference layout

use rs_trackpanel::hal::{MockBus, MockDelay, MockDisplay, MockIndicators, MockKeys, MockStorage};
use rs_trackpanel::layout::factory_table;
use rs_trackpanel::{
    ActivateReport, BusEvent, BusMessage, Direction, Element, Panel, PanelConfig, PanelIo,
    PanelPhase, RecallOutcome, SwitchNotice, SwitchState,
};

type TestPanel = Panel<MockIndicators, MockBus, MockDisplay, MockStorage, MockDelay>;

// Key numbers on the reference layout
const KEY_SWITCH_101: u8 = 1;
const KEY_SWITCH_501: u8 = 15;
const KEY_LOCO_344: u8 = 33;
const KEY_LOCO_2412: u8 = 37;
const KEY_STORE: u8 = 38;
const KEY_RECALL: u8 = 39;
const KEY_ACTIVATE: u8 = 40;
const KEY_SHOW: u8 = 41;
const KEY_FORWARD: u8 = 42;
const KEY_STOP: u8 = 43;
const KEY_REVERSE: u8 = 44;
const KEY_POWER: u8 = 50;

// Switch 501 sits at index 14: thrown LED bank 0, straight LED bank 1, pin 14
const SW501_PIN: u8 = 14;

fn panel_on(storage: MockStorage) -> TestPanel {
    let io = PanelIo {
        indicators: MockIndicators::new(),
        bus: MockBus::new(),
        display: MockDisplay::new(20, 4),
        storage,
        delay: MockDelay::new(),
    };
    Panel::new(factory_table().unwrap(), PanelConfig::default(), io).unwrap()
}

fn panel() -> TestPanel {
    panel_on(MockStorage::new(1024))
}

fn press(panel: &mut TestPanel, key: u8) {
    let mut keys = MockKeys::new();
    keys.press(key);
    panel.tick(&mut keys).unwrap();
}

fn switch_state(panel: &TestPanel, address: u16) -> SwitchState {
    let index = panel.table().find_switch(address).unwrap();
    match panel.table().get(index) {
        Some(Element::Switch(s)) => s.state,
        other => panic!("expected switch, got {:?}", other),
    }
}

/// Storage holding an image with switch 501 thrown and power as given.
fn stored_image(power_on: bool) -> MockStorage {
    let mut panel = panel();
    press(&mut panel, KEY_SWITCH_501);
    if !power_on {
        press(&mut panel, KEY_POWER);
    }
    press(&mut panel, KEY_STORE);
    panel.io().storage.clone()
}

// ============================================================================
// Boot
// ============================================================================

#[test]
fn boot_replays_stored_layout() {
    let mut panel = panel_on(stored_image(true));
    let report = panel.startup().unwrap();

    assert_eq!(
        report,
        ActivateReport {
            power_on: true,
            switches_sent: 25
        }
    );
    assert_eq!(panel.phase(), PanelPhase::Ready);
    assert_eq!(switch_state(&panel, 501), SwitchState::Thrown);

    let sent = panel.io().bus.sent_messages();
    assert_eq!(sent[0], BusMessage::PowerOn);
    let on = BusMessage::switch_request(501, SwitchState::Thrown, true).unwrap();
    let off = BusMessage::switch_request(501, SwitchState::Thrown, false).unwrap();
    assert_eq!(sent.iter().filter(|m| **m == on).count(), 2);
    assert_eq!(sent.iter().filter(|m| **m == off).count(), 2);

    let leds = &panel.io().indicators;
    assert_eq!(leds.pin(0, SW501_PIN), Some(true));
    assert_eq!(leds.pin(1, SW501_PIN), Some(false));
    assert_eq!(leds.pin(4, 0), Some(true));
    assert_eq!(panel.io().display.row(0), "MR-control  PWR ON  ");
}

#[test]
fn boot_from_blank_storage_uses_factory_layout() {
    let mut panel = panel();
    let report = panel.startup().unwrap();

    assert!(report.power_on);
    assert_eq!(panel.table(), &factory_table().unwrap());
    assert_eq!(switch_state(&panel, 501), SwitchState::Straight);
    assert_eq!(panel.io().indicators.pin(1, SW501_PIN), Some(true));
}

#[test]
fn boot_with_power_off_sends_no_switches() {
    let mut panel = panel_on(stored_image(false));
    let report = panel.startup().unwrap();

    assert!(!report.power_on);
    assert_eq!(report.switches_sent, 0);
    assert_eq!(panel.io().bus.sent_messages(), vec![BusMessage::PowerOff]);
    assert!(panel.io().bus.sent_switch_requests().is_empty());

    // LEDs still show the recalled positions
    assert_eq!(panel.io().indicators.pin(0, SW501_PIN), Some(true));
    assert_eq!(panel.io().indicators.pin(4, 0), Some(false));
    assert_eq!(panel.phase(), PanelPhase::Ready);
}

#[test]
fn boot_with_corrupt_storage_falls_back() {
    let mut storage = stored_image(true);
    storage.corrupt(20, 1);

    let mut panel = panel_on(storage);
    panel.startup().unwrap();
    assert_eq!(panel.table(), &factory_table().unwrap());
}

// ============================================================================
// Synchronization
// ============================================================================

#[test]
fn activate_is_idempotent() {
    let mut panel = panel_on(stored_image(true));
    panel.startup().unwrap();

    panel.io_mut().bus.clear_sent();
    press(&mut panel, KEY_ACTIVATE);
    let first = panel.io().bus.sent_messages();
    let table = panel.table().clone();

    panel.io_mut().bus.clear_sent();
    press(&mut panel, KEY_ACTIVATE);
    let second = panel.io().bus.sent_messages();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1 + 25 * 4);
    assert_eq!(panel.table(), &table);
}

#[test]
fn store_recall_round_trip() {
    let mut panel = panel();
    press(&mut panel, KEY_SWITCH_101);
    press(&mut panel, KEY_LOCO_2412);
    press(&mut panel, KEY_REVERSE);
    press(&mut panel, KEY_STORE);
    let stored = panel.table().clone();

    press(&mut panel, KEY_SWITCH_101);
    press(&mut panel, KEY_SWITCH_501);
    assert_ne!(panel.table(), &stored);

    assert_eq!(panel.recall().unwrap(), RecallOutcome::Stored);
    assert_eq!(panel.table(), &stored);
}

#[test]
fn recall_key_shows_feedback() {
    let mut panel = panel();
    press(&mut panel, KEY_RECALL);
    assert_eq!(panel.io().display.row(3).trim_end(), "Factory defaults");
    assert_eq!(panel.io().delay.pauses, vec![1000]);
}

// ============================================================================
// Operator
// ============================================================================

#[test]
fn switch_key_double_send_with_gap() {
    let mut panel = panel();
    press(&mut panel, KEY_SWITCH_501);

    let on = BusMessage::switch_request(501, SwitchState::Thrown, true).unwrap();
    let off = BusMessage::switch_request(501, SwitchState::Thrown, false).unwrap();
    assert_eq!(panel.io().bus.sent_messages(), vec![on, off, on, off]);
    assert_eq!(panel.io().bus.sent[0], vec![0xB0, 0x74, 0x13]);
    assert_eq!(panel.io().delay.pauses, vec![50]);
    assert_eq!(panel.io().display.row(1).trim_end(), "SW 0501 THROWN");
}

#[test]
fn locomotive_direction_commands() {
    let mut panel = panel();
    press(&mut panel, KEY_LOCO_344);
    press(&mut panel, KEY_REVERSE);
    assert_eq!(panel.io().display.row(2).trim_end(), "LOC 0344 REV");
    press(&mut panel, KEY_STOP);
    assert_eq!(panel.io().display.row(2).trim_end(), "LOC 0344 STP");
    press(&mut panel, KEY_FORWARD);

    match panel.table().get(32) {
        Some(Element::Locomotive(l)) => assert_eq!(l.direction, Direction::Forward),
        other => panic!("expected locomotive, got {:?}", other),
    }
    assert!(panel.io().bus.sent.is_empty());
}

#[test]
fn show_key_changes_nothing() {
    let mut panel = panel();
    press(&mut panel, KEY_SHOW);
    assert_eq!(panel.table(), &factory_table().unwrap());
    assert!(panel.io().bus.sent.is_empty());
}

#[test]
fn keys_out_of_range() {
    let mut panel = panel();
    for key in [0, 51, 64, 255] {
        press(&mut panel, key);
    }
    assert_eq!(panel.table(), &factory_table().unwrap());
    assert!(panel.io().bus.sent.is_empty());
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn handheld_change_is_reflected() {
    let mut panel = panel();
    panel.startup().unwrap();
    panel.io_mut().bus.clear_sent();

    panel
        .io_mut()
        .bus
        .queue_event(BusEvent::SwitchRequest(SwitchNotice {
            address: 501,
            output_on: true,
            state: SwitchState::Thrown,
        }));
    panel.tick(&mut MockKeys::new()).unwrap();

    assert_eq!(switch_state(&panel, 501), SwitchState::Thrown);
    assert_eq!(panel.io().indicators.pin(0, SW501_PIN), Some(true));
    assert!(panel.io().bus.sent.is_empty());
}

#[test]
fn unknown_address_does_not_halt() {
    let mut panel = panel();
    panel.startup().unwrap();
    let before = panel.table().clone();

    panel.io_mut().bus.queue_event(BusEvent::SwitchState(SwitchNotice {
        address: 1999,
        output_on: false,
        state: SwitchState::Thrown,
    }));
    panel.io_mut().bus.queue_event(BusEvent::Power(false));

    panel.tick(&mut MockKeys::new()).unwrap();
    panel.tick(&mut MockKeys::new()).unwrap();

    assert_eq!(panel.table().get(49), Some(&Element::power(false)));
    assert_eq!(panel.table().as_slice()[..49], before.as_slice()[..49]);
}
