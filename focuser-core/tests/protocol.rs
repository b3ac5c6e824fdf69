//! End-to-end tests driving the assembled device through the USB
//! control-request dispatcher, the way the firmware's USB glue does.

mod common;

use common::{Device, Fixture};
use focuser_core::motion::{IDLE_SAVE_TICKS, POSITION_DEFAULT, POSITION_MAX};
use focuser_core::protocol::messages::codes;
use focuser_core::protocol::{handle_control_in, handle_control_out, ControlRequestHeader};
use focuser_core::receiver;
use focuser_core::serial::decode_string_descriptor;
use focuser_core::store::NonVolatileStore;

fn send_set(dev: &mut Device, position: u32, fast: bool) {
    let header = ControlRequestHeader::vendor_out(codes::SET, 0, u16::from(fast), 4);
    handle_control_out(dev, &header, &position.to_le_bytes());
}

fn send_out(dev: &mut Device, code: u8, index: u16, data: &[u8]) {
    let header = ControlRequestHeader::vendor_out(code, 0, index, data.len() as u16);
    handle_control_out(dev, &header, data);
}

fn read_in(dev: &mut Device, code: u8, len: usize) -> Option<Vec<u8>> {
    let header = ControlRequestHeader::vendor_in(code, 0, 0, len as u16);
    let mut buf = [0u8; 16];
    let n = handle_control_in(dev, &header, &mut buf)?;
    Some(buf[..n].to_vec())
}

fn read_get(dev: &mut Device) -> (u32, u32, u16) {
    let response = read_in(dev, codes::GET, 10).unwrap();
    assert_eq!(response.len(), 10);
    let current = u32::from_le_bytes(response[0..4].try_into().unwrap());
    let target = u32::from_le_bytes(response[4..8].try_into().unwrap());
    let speed = u16::from_le_bytes(response[8..10].try_into().unwrap());
    (current, target, speed)
}

#[test]
fn startup_normalizes_erased_store() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.dev.current(), POSITION_DEFAULT);
    assert_eq!(fixture.dev.target(), POSITION_DEFAULT);
    assert_eq!(fixture.dev.topspeed(), 0);
    // normalized values were written back once
    assert_eq!(fixture.dev.store_mut().read_position(), POSITION_DEFAULT);
    assert_eq!(fixture.dev.store_mut().read_topspeed(), 0);
}

#[test]
fn set_moves_to_target_monotonically() {
    let mut fixture = Fixture::new();
    let target = POSITION_DEFAULT + 100;
    send_set(&mut fixture.dev, target, true);
    let (_, commanded, speed) = read_get(&mut fixture.dev);
    assert_eq!(commanded, target);
    assert_eq!(speed, 1);

    let mut previous = fixture.dev.current();
    for _ in 0..400 {
        fixture.dev.tick();
        let current = fixture.dev.current();
        assert!(current >= previous && current <= target);
        previous = current;
    }
    assert_eq!(fixture.dev.current(), target);
    assert_eq!(fixture.pulses(), 100);
}

#[test]
fn set_sentinels_and_garbage_rejected() {
    let mut fixture = Fixture::new();
    send_set(&mut fixture.dev, 0, false);
    send_set(&mut fixture.dev, POSITION_MAX, true);
    send_set(&mut fixture.dev, u32::MAX, true);
    // truncated payload
    send_out(&mut fixture.dev, codes::SET, 0, &[0x10, 0x00]);
    assert_eq!(fixture.dev.target(), POSITION_DEFAULT);
}

#[test]
fn stop_halts_immediately() {
    let mut fixture = Fixture::new();
    send_set(&mut fixture.dev, POSITION_DEFAULT + 5000, true);
    fixture.run_ticks(64);
    let reached = fixture.dev.current();
    assert_ne!(reached, fixture.dev.target());
    send_out(&mut fixture.dev, codes::STOP, 0, &[]);
    assert_eq!(fixture.dev.target(), reached);
    fixture.run_ticks(256);
    assert_eq!(fixture.dev.current(), reached);
}

#[test]
fn position_recalibrates_without_motion() {
    let mut fixture = Fixture::new();
    send_out(&mut fixture.dev, codes::POSITION, 0, &3000u32.to_le_bytes());
    assert_eq!(fixture.dev.current(), 3000);
    assert_eq!(fixture.dev.target(), 3000);
    assert_eq!(fixture.pulses(), 0);
    // persisted synchronously
    assert_eq!(fixture.dev.store_mut().read_position(), 3000);
    assert_eq!(read_in(&mut fixture.dev, codes::SAVED, 4).unwrap(), 3000u32.to_le_bytes());

    // out of range: no state change
    send_out(&mut fixture.dev, codes::POSITION, 0, &POSITION_MAX.to_le_bytes());
    assert_eq!(fixture.dev.current(), 3000);
}

#[test]
fn topspeed_round_trip_and_range_check() {
    let mut fixture = Fixture::new();
    send_out(&mut fixture.dev, codes::TOPSPEED, 0, &[2]);
    assert_eq!(read_in(&mut fixture.dev, codes::TOPSPEED, 1).unwrap(), [2]);
    assert_eq!(fixture.dev.store_mut().read_topspeed(), 2);

    send_out(&mut fixture.dev, codes::TOPSPEED, 0, &[9]);
    assert_eq!(read_in(&mut fixture.dev, codes::TOPSPEED, 1).unwrap(), [2]);
    assert_eq!(fixture.dev.store_mut().read_topspeed(), 2);
}

#[test]
fn position_save_is_debounced_to_idle() {
    let mut fixture = Fixture::new();
    let target = POSITION_DEFAULT + 10;
    send_set(&mut fixture.dev, target, true);
    fixture.run_ticks(40);
    assert_eq!(fixture.dev.current(), target);

    // settling for less than the threshold keeps the stored value
    fixture.dev.poll();
    assert_ne!(fixture.dev.store_mut().read_position(), target);

    fixture.run_ticks(IDLE_SAVE_TICKS + 1);
    fixture.dev.poll();
    assert_eq!(fixture.dev.store_mut().read_position(), target);
    assert_eq!(read_in(&mut fixture.dev, codes::SAVED, 4).unwrap(), target.to_le_bytes());
}

#[test]
fn serial_survives_reboot() {
    let mut fixture = Fixture::new();
    send_out(&mut fixture.dev, codes::SERIAL, 0, b"XY12Z");
    // staged, not yet committed
    assert!(decode_string_descriptor(&fixture.dev.store_mut().read_serial()).is_none());
    fixture.dev.poll();

    let store = fixture.dev.store_mut().clone();
    let mut rebooted = Fixture::with_store(store);
    let blob = rebooted.dev.store_mut().read_serial();
    assert_eq!(blob[0], 2 * 5 + 2);
    let (ascii, len) = decode_string_descriptor(&blob).unwrap();
    assert_eq!(&ascii[..len], b"XY12Z");
}

#[test]
fn lock_request_gates_receiver_and_indicator() {
    let mut fixture = Fixture::new();
    fixture.pins.set(receiver::BUTTON_A | receiver::VALID);
    send_out(&mut fixture.dev, codes::LOCK, 1, &[]);
    assert!(fixture.led.get());
    assert_eq!(
        read_in(&mut fixture.dev, codes::RCVR, 1).unwrap(),
        [receiver::BUTTON_A | receiver::VALID | receiver::LOCKED_FLAG]
    );
    // locked: the held button must not start a move
    fixture.run_ticks(4);
    assert_eq!(fixture.dev.target(), POSITION_DEFAULT);

    send_out(&mut fixture.dev, codes::LOCK, 0, &[]);
    assert!(!fixture.led.get());
    assert_eq!(
        read_in(&mut fixture.dev, codes::RCVR, 1).unwrap(),
        [receiver::BUTTON_A | receiver::VALID]
    );
}

#[test]
fn receiver_buttons_drive_the_motor() {
    let mut fixture = Fixture::new();
    fixture.pins.set(receiver::BUTTON_A);
    fixture.dev.tick();
    assert_eq!(fixture.dev.target(), POSITION_MAX);

    fixture.pins.set(0);
    fixture.dev.tick();
    assert_eq!(fixture.dev.target(), fixture.dev.current());
}

#[test]
fn unknown_and_misdirected_requests_are_ignored() {
    let mut fixture = Fixture::new();
    send_out(&mut fixture.dev, 42, 1, &[1, 2, 3, 4]);
    assert_eq!(fixture.dev.target(), POSITION_DEFAULT);
    assert!(read_in(&mut fixture.dev, 42, 4).is_none());

    // GET with a host-to-device header is not answered
    let header = ControlRequestHeader::vendor_out(codes::GET, 0, 0, 10);
    let mut buf = [0u8; 16];
    assert!(handle_control_in(&mut fixture.dev, &header, &mut buf).is_none());

    // class request to an interface never reaches the handlers
    let header = ControlRequestHeader::new(0x21, codes::STOP, 0, 0, 0);
    send_set(&mut fixture.dev, POSITION_DEFAULT + 1, false);
    handle_control_out(&mut fixture.dev, &header, &[]);
    assert_eq!(fixture.dev.target(), POSITION_DEFAULT + 1);
}

#[test]
fn reset_request_stops_watchdog_refresh() {
    let mut fixture = Fixture::new();
    assert!(fixture.dev.tick());
    send_out(&mut fixture.dev, codes::RESET, 0, &[]);
    assert!(fixture.dev.reset_pending());
    assert!(!fixture.dev.tick());
}
