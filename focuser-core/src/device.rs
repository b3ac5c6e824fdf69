// SPDX-License-Identifier: MIT

//! The assembled focuser device.
//!
//! [`Focuser`] owns the motion controller, the store, the receiver and
//! the pending-serial staging area, and provides the three entry points
//! the firmware wires up:
//!
//! - [`Focuser::new`]: explicit ordered startup (read and normalize
//!   persisted state, then build the motor around it); no implicit
//!   load-time side effects.
//! - [`Focuser::tick`]: the timer-interrupt body. Advances the motor,
//!   samples the receiver, reports whether the watchdog may be
//!   refreshed.
//! - [`Focuser::poll`]: the foreground body. Commits a debounced
//!   position save or a staged serial number.
//!
//! The whole struct is meant to sit behind [`crate::mutex::Mutex`];
//! every entry point then runs inside one critical section, which is
//! what the concurrency model of the device requires.

use crate::motion::driver::StepperDriver;
use crate::motion::{Motor, SpeedMode, TopSpeed, POSITION_DEFAULT, POSITION_MAX};
use crate::receiver::{Indicator, Receiver, ReceiverCommand, ReceiverPins};
use crate::serial::{encode_string_descriptor, SerialStaging};
use crate::store::{NonVolatileStore, SERIAL_BLOB_LEN};

pub struct Focuser<D, S, P, I> {
    motor: Motor<D>,
    store: S,
    receiver: Receiver<P, I>,
    serial: SerialStaging,
    topspeed: TopSpeed,
    /// While true the tick handler keeps the watchdog alive; RESET
    /// clears it, and the starved watchdog reboots the device.
    watchdog_gate: bool,
}

impl<D, S, P, I> Focuser<D, S, P, I>
where
    D: StepperDriver,
    S: NonVolatileStore,
    P: ReceiverPins,
    I: Indicator,
{
    /// Ordered startup. Persisted values outside their valid range
    /// (e.g. a factory-erased store) are normalized and written back
    /// once.
    pub fn new(driver: D, mut store: S, pins: P, indicator: I) -> Self {
        let mut position = store.read_position();
        if position > POSITION_MAX {
            position = POSITION_DEFAULT;
            store.write_position(position);
        }
        let topspeed = match TopSpeed::from_raw(store.read_topspeed()) {
            Some(topspeed) => topspeed,
            None => {
                store.write_topspeed(TopSpeed::DEFAULT.raw());
                TopSpeed::DEFAULT
            }
        };
        let mut motor = Motor::new(driver, position);
        motor.set_top_speed(topspeed);
        Self {
            motor,
            store,
            receiver: Receiver::new(pins, indicator),
            serial: SerialStaging::new(),
            topspeed,
            watchdog_gate: true,
        }
    }

    /// Timer-interrupt entry point, once per tick. Returns whether the
    /// caller should refresh the watchdog.
    pub fn tick(&mut self) -> bool {
        self.motor.tick();
        if let Some(command) = self.receiver.sample() {
            match command {
                ReceiverCommand::MoveTo { position, speed } => self.motor.moveto(position, speed),
                ReceiverCommand::Stop => self.motor.stop(),
            }
        }
        self.watchdog_gate
    }

    /// Foreground entry point. Non-volatile writes happen here, never
    /// in the tick handler, to bound interrupt latency.
    pub fn poll(&mut self) {
        if self.motor.save_needed() {
            self.store.write_position(self.motor.lastsaved());
            self.motor.mark_saved();
        }
        if self.serial.pending() {
            let mut blob = [0u8; SERIAL_BLOB_LEN];
            let size = encode_string_descriptor(self.serial.ascii(), &mut blob);
            self.store.write_serial(&blob[..size]);
            self.serial.clear_pending();
        }
    }

    pub fn moveto(&mut self, position: u32, speed: SpeedMode) {
        self.motor.moveto(position, speed);
    }

    pub fn stop(&mut self) {
        self.motor.stop();
    }

    /// Force-set the position after physical re-homing and persist it
    /// synchronously.
    pub fn recalibrate(&mut self, position: u32) {
        self.motor.set_position(position);
        self.store.write_position(position);
    }

    pub fn lock(&mut self) {
        self.receiver.lock();
    }

    pub fn unlock(&mut self) {
        self.receiver.unlock();
    }

    pub fn stage_serial(&mut self, data: &[u8]) {
        self.serial.stage(data);
    }

    /// Accept a new top-speed setting; out-of-range values are
    /// silently ignored.
    pub fn set_topspeed(&mut self, raw: u8) {
        if let Some(topspeed) = TopSpeed::from_raw(raw) {
            self.store.write_topspeed(raw);
            self.topspeed = topspeed;
            self.motor.set_top_speed(topspeed);
        }
    }

    /// Cached top-speed byte.
    #[inline]
    pub fn topspeed(&self) -> u8 {
        self.topspeed.raw()
    }

    /// Stop refreshing the watchdog; the device reboots within one
    /// watchdog period.
    pub fn initiate_reset(&mut self) {
        self.watchdog_gate = false;
    }

    #[inline]
    pub fn reset_pending(&self) -> bool {
        !self.watchdog_gate
    }

    #[inline]
    pub fn current(&self) -> u32 {
        self.motor.current()
    }

    #[inline]
    pub fn target(&self) -> u32 {
        self.motor.target()
    }

    #[inline]
    pub fn speed(&self) -> SpeedMode {
        self.motor.speed()
    }

    #[inline]
    pub fn lastsaved(&self) -> u32 {
        self.motor.lastsaved()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.receiver.is_locked()
    }

    pub fn receiver_status(&self) -> u8 {
        self.receiver.status()
    }

    /// Access to the store, for the firmware boot path (serial
    /// descriptor readback).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
