// SPDX-License-Identifier: MIT

//! RF remote receiver input.
//!
//! The receiver module exposes four button lines plus a valid line as a
//! 5-bit field. Sampling runs from the timer tick: a two-button hold
//! gesture toggles the lock, and button changes translate into move or
//! stop commands for the motor while the device is unlocked.

use crate::motion::{SpeedMode, POSITION_MAX};

/// Button A: move toward [`POSITION_MAX`].
pub const BUTTON_A: u8 = 0x01;
/// Button B: move toward 0.
pub const BUTTON_B: u8 = 0x02;
/// Button C: fast-speed modifier, and half of the lock gesture.
///
/// Source revisions disagreed on whether button C lives on bit 2 or
/// bit 3; bit 2 is fixed here deliberately.
pub const BUTTON_C: u8 = 0x04;
/// Button D: the other half of the lock gesture.
pub const BUTTON_D: u8 = 0x08;
/// Receiver valid line.
pub const VALID: u8 = 0x10;

/// Mask of the sampled input bits.
pub const INPUT_MASK: u8 = 0x1f;
/// Lock flag bit in the RCVR status byte.
pub const LOCKED_FLAG: u8 = 0x80;

/// Consecutive ticks C and D must be held together to toggle the lock
/// (two seconds at the 1 ms tick).
pub const UNLOCK_HOLD_TICKS: u16 = 2000;

/// 5-bit receiver input lines.
pub trait ReceiverPins {
    /// Sample the raw button state into the low five bits.
    fn read(&self) -> u8;
}

/// Lock indicator output (an LED on the reference board).
pub trait Indicator {
    fn set(&mut self, on: bool);
}

/// Motor command derived from a button state change.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiverCommand {
    MoveTo { position: u32, speed: SpeedMode },
    Stop,
}

/// Receiver sampling state machine.
pub struct Receiver<P, I> {
    pins: P,
    indicator: I,
    locked: bool,
    last: u8,
    hold_ticks: u16,
}

impl<P: ReceiverPins, I: Indicator> Receiver<P, I> {
    pub fn new(pins: P, indicator: I) -> Self {
        Self {
            pins,
            indicator,
            locked: false,
            last: 0,
            hold_ticks: 0,
        }
    }

    /// RCVR status byte: the raw 5-bit input with the lock flag in
    /// bit 7.
    pub fn status(&self) -> u8 {
        let mut status = self.pins.read() & INPUT_MASK;
        if self.locked {
            status |= LOCKED_FLAG;
        }
        status
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Disable receiver-driven focus changes and turn the indicator on.
    pub fn lock(&mut self) {
        self.set_locked(true);
    }

    /// Re-enable receiver-driven focus changes.
    pub fn unlock(&mut self) {
        self.set_locked(false);
    }

    fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
        self.indicator.set(locked);
    }

    /// Sample the buttons once per timer tick.
    ///
    /// Holding C and D together for [`UNLOCK_HOLD_TICKS`] toggles the
    /// lock when the gesture is released. Otherwise, a change of the
    /// button state yields a command while unlocked: A moves toward the
    /// top, B toward the bottom, both or neither stops, and C selects
    /// fast speed.
    pub fn sample(&mut self) -> Option<ReceiverCommand> {
        let now = self.pins.read() & INPUT_MASK;
        if now & (BUTTON_C | BUTTON_D) == (BUTTON_C | BUTTON_D) {
            self.hold_ticks = self.hold_ticks.saturating_add(1);
            self.last = now;
            return None;
        }
        if self.hold_ticks > UNLOCK_HOLD_TICKS {
            self.set_locked(!self.locked);
        }
        self.hold_ticks = 0;
        if now == self.last {
            return None;
        }
        self.last = now;
        if self.locked {
            return None;
        }
        let speed = if now & BUTTON_C != 0 {
            SpeedMode::Fast
        } else {
            SpeedMode::Slow
        };
        Some(match now & (BUTTON_A | BUTTON_B) {
            BUTTON_A => ReceiverCommand::MoveTo {
                position: POSITION_MAX,
                speed,
            },
            BUTTON_B => ReceiverCommand::MoveTo { position: 0, speed },
            _ => ReceiverCommand::Stop,
        })
    }
}
