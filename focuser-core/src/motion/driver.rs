// SPDX-License-Identifier: MIT

//! Interface to the stepper driver hardware.
//!
//! The motion state machine only ever touches the motor through this
//! trait, which keeps it unit-testable on a host and independent of the
//! GPIO abstraction the target platform offers.

/// Direction of travel. [`Direction::Up`] is the direction that
/// increments the position counter (direction line driven high).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Up,
    Down,
}

/// Microstep granularity, encoded as the MS1..MS3 input pattern of an
/// A4988-style driver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StepMode {
    Full = 0x0,
    Half = 0x1,
    Quarter = 0x2,
    Eighth = 0x3,
    Sixteenth = 0x7,
}

impl StepMode {
    /// MS1..MS3 bit pattern for this mode (MS1 = bit 0).
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Number of electrical microsteps per full motor step.
    pub const fn microsteps(self) -> u8 {
        match self {
            Self::Full => 1,
            Self::Half => 2,
            Self::Quarter => 4,
            Self::Eighth => 8,
            Self::Sixteenth => 16,
        }
    }
}

/// Capability interface to the stepper driver pins.
pub trait StepperDriver {
    /// Drive the direction line. Called before the pulse whenever the
    /// direction changes.
    fn set_direction(&mut self, direction: Direction);

    /// Emit one step pulse (rising then falling edge on the STEP line).
    fn pulse(&mut self);

    /// Select the microstep granularity on the MS1..MS3 lines.
    fn set_step_mode(&mut self, mode: StepMode);
}
