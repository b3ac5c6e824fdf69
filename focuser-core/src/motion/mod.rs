// SPDX-License-Identifier: MIT

//! Stepper motion state machine.
//!
//! [`Motor`] owns the current/target position pair, the commanded speed
//! mode and the microstep phase, and is advanced once per timer tick by
//! [`Motor::tick`]. The host software detects whether the motor is
//! moving by checking whether target and current position differ; there
//! is no separate status bit.
//!
//! The idle/save debounce counter also lives here: once the position
//! has been unchanged for [`IDLE_SAVE_TICKS`] ticks, the value to be
//! persisted is latched and a save flag is raised for the foreground
//! loop to act on.

pub mod driver;

use driver::{Direction, StepMode, StepperDriver};

/// Largest commandable position. The value itself is reserved as a
/// "do nothing" sentinel at the protocol boundary, as is 0.
pub const POSITION_MAX: u32 = 0xFF_FFFE;

/// Position assumed when the persisted value is missing or out of
/// range (mid-travel).
pub const POSITION_DEFAULT: u32 = 0x80_0000;

/// Ticks the position must stay unchanged before it is persisted
/// (about two minutes at the 1 ms tick).
pub const IDLE_SAVE_TICKS: u32 = 120_000;

/// Microstep phase positions per full step.
const MICROSTEPS_PER_STEP: u8 = 16;

/// Ticks between phase advances in fast mode.
const DIVISOR_FAST: u8 = 2;
/// Ticks between phase advances in slow mode.
const DIVISOR_SLOW: u8 = 16;

/// Coarse speed selection carried by move commands.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpeedMode {
    Slow = 0,
    Fast = 1,
}

/// Largest valid raw top-speed setting.
pub const TOP_SPEED_MAX: u8 = 3;

/// Persisted top-speed setting, 0..=3. Selects the step granularity
/// used in fast mode; slow mode always runs at sixteenth resolution.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TopSpeed(u8);

impl TopSpeed {
    pub const DEFAULT: Self = Self(0);

    /// Validate a raw persisted byte. Values above [`TOP_SPEED_MAX`]
    /// are rejected.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        if raw <= TOP_SPEED_MAX {
            Some(Self(raw))
        } else {
            None
        }
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Microstep phase increment applied per divisor expiry in fast
    /// mode: 16, 8, 4 or 2 for settings 0..=3.
    pub const fn phase_increment(self) -> u8 {
        MICROSTEPS_PER_STEP >> self.0
    }

    /// Driver granularity matching [`Self::phase_increment`].
    pub const fn step_mode(self) -> StepMode {
        match self.0 {
            0 => StepMode::Full,
            1 => StepMode::Half,
            2 => StepMode::Quarter,
            _ => StepMode::Eighth,
        }
    }
}

/// Stepper motion controller.
///
/// Not interrupt-safe by itself: the owning device is expected to live
/// behind a critical-section mutex, so that foreground mutations are
/// serialized against the tick handler.
pub struct Motor<D> {
    driver: D,
    current: u32,
    target: u32,
    speed: SpeedMode,
    top_speed: TopSpeed,
    /// Microstep phase, always in 0..16.
    microstep: u8,
    /// Phase increment per divisor expiry for the commanded speed.
    stepsize: u8,
    /// Tick countdown until the next phase advance.
    divisor: u8,
    idle_ticks: u32,
    lastsaved: u32,
    save_needed: bool,
}

impl<D: StepperDriver> Motor<D> {
    /// Build the controller around a driver, with both position copies
    /// set to `position` so nothing moves until commanded.
    pub fn new(mut driver: D, position: u32) -> Self {
        driver.set_step_mode(StepMode::Sixteenth);
        Self {
            driver,
            current: position,
            target: position,
            speed: SpeedMode::Slow,
            top_speed: TopSpeed::DEFAULT,
            microstep: 0,
            stepsize: 1,
            divisor: DIVISOR_SLOW,
            idle_ticks: 0,
            lastsaved: position,
            save_needed: false,
        }
    }

    /// Update the cached top-speed setting used by fast moves.
    pub fn set_top_speed(&mut self, top_speed: TopSpeed) {
        self.top_speed = top_speed;
    }

    /// Command a move. Bounds checking is the protocol layer's job,
    /// not this call's. Resets the microstep phase and, for fast mode,
    /// recomputes the step granularity from the top-speed setting.
    pub fn moveto(&mut self, position: u32, speed: SpeedMode) {
        self.target = position;
        self.speed = speed;
        self.microstep = 0;
        match speed {
            SpeedMode::Slow => {
                self.stepsize = 1;
                self.divisor = DIVISOR_SLOW;
                self.driver.set_step_mode(StepMode::Sixteenth);
            }
            SpeedMode::Fast => {
                self.stepsize = self.top_speed.phase_increment();
                self.divisor = DIVISOR_FAST;
                self.driver.set_step_mode(self.top_speed.step_mode());
            }
        }
    }

    /// Stop by setting the target to the current counter state, which
    /// implies that there is no need to step any further. Idempotent.
    pub fn stop(&mut self) {
        self.target = self.current;
    }

    /// Force both position copies to `position` without emitting any
    /// pulses (recalibration after physical re-homing). The caller is
    /// expected to persist the new value synchronously, so the saved
    /// copy is latched here as well.
    pub fn set_position(&mut self, position: u32) {
        self.current = position;
        self.target = position;
        self.microstep = 0;
        self.lastsaved = position;
        self.save_needed = false;
    }

    /// Advance the state machine by one timer period. Interrupt
    /// context only.
    pub fn tick(&mut self) {
        if self.current == self.target {
            if self.idle_ticks < u32::MAX {
                self.idle_ticks += 1;
            }
            if self.idle_ticks == IDLE_SAVE_TICKS && self.lastsaved != self.current {
                self.lastsaved = self.current;
                self.save_needed = true;
            }
            return;
        }
        self.idle_ticks = 0;
        self.divisor -= 1;
        if self.divisor != 0 {
            return;
        }
        self.divisor = match self.speed {
            SpeedMode::Fast => DIVISOR_FAST,
            SpeedMode::Slow => DIVISOR_SLOW,
        };
        self.microstep += self.stepsize;
        if self.microstep < MICROSTEPS_PER_STEP {
            return;
        }
        // phase wrapped through a full step boundary: one pulse
        self.microstep -= MICROSTEPS_PER_STEP;
        if self.target > self.current {
            self.driver.set_direction(Direction::Up);
            self.driver.pulse();
            self.current += 1;
        } else {
            self.driver.set_direction(Direction::Down);
            self.driver.pulse();
            self.current -= 1;
        }
    }

    #[inline]
    pub fn current(&self) -> u32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> u32 {
        self.target
    }

    #[inline]
    pub fn speed(&self) -> SpeedMode {
        self.speed
    }

    /// Last value durably written (or latched for writing).
    #[inline]
    pub fn lastsaved(&self) -> u32 {
        self.lastsaved
    }

    /// True once the idle debounce has latched a value that still needs
    /// to go to non-volatile memory.
    #[inline]
    pub fn save_needed(&self) -> bool {
        self.save_needed
    }

    /// Acknowledge a completed save. Called by the foreground loop
    /// right after the store write, inside the same critical section.
    pub fn mark_saved(&mut self) {
        self.save_needed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TracePins {
        pulses: u32,
        direction: Option<Direction>,
        mode: Option<StepMode>,
    }

    impl StepperDriver for TracePins {
        fn set_direction(&mut self, direction: Direction) {
            self.direction = Some(direction);
        }
        fn pulse(&mut self) {
            self.pulses += 1;
        }
        fn set_step_mode(&mut self, mode: StepMode) {
            self.mode = Some(mode);
        }
    }

    fn run(motor: &mut Motor<TracePins>, ticks: u32) {
        for _ in 0..ticks {
            motor.tick();
        }
    }

    #[test]
    fn slow_move_reaches_target_without_overshoot() {
        let mut motor = Motor::new(TracePins::default(), 100);
        motor.moveto(103, SpeedMode::Slow);
        let mut previous = motor.current();
        for _ in 0..4096 {
            motor.tick();
            assert!(motor.current() >= previous);
            assert!(motor.current() <= 103);
            previous = motor.current();
        }
        assert_eq!(motor.current(), 103);
        assert_eq!(motor.target(), 103);
        assert_eq!(motor.driver.pulses, 3);
    }

    #[test]
    fn slow_step_period_is_divisor_times_phase() {
        let mut motor = Motor::new(TracePins::default(), 0);
        motor.moveto(10, SpeedMode::Slow);
        // 16 phase advances of 1, one every 16 ticks
        run(&mut motor, 255);
        assert_eq!(motor.current(), 0);
        motor.tick();
        assert_eq!(motor.current(), 1);
    }

    #[test]
    fn fast_full_step_pulses_every_other_tick() {
        let mut motor = Motor::new(TracePins::default(), 500);
        motor.set_top_speed(TopSpeed::from_raw(0).unwrap());
        motor.moveto(490, SpeedMode::Fast);
        assert_eq!(motor.driver.mode, Some(StepMode::Full));
        run(&mut motor, 20);
        assert_eq!(motor.current(), 490);
        assert_eq!(motor.driver.direction, Some(Direction::Down));
        assert_eq!(motor.driver.pulses, 10);
    }

    #[test]
    fn top_speed_scales_fast_rate() {
        let mut motor = Motor::new(TracePins::default(), 0);
        motor.set_top_speed(TopSpeed::from_raw(3).unwrap());
        motor.moveto(100, SpeedMode::Fast);
        assert_eq!(motor.driver.mode, Some(StepMode::Eighth));
        // increment 2 per expiry, expiry every 2 ticks: one step per 16 ticks
        run(&mut motor, 16);
        assert_eq!(motor.current(), 1);
    }

    #[test]
    fn stop_pins_target_to_current() {
        let mut motor = Motor::new(TracePins::default(), 0);
        motor.moveto(1000, SpeedMode::Fast);
        run(&mut motor, 50);
        let reached = motor.current();
        assert!(reached > 0 && reached < 1000);
        motor.stop();
        assert_eq!(motor.target(), reached);
        run(&mut motor, 100);
        assert_eq!(motor.current(), reached);
    }

    #[test]
    fn set_position_moves_nothing() {
        let mut motor = Motor::new(TracePins::default(), 10);
        motor.set_position(12345);
        assert_eq!(motor.current(), 12345);
        assert_eq!(motor.target(), 12345);
        assert_eq!(motor.lastsaved(), 12345);
        assert!(!motor.save_needed());
        assert_eq!(motor.driver.pulses, 0);
    }

    #[test]
    fn save_latch_fires_once_after_idle_threshold() {
        let mut motor = Motor::new(TracePins::default(), 0);
        motor.moveto(1, SpeedMode::Fast);
        run(&mut motor, 2);
        assert_eq!(motor.current(), 1);
        run(&mut motor, IDLE_SAVE_TICKS - 1);
        assert!(!motor.save_needed());
        motor.tick();
        assert!(motor.save_needed());
        assert_eq!(motor.lastsaved(), 1);
        motor.mark_saved();
        // counter keeps running past the threshold without re-latching
        run(&mut motor, 10_000);
        assert!(!motor.save_needed());
    }

    #[test]
    fn no_save_latch_while_moving() {
        let mut motor = Motor::new(TracePins::default(), 0);
        motor.moveto(1_000_000, SpeedMode::Slow);
        run(&mut motor, IDLE_SAVE_TICKS + 10);
        assert!(!motor.save_needed());
    }

    #[test]
    fn top_speed_raw_bounds() {
        assert!(TopSpeed::from_raw(3).is_some());
        assert!(TopSpeed::from_raw(4).is_none());
        assert_eq!(TopSpeed::from_raw(1).unwrap().phase_increment(), 8);
    }
}
