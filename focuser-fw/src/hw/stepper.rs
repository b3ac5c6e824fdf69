// SPDX-License-Identifier: MIT

//! A4988 stepper driver behind the motion controller's driver trait.

use cortex_m::asm;
use focuser_core::motion::driver::{Direction, StepMode, StepperDriver};

use super::pins::MotorPins;

/// STEP high time in core cycles. The driver wants at least 1 us.
const STEP_PULSE_CYCLES: u32 = 300;

pub struct A4988 {
    pins: MotorPins,
}

impl A4988 {
    /// Take the driver out of sleep and reset, enable the outputs and
    /// leave it in full-step mode.
    pub fn new(mut pins: MotorPins) -> Self {
        pins.enable.set_low();
        pins.sleep.set_high();
        pins.reset.set_high();
        pins.step.set_low();
        pins.dir.set_low();
        let mut driver = Self { pins };
        driver.set_step_mode(StepMode::Full);
        driver
    }
}

impl StepperDriver for A4988 {
    fn set_direction(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.pins.dir.set_high(),
            Direction::Down => self.pins.dir.set_low(),
        }
    }

    fn pulse(&mut self) {
        self.pins.step.set_high();
        asm::delay(STEP_PULSE_CYCLES);
        self.pins.step.set_low();
    }

    fn set_step_mode(&mut self, mode: StepMode) {
        let bits = mode.bits();
        if bits & 0b001 != 0 {
            self.pins.ms1.set_high()
        } else {
            self.pins.ms1.set_low()
        }
        if bits & 0b010 != 0 {
            self.pins.ms2.set_high()
        } else {
            self.pins.ms2.set_low()
        }
        if bits & 0b100 != 0 {
            self.pins.ms3.set_high()
        } else {
            self.pins.ms3.set_low()
        }
    }
}
