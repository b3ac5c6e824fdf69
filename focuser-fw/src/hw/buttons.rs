// SPDX-License-Identifier: MIT

//! RF remote data lines as a receiver bit field.

use focuser_core::receiver::{self, ReceiverPins};

use super::pins::ReceiverLines;

pub struct ReceiverInputs {
    lines: ReceiverLines,
}

impl ReceiverInputs {
    pub fn new(lines: ReceiverLines) -> Self {
        Self { lines }
    }
}

impl ReceiverPins for ReceiverInputs {
    fn read(&self) -> u8 {
        let mut bits = 0;
        if self.lines.d1.is_high() {
            bits |= receiver::BUTTON_A;
        }
        if self.lines.d2.is_high() {
            bits |= receiver::BUTTON_B;
        }
        if self.lines.d3.is_high() {
            bits |= receiver::BUTTON_C;
        }
        if self.lines.d4.is_high() {
            bits |= receiver::BUTTON_D;
        }
        if self.lines.vt.is_high() {
            bits |= receiver::VALID;
        }
        bits
    }
}
