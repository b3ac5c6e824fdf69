//! On-board LED, used for the startup blink and as the lock indicator.

use focuser_core::receiver::Indicator;

use super::pins::LedPin;

pub struct Led {
    pin: LedPin,
    is_on: bool,
}

impl Led {
    /// Wrap the pin, initializing the LED to OFF.
    pub fn new(mut pin: LedPin) -> Self {
        pin.set_low();
        Self { pin, is_on: false }
    }

    pub fn set(&mut self, on: bool) {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        self.is_on = on;
    }

    #[inline]
    pub fn on(&mut self) {
        self.set(true);
    }

    #[inline]
    pub fn off(&mut self) {
        self.set(false);
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }
}

impl Indicator for Led {
    fn set(&mut self, on: bool) {
        Led::set(self, on);
    }
}
