// SPDX-License-Identifier: MIT

//! Pin assignment for the focuser board (Nucleo-F767ZI wiring).

use stm32f7xx_hal::{
    gpio::{gpioa, gpiob, gpioc, gpiod, Alternate, Floating, Input, Output, PushPull},
    pac,
    prelude::*,
};

pub struct BoardPins {
    pub motor: MotorPins,
    pub receiver: ReceiverLines,
    pub led: LedPin,
    pub usb: UsbPins,
}

/// A4988 control lines.
pub struct MotorPins {
    pub step: gpiob::PB5<Output<PushPull>>,
    pub dir: gpiob::PB4<Output<PushPull>>,
    pub enable: gpioc::PC2<Output<PushPull>>, // active low
    pub sleep: gpiob::PB6<Output<PushPull>>,
    pub reset: gpiob::PB8<Output<PushPull>>,
    pub ms1: gpioc::PC4<Output<PushPull>>,
    pub ms2: gpioc::PC5<Output<PushPull>>,
    pub ms3: gpioc::PC6<Output<PushPull>>,
}

/// Data lines from the RF remote decoder, active high.
pub struct ReceiverLines {
    pub d1: gpiod::PD3<Input<Floating>>,
    pub d2: gpiod::PD4<Input<Floating>>,
    pub d3: gpiod::PD5<Input<Floating>>,
    pub d4: gpiod::PD6<Input<Floating>>,
    pub vt: gpiod::PD7<Input<Floating>>,
}

/// On-board green LED (LD1).
pub type LedPin = gpiob::PB0<Output<PushPull>>;

pub struct UsbPins {
    pub dm: gpioa::PA11<Alternate<10>>,
    pub dp: gpioa::PA12<Alternate<10>>,
}

impl BoardPins {
    pub fn new(gpioa: pac::GPIOA, gpiob: pac::GPIOB, gpioc: pac::GPIOC, gpiod: pac::GPIOD) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpioc = gpioc.split();
        let gpiod = gpiod.split();

        Self {
            motor: MotorPins {
                step: gpiob.pb5.into_push_pull_output(),
                dir: gpiob.pb4.into_push_pull_output(),
                enable: gpioc.pc2.into_push_pull_output(),
                sleep: gpiob.pb6.into_push_pull_output(),
                reset: gpiob.pb8.into_push_pull_output(),
                ms1: gpioc.pc4.into_push_pull_output(),
                ms2: gpioc.pc5.into_push_pull_output(),
                ms3: gpioc.pc6.into_push_pull_output(),
            },

            receiver: ReceiverLines {
                d1: gpiod.pd3.into_floating_input(),
                d2: gpiod.pd4.into_floating_input(),
                d3: gpiod.pd5.into_floating_input(),
                d4: gpiod.pd6.into_floating_input(),
                vt: gpiod.pd7.into_floating_input(),
            },

            led: gpiob.pb0.into_push_pull_output(),

            usb: UsbPins {
                dm: gpioa.pa11.into_alternate::<10>(),
                dp: gpioa.pa12.into_alternate::<10>(),
            },
        }
    }
}
