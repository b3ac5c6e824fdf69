// SPDX-License-Identifier: MIT

//! 1 kHz tick timer on TIM2.
//!
//! The interrupt handler lives in `main.rs` next to the device
//! singleton it drives; this module only owns the register setup.

use stm32f7xx_hal::pac;

/// APB1 timer clock with the 216 MHz clock tree.
const TIMER_HZ: u32 = 108_000_000;
/// Prescale to 1 MHz, then reload every 1000 counts for a 1 kHz tick.
const TICK_PSC: u16 = (TIMER_HZ / 1_000_000 - 1) as u16;
const TICK_ARR: u32 = 999;

pub fn start(tim: pac::TIM2) {
    // Clock the peripheral
    let rcc = unsafe { &*pac::RCC::ptr() };
    rcc.apb1enr.modify(|_, w| w.tim2en().set_bit());

    // Disable counter while configuring
    tim.cr1.modify(|_, w| w.cen().clear_bit());

    tim.psc.write(|w| w.psc().bits(TICK_PSC));
    tim.arr.write(|w| w.bits(TICK_ARR));

    // Reset the counter
    tim.cnt.write(|w| w.bits(0));

    // Update interrupt on reload
    tim.dier.modify(|_, w| w.uie().set_bit());

    // Enable the counter
    tim.cr1.modify(|_, w| w.cen().set_bit());

    unsafe { cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM2) };
}

/// Clear the update flag from inside the interrupt handler.
#[inline]
pub fn clear_irq() {
    let tim = unsafe { &*pac::TIM2::ptr() };
    tim.sr.modify(|_, w| w.uif().clear_bit());
}
