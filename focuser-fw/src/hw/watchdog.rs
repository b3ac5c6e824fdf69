// SPDX-License-Identifier: MIT

//! Independent watchdog.
//!
//! Armed once at startup and refreshed from the tick handler for as
//! long as the device allows it. A host RESET request stops the
//! refreshes and the starved watchdog reboots the chip.

use stm32f7xx_hal::pac;

const KEY_ACCESS: u32 = 0x5555;
const KEY_START: u32 = 0xCCCC;
const KEY_REFRESH: u32 = 0xAAAA;

/// LSI 32 kHz / 256 = 125 Hz counter clock.
const PRESCALER_DIV256: u32 = 0b110;
/// 625 counts at 125 Hz is a 5 s timeout; it must outlast a
/// settings-sector erase in the foreground.
const RELOAD: u32 = 625;

pub fn start(iwdg: pac::IWDG) {
    iwdg.kr.write(|w| unsafe { w.bits(KEY_ACCESS) });
    iwdg.pr.write(|w| unsafe { w.bits(PRESCALER_DIV256) });
    iwdg.rlr.write(|w| unsafe { w.bits(RELOAD) });
    iwdg.kr.write(|w| unsafe { w.bits(KEY_START) });
    iwdg.kr.write(|w| unsafe { w.bits(KEY_REFRESH) });
}

/// Reload the counter. Called from the tick handler.
#[inline]
pub fn refresh() {
    let iwdg = unsafe { &*pac::IWDG::ptr() };
    iwdg.kr.write(|w| unsafe { w.bits(KEY_REFRESH) });
}
