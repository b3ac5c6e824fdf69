// SPDX-License-Identifier: MIT

//! Firmware entry point for the USB focuser.
//!
//! Startup order: blink the LED, load the settings sector, build the
//! device behind the global lock, bring up USB with the persisted
//! serial number, then arm the tick timer and the watchdog. The
//! foreground loop services USB and commits deferred non-volatile
//! writes; everything time-critical runs in the TIM2 handler.

#![no_main]
#![no_std]
#![allow(dead_code)]

use cortex_m::asm;
use cortex_m_rt::entry;
use defmt_rtt as _;
use panic_halt as _;

use hal::{
    otg_fs::{UsbBus, USB},
    pac::{self, interrupt},
    prelude::*,
    rcc::{HSEClock, HSEClockMode, PLL48CLK},
};
use stm32f7xx_hal as hal;

use usb_device::prelude::*;

use focuser_core::{mutex::Mutex, serial, Focuser, USB_PID, USB_VID};

mod hw;
mod usb;

use hw::{BoardPins, FlashStore, Led, ReceiverInputs, A4988};

pub type Device = Focuser<A4988, FlashStore, ReceiverInputs, Led>;

/// The whole device behind one lock; the tick interrupt, the USB
/// control handlers and the foreground loop all go through it.
pub static FOCUSER: Mutex<Option<Device>> = Mutex::new(None);

/// Startup blink phase, 100 ms at 216 MHz.
const BLINK_CYCLES: u32 = 21_600_000;

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();

    // Clocks: 216 MHz off the 8 MHz ST-LINK clock, PLL48 for USB
    let rcc = dp.RCC.constrain();
    let clocks = rcc
        .cfgr
        .hse(HSEClock::new(8_000_000.Hz(), HSEClockMode::Bypass))
        .use_pll()
        .use_pll48clk(PLL48CLK::Pllq)
        .sysclk(216_000_000.Hz())
        .freeze();

    let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD);

    let mut led = Led::new(pins.led);
    for _ in 0..3 {
        led.on();
        asm::delay(BLINK_CYCLES);
        led.off();
        asm::delay(BLINK_CYCLES);
    }

    let store = FlashStore::load();

    // Serial number for enumeration, from the persisted descriptor
    let mut serial_ascii = [0u8; serial::SERIAL_MAX_CHARS];
    let serial_len = match serial::decode_string_descriptor(&store.serial_blob()) {
        Some((ascii, len)) => {
            serial_ascii[..len].copy_from_slice(&ascii[..len]);
            len
        }
        None => 0,
    };
    let serial_str = core::str::from_utf8(&serial_ascii[..serial_len]).unwrap_or("");

    let device = Focuser::new(
        A4988::new(pins.motor),
        store,
        ReceiverInputs::new(pins.receiver),
        led,
    );
    FOCUSER.lock(|slot| *slot = Some(device));

    let usb = USB::new(
        dp.OTG_FS_GLOBAL,
        dp.OTG_FS_DEVICE,
        dp.OTG_FS_PWRCLK,
        (pins.usb.dm, pins.usb.dp),
        &clocks,
    );
    let ep_memory: &'static mut [u32] =
        cortex_m::singleton!(: [u32; 1024] = [0; 1024]).unwrap();
    let usb_bus = UsbBus::new(usb, ep_memory);
    let mut focuser_class = usb::FocuserClass;
    let mut usb_dev = UsbDeviceBuilder::new(&usb_bus, UsbVidPid(USB_VID, USB_PID))
        .manufacturer("nightpath")
        .product("USB focus motor")
        .serial_number(serial_str)
        .build();

    hw::tick::start(dp.TIM2);
    hw::watchdog::start(dp.IWDG);

    defmt::info!(
        "focuser up, position {=u32}",
        FOCUSER.lock(|dev| dev.as_ref().map_or(0, |dev| dev.current()))
    );

    let mut reset_logged = false;
    loop {
        usb_dev.poll(&mut [&mut focuser_class]);

        if !reset_logged
            && FOCUSER.lock(|dev| dev.as_ref().map_or(false, |dev| dev.reset_pending()))
        {
            defmt::info!("reset requested, watchdog refresh stopped");
            reset_logged = true;
        }

        // Deferred non-volatile work: take a snapshot under the lock,
        // do the slow flash write with interrupts running.
        let image = FOCUSER.lock(|device| {
            let device = device.as_mut()?;
            device.poll();
            device.store_mut().take_dirty_image()
        });
        if let Some(image) = image {
            hw::flash::write_image(&image);
            defmt::info!("settings committed");
        }
    }
}

#[interrupt]
fn TIM2() {
    hw::tick::clear_irq();
    let refresh = FOCUSER.lock(|device| device.as_mut().map_or(false, |device| device.tick()));
    if refresh {
        hw::watchdog::refresh();
    }
}
