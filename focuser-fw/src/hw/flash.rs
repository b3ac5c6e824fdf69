// SPDX-License-Identifier: MIT

//! Settings persistence in the last on-chip flash sector.
//!
//! [`FlashStore`] keeps a RAM image of the settings bytes. Slot writes
//! only touch the image and mark it dirty; the foreground loop
//! snapshots a dirty image under the device lock and calls
//! [`write_image`] with interrupts running, so the slow sector erase
//! never blocks the tick handler.

use stm32f7xx_hal::pac;

use focuser_core::store::{
    NonVolatileStore, SERIAL_BLOB_LEN, SLOT_POSITION, SLOT_SERIAL, SLOT_TOPSPEED, STORE_LEN,
};

/// Base of flash sector 11 (256K), kept out of the code region by the
/// linker script.
pub const STORE_ADDR: u32 = 0x081C_0000;
const STORE_SECTOR: u8 = 11;

const FLASH_KEY1: u32 = 0x4567_0123;
const FLASH_KEY2: u32 = 0xCDEF_89AB;

pub struct FlashStore {
    image: [u8; STORE_LEN],
    dirty: bool,
}

impl FlashStore {
    /// Read the persisted image. An erased sector reads all 0xff, which
    /// the device init path normalizes.
    pub fn load() -> Self {
        let mut image = [0u8; STORE_LEN];
        let base = STORE_ADDR as *const u8;
        for (offset, byte) in image.iter_mut().enumerate() {
            *byte = unsafe { core::ptr::read_volatile(base.add(offset)) };
        }
        Self {
            image,
            dirty: false,
        }
    }

    /// Hand out the image and clear the dirty flag if anything changed
    /// since the last commit. Called under the device lock.
    pub fn take_dirty_image(&mut self) -> Option<[u8; STORE_LEN]> {
        if self.dirty {
            self.dirty = false;
            Some(self.image)
        } else {
            None
        }
    }

    /// The persisted serial-descriptor blob, for enumeration.
    pub fn serial_blob(&self) -> [u8; SERIAL_BLOB_LEN] {
        let mut blob = [0u8; SERIAL_BLOB_LEN];
        blob.copy_from_slice(&self.image[SLOT_SERIAL..SLOT_SERIAL + SERIAL_BLOB_LEN]);
        blob
    }
}

impl NonVolatileStore for FlashStore {
    fn read_position(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.image[SLOT_POSITION..SLOT_POSITION + 4]);
        u32::from_le_bytes(bytes)
    }

    fn write_position(&mut self, position: u32) {
        self.image[SLOT_POSITION..SLOT_POSITION + 4].copy_from_slice(&position.to_le_bytes());
        self.dirty = true;
    }

    fn read_topspeed(&mut self) -> u8 {
        self.image[SLOT_TOPSPEED]
    }

    fn write_topspeed(&mut self, value: u8) {
        self.image[SLOT_TOPSPEED] = value;
        self.dirty = true;
    }

    fn read_serial(&mut self) -> [u8; SERIAL_BLOB_LEN] {
        self.serial_blob()
    }

    fn write_serial(&mut self, blob: &[u8]) {
        let len = blob.len().min(SERIAL_BLOB_LEN);
        self.image[SLOT_SERIAL..SLOT_SERIAL + len].copy_from_slice(&blob[..len]);
        self.dirty = true;
    }
}

/// Erase the settings sector and program a fresh image. Must run in
/// the foreground, outside the device critical section.
pub fn write_image(image: &[u8; STORE_LEN]) {
    let flash = unsafe { &*pac::FLASH::ptr() };

    wait_idle(flash);
    unlock(flash);

    // Sector erase, x8 parallelism
    flash
        .cr
        .modify(|_, w| unsafe { w.psize().bits(0b00).ser().set_bit().snb().bits(STORE_SECTOR) });
    flash.cr.modify(|_, w| w.strt().set_bit());
    wait_idle(flash);
    flash.cr.modify(|_, w| w.ser().clear_bit());

    // Byte programming
    flash.cr.modify(|_, w| w.pg().set_bit());
    for (offset, &byte) in image.iter().enumerate() {
        let dst = (STORE_ADDR + offset as u32) as *mut u8;
        unsafe { core::ptr::write_volatile(dst, byte) };
        wait_idle(flash);
    }
    flash.cr.modify(|_, w| w.pg().clear_bit());

    flash.cr.modify(|_, w| w.lock().set_bit());
}

fn unlock(flash: &pac::flash::RegisterBlock) {
    if flash.cr.read().lock().bit_is_set() {
        flash.keyr.write(|w| unsafe { w.bits(FLASH_KEY1) });
        flash.keyr.write(|w| unsafe { w.bits(FLASH_KEY2) });
    }
}

fn wait_idle(flash: &pac::flash::RegisterBlock) {
    while flash.sr.read().bsy().bit_is_set() {}
}
