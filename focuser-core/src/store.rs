// SPDX-License-Identifier: MIT

//! Typed access to the non-volatile memory slots.
//!
//! Three fixed-offset slots exist: the motor position, the top-speed
//! setting, and the serial-number string descriptor blob. There is no
//! wear leveling; the callers (the save debounce and the control
//! protocol) are responsible for keeping the write frequency down.
//!
//! Writes from the foreground loop must run inside a critical section;
//! in practice the whole device lives behind [`crate::mutex::Mutex`],
//! which provides exactly that.

/// Byte offset of the position slot.
pub const SLOT_POSITION: usize = 0;
/// Byte offset of the top-speed slot.
pub const SLOT_TOPSPEED: usize = 4;
/// Byte offset of the serial-descriptor slot.
pub const SLOT_SERIAL: usize = 8;

/// Size of the serial-descriptor slot: a 2-byte descriptor header plus
/// seven UTF-16 code units.
pub const SERIAL_BLOB_LEN: usize = 16;

/// Total backing size of the store.
pub const STORE_LEN: usize = SLOT_SERIAL + SERIAL_BLOB_LEN;

/// Persistent storage for the three device slots.
pub trait NonVolatileStore {
    fn read_position(&mut self) -> u32;
    fn write_position(&mut self, position: u32);

    fn read_topspeed(&mut self) -> u8;
    fn write_topspeed(&mut self, value: u8);

    /// Read the serial-descriptor blob.
    fn read_serial(&mut self) -> [u8; SERIAL_BLOB_LEN];
    /// Write up to [`SERIAL_BLOB_LEN`] bytes of descriptor blob.
    fn write_serial(&mut self, blob: &[u8]);
}

/// Memory-backed store. Reference implementation for host tests, also
/// handy to run the device without persistence hardware.
#[derive(Clone)]
pub struct RamStore {
    data: [u8; STORE_LEN],
}

impl RamStore {
    /// Fresh store in the erased state (all 0xff, like blank flash or
    /// EEPROM), which the device init path normalizes.
    pub const fn new() -> Self {
        Self {
            data: [0xff; STORE_LEN],
        }
    }
}

impl Default for RamStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NonVolatileStore for RamStore {
    fn read_position(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[SLOT_POSITION..SLOT_POSITION + 4]);
        u32::from_le_bytes(bytes)
    }

    fn write_position(&mut self, position: u32) {
        self.data[SLOT_POSITION..SLOT_POSITION + 4].copy_from_slice(&position.to_le_bytes());
    }

    fn read_topspeed(&mut self) -> u8 {
        self.data[SLOT_TOPSPEED]
    }

    fn write_topspeed(&mut self, value: u8) {
        self.data[SLOT_TOPSPEED] = value;
    }

    fn read_serial(&mut self) -> [u8; SERIAL_BLOB_LEN] {
        let mut blob = [0u8; SERIAL_BLOB_LEN];
        blob.copy_from_slice(&self.data[SLOT_SERIAL..SLOT_SERIAL + SERIAL_BLOB_LEN]);
        blob
    }

    fn write_serial(&mut self, blob: &[u8]) {
        let len = blob.len().min(SERIAL_BLOB_LEN);
        self.data[SLOT_SERIAL..SLOT_SERIAL + len].copy_from_slice(&blob[..len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_do_not_alias() {
        let mut store = RamStore::new();
        store.write_position(0x0012_3456);
        store.write_topspeed(2);
        store.write_serial(&[0x06, 0x03, b'a', 0, b'b', 0]);
        assert_eq!(store.read_position(), 0x0012_3456);
        assert_eq!(store.read_topspeed(), 2);
        assert_eq!(&store.read_serial()[..6], &[0x06, 0x03, b'a', 0, b'b', 0]);
    }

    #[test]
    fn erased_store_reads_out_of_range() {
        let mut store = RamStore::new();
        assert!(store.read_position() > crate::motion::POSITION_MAX);
        assert!(store.read_topspeed() > crate::motion::TOP_SPEED_MAX);
    }
}
