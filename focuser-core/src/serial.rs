// SPDX-License-Identifier: MIT

//! Persisted serial-number handling.
//!
//! The serial number is stored as a ready-to-send USB string descriptor
//! (size byte, type byte 0x03, UTF-16LE code units) so the firmware can
//! hand the blob to the USB stack unmodified at enumeration time.
//!
//! The SERIAL control request only stages the raw ASCII bytes; the
//! conversion and the store write happen later in the foreground loop,
//! never inside the transfer handler, to keep the handler free of
//! non-volatile write latency.

use crate::store::SERIAL_BLOB_LEN;

/// Maximum serial-number length in characters.
pub const SERIAL_MAX_CHARS: usize = 7;

/// USB descriptor type byte for string descriptors.
pub const DESCRIPTOR_TYPE_STRING: u8 = 0x03;

/// Encode an ASCII serial number into a string-descriptor blob.
/// Returns the descriptor size (`2 * len + 2`).
pub fn encode_string_descriptor(ascii: &[u8], out: &mut [u8; SERIAL_BLOB_LEN]) -> usize {
    let len = ascii.len().min(SERIAL_MAX_CHARS);
    let size = 2 + 2 * len;
    out.fill(0);
    out[0] = size as u8;
    out[1] = DESCRIPTOR_TYPE_STRING;
    for (i, &c) in ascii[..len].iter().enumerate() {
        out[2 + 2 * i] = c;
    }
    size
}

/// Decode a string-descriptor blob back into ASCII characters. Returns
/// `None` when the blob does not look like a string descriptor.
pub fn decode_string_descriptor(blob: &[u8]) -> Option<([u8; SERIAL_MAX_CHARS], usize)> {
    if blob.len() < 2 || blob[1] != DESCRIPTOR_TYPE_STRING {
        return None;
    }
    let size = blob[0] as usize;
    if size < 2 || size > blob.len() || size % 2 != 0 {
        return None;
    }
    let len = ((size - 2) / 2).min(SERIAL_MAX_CHARS);
    let mut ascii = [0u8; SERIAL_MAX_CHARS];
    for i in 0..len {
        ascii[i] = blob[2 + 2 * i];
    }
    Some((ascii, len))
}

/// Staging buffer for a pending serial-number update.
pub struct SerialStaging {
    buf: [u8; SERIAL_MAX_CHARS + 1],
    len: usize,
    pending: bool,
}

impl SerialStaging {
    pub const fn new() -> Self {
        Self {
            buf: [0; SERIAL_MAX_CHARS + 1],
            len: 0,
            pending: false,
        }
    }

    /// Buffer the raw bytes of a SERIAL request. Oversized transfers
    /// are ignored. The buffer is NUL-terminated, but the terminator
    /// is not part of the serial.
    pub fn stage(&mut self, data: &[u8]) {
        if data.len() > SERIAL_MAX_CHARS {
            return;
        }
        self.buf[..data.len()].copy_from_slice(data);
        self.buf[data.len()] = 0;
        self.len = data.len();
        self.pending = true;
    }

    #[inline]
    pub fn pending(&self) -> bool {
        self.pending
    }

    /// The staged ASCII bytes.
    pub fn ascii(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Acknowledge that the staged value has been committed.
    pub fn clear_pending(&mut self) {
        self.pending = false;
    }
}

impl Default for SerialStaging {
    fn default() -> Self {
        Self::new()
    }
}
