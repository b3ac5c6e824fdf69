// SPDX-License-Identifier: MIT

//! Control-request codes and the setup-packet header.
//!
//! Every device operation is a USB vendor control transfer addressed to
//! the device recipient. The request code selects the operation;
//! `wValue`/`wIndex` and the data stage carry the arguments. All
//! multi-byte payloads are little-endian.

/// Wire values of the request codes.
pub mod codes {
    pub const RESET: u8 = 0;
    pub const GET: u8 = 1;
    pub const SET: u8 = 2;
    pub const LOCK: u8 = 3;
    pub const RCVR: u8 = 4;
    pub const STOP: u8 = 5;
    pub const SAVED: u8 = 6;
    pub const SERIAL: u8 = 7;
    pub const POSITION: u8 = 8;
    pub const TOPSPEED: u8 = 9;
}

/// Data-stage length of a SET request (32-bit position).
pub const SET_PAYLOAD_LEN: usize = 4;
/// Data-stage length of a POSITION request.
pub const POSITION_PAYLOAD_LEN: usize = 4;
/// Response length of GET: current u32, target u32, speed u16.
pub const GET_RESPONSE_LEN: usize = 10;
/// Response length of SAVED.
pub const SAVED_RESPONSE_LEN: usize = 4;
/// Largest device-to-host response.
pub const MAX_RESPONSE_LEN: usize = GET_RESPONSE_LEN;

/// Error returned when a request code is not part of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownRequest;

/// Closed set of request codes understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Request {
    /// Reboot via a deliberately starved watchdog.
    Reset = codes::RESET,
    /// Read (current, target, speed).
    Get = codes::GET,
    /// Move to a position; `wIndex` selects fast speed.
    Set = codes::SET,
    /// Lock (`wIndex` nonzero) or unlock the receiver input.
    Lock = codes::LOCK,
    /// Read the receiver status byte.
    Receiver = codes::RCVR,
    /// Stop any motion.
    Stop = codes::STOP,
    /// Read the last durably written position.
    Saved = codes::SAVED,
    /// Stage a new serial number (raw ASCII data stage).
    Serial = codes::SERIAL,
    /// Recalibrate: force-set the position without moving.
    Position = codes::POSITION,
    /// Read or write the top-speed setting.
    TopSpeed = codes::TOPSPEED,
}

impl TryFrom<u8> for Request {
    type Error = UnknownRequest;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            codes::RESET => Ok(Self::Reset),
            codes::GET => Ok(Self::Get),
            codes::SET => Ok(Self::Set),
            codes::LOCK => Ok(Self::Lock),
            codes::RCVR => Ok(Self::Receiver),
            codes::STOP => Ok(Self::Stop),
            codes::SAVED => Ok(Self::Saved),
            codes::SERIAL => Ok(Self::Serial),
            codes::POSITION => Ok(Self::Position),
            codes::TOPSPEED => Ok(Self::TopSpeed),
            _ => Err(UnknownRequest),
        }
    }
}

// bmRequestType bit layout
const DIRECTION_MASK: u8 = 0x80;
const DIRECTION_DEVICE_TO_HOST: u8 = 0x80;
const TYPE_MASK: u8 = 0x60;
const TYPE_VENDOR: u8 = 0x40;
const RECIPIENT_MASK: u8 = 0x1f;
const RECIPIENT_DEVICE: u8 = 0x00;

/// Transfer direction, from the host's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDirection {
    HostToDevice,
    DeviceToHost,
}

/// The eight-byte setup packet of a control transfer, parsed once and
/// classified through named accessors instead of bit tests scattered
/// around the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequestHeader {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl ControlRequestHeader {
    pub const fn new(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> Self {
        Self {
            request_type,
            request,
            value,
            index,
            length,
        }
    }

    /// Host-to-device vendor request header, as the reference host
    /// client builds them. Also used by the protocol tests.
    pub const fn vendor_out(request: u8, value: u16, index: u16, length: u16) -> Self {
        Self::new(TYPE_VENDOR | RECIPIENT_DEVICE, request, value, index, length)
    }

    /// Device-to-host vendor request header.
    pub const fn vendor_in(request: u8, value: u16, index: u16, length: u16) -> Self {
        Self::new(
            DIRECTION_DEVICE_TO_HOST | TYPE_VENDOR | RECIPIENT_DEVICE,
            request,
            value,
            index,
            length,
        )
    }

    #[inline]
    pub const fn direction(&self) -> RequestDirection {
        if self.request_type & DIRECTION_MASK == DIRECTION_DEVICE_TO_HOST {
            RequestDirection::DeviceToHost
        } else {
            RequestDirection::HostToDevice
        }
    }

    #[inline]
    pub const fn is_vendor(&self) -> bool {
        self.request_type & TYPE_MASK == TYPE_VENDOR
    }

    #[inline]
    pub const fn recipient_is_device(&self) -> bool {
        self.request_type & RECIPIENT_MASK == RECIPIENT_DEVICE
    }

    /// True for the only request class this device handles: a vendor
    /// request addressed to the device recipient.
    #[inline]
    pub const fn is_vendor_device_request(&self) -> bool {
        self.is_vendor() && self.recipient_is_device()
    }
}
