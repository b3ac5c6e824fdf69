// SPDX-License-Identifier: MIT

//! Control-request dispatcher.
//!
//! One synchronous call per control transfer. Host-to-device requests
//! consume their fully-read data stage before any state is mutated;
//! device-to-host requests compute the complete response into the
//! caller's buffer. Malformed or out-of-range requests change nothing
//! and signal nothing: the device has no error path back to the host.
//!
//! The caller holds the device lock for the duration of the call, so
//! each handler is atomic with respect to the timer tick.

use crate::device::Focuser;
use crate::motion::driver::StepperDriver;
use crate::motion::{SpeedMode, POSITION_MAX};
use crate::protocol::messages::{
    ControlRequestHeader, Request, RequestDirection, GET_RESPONSE_LEN, POSITION_PAYLOAD_LEN,
    SAVED_RESPONSE_LEN, SET_PAYLOAD_LEN,
};
use crate::receiver::{Indicator, ReceiverPins};
use crate::store::NonVolatileStore;

fn position_from(data: &[u8]) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[..4]);
    u32::from_le_bytes(bytes)
}

/// Handle a host-to-device request. `data` is the complete data stage.
pub fn handle_control_out<D, S, P, I>(
    dev: &mut Focuser<D, S, P, I>,
    header: &ControlRequestHeader,
    data: &[u8],
) where
    D: StepperDriver,
    S: NonVolatileStore,
    P: ReceiverPins,
    I: Indicator,
{
    if !header.is_vendor_device_request() || header.direction() != RequestDirection::HostToDevice {
        return;
    }
    let Ok(request) = Request::try_from(header.request) else {
        return;
    };
    match request {
        Request::Reset => dev.initiate_reset(),
        Request::Set => {
            if data.len() != SET_PAYLOAD_LEN {
                return;
            }
            let position = position_from(data);
            // 0 and the maximum are "do nothing" sentinels, anything
            // beyond is out of range
            if position == 0 || position >= POSITION_MAX {
                return;
            }
            let speed = if header.index != 0 {
                SpeedMode::Fast
            } else {
                SpeedMode::Slow
            };
            dev.moveto(position, speed);
        }
        Request::Lock => {
            if header.index != 0 {
                dev.lock();
            } else {
                dev.unlock();
            }
        }
        Request::Stop => dev.stop(),
        Request::Serial => dev.stage_serial(data),
        Request::Position => {
            if data.len() != POSITION_PAYLOAD_LEN {
                return;
            }
            let position = position_from(data);
            if position >= POSITION_MAX {
                return;
            }
            dev.recalibrate(position);
        }
        Request::TopSpeed => {
            if data.len() == 1 {
                dev.set_topspeed(data[0]);
            }
        }
        // read-only codes on an OUT transfer
        Request::Get | Request::Receiver | Request::Saved => {}
    }
}

/// Handle a device-to-host request. Returns the response length, or
/// `None` when the request is not one of ours (the USB stack decides
/// how to answer unhandled transfers; that is out of scope here).
pub fn handle_control_in<D, S, P, I>(
    dev: &mut Focuser<D, S, P, I>,
    header: &ControlRequestHeader,
    buf: &mut [u8],
) -> Option<usize>
where
    D: StepperDriver,
    S: NonVolatileStore,
    P: ReceiverPins,
    I: Indicator,
{
    if !header.is_vendor_device_request() || header.direction() != RequestDirection::DeviceToHost {
        return None;
    }
    let request = Request::try_from(header.request).ok()?;
    match request {
        Request::Get => {
            if buf.len() < GET_RESPONSE_LEN {
                return None;
            }
            buf[0..4].copy_from_slice(&dev.current().to_le_bytes());
            buf[4..8].copy_from_slice(&dev.target().to_le_bytes());
            buf[8..10].copy_from_slice(&(dev.speed() as u16).to_le_bytes());
            Some(GET_RESPONSE_LEN)
        }
        Request::Receiver => {
            if buf.is_empty() {
                return None;
            }
            buf[0] = dev.receiver_status();
            Some(1)
        }
        Request::Saved => {
            if buf.len() < SAVED_RESPONSE_LEN {
                return None;
            }
            buf[0..4].copy_from_slice(&dev.lastsaved().to_le_bytes());
            Some(SAVED_RESPONSE_LEN)
        }
        Request::TopSpeed => {
            if buf.is_empty() {
                return None;
            }
            buf[0] = dev.topspeed();
            Some(1)
        }
        // write-only codes on an IN transfer
        Request::Reset
        | Request::Set
        | Request::Lock
        | Request::Stop
        | Request::Serial
        | Request::Position => None,
    }
}
