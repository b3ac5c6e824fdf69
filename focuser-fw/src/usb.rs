// SPDX-License-Identifier: MIT

//! Vendor control-request glue between the USB stack and the device.
//!
//! The device owns no endpoints beyond endpoint zero; every operation
//! is a vendor request addressed to the device. Requests are decoded
//! and dispatched by the core protocol module under the global lock.

use usb_device::bus::UsbBus;
use usb_device::class::{ControlIn, ControlOut, UsbClass};
use usb_device::control::{self, Recipient, RequestType};
use usb_device::UsbDirection;

use focuser_core::protocol::messages::MAX_RESPONSE_LEN;
use focuser_core::protocol::{handle_control_in, handle_control_out, ControlRequestHeader};

use crate::FOCUSER;

pub struct FocuserClass;

fn header_from(req: &control::Request) -> ControlRequestHeader {
    let mut request_type = ((req.request_type as u8) << 5) | (req.recipient as u8);
    if req.direction == UsbDirection::In {
        request_type |= 0x80;
    }
    ControlRequestHeader::new(request_type, req.request, req.value, req.index, req.length)
}

impl<B: UsbBus> UsbClass<B> for FocuserClass {
    fn control_out(&mut self, xfer: ControlOut<B>) {
        let req = *xfer.request();
        if req.request_type != RequestType::Vendor || req.recipient != Recipient::Device {
            return;
        }
        let header = header_from(&req);
        FOCUSER.lock(|device| {
            if let Some(device) = device.as_mut() {
                handle_control_out(device, &header, xfer.data());
            }
        });
        // Invalid payloads were dropped without effect; the transfer
        // itself is still acknowledged.
        xfer.accept().ok();
    }

    fn control_in(&mut self, xfer: ControlIn<B>) {
        let req = *xfer.request();
        if req.request_type != RequestType::Vendor || req.recipient != Recipient::Device {
            return;
        }
        let header = header_from(&req);
        let mut buf = [0u8; MAX_RESPONSE_LEN];
        let len = FOCUSER.lock(|device| {
            device
                .as_mut()
                .and_then(|device| handle_control_in(device, &header, &mut buf))
        });
        if let Some(len) = len {
            xfer.accept_with(&buf[..len]).ok();
        }
    }
}
