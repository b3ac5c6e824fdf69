// SPDX-License-Identifier: MIT

//! # Focuser Core
//!
//! Hardware-independent control core of a USB-attached motorized focuser:
//! a stepper motor is driven to a commanded position from a 1 kHz timer
//! tick, the position is persisted to non-volatile memory after motion
//! settles, and the whole state is exposed through a small set of USB
//! vendor control requests.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`motion`] | Stepper state machine: current/target tracking, speed and microstep selection, idle/save latch |
//! | [`receiver`] | RF remote button sampling, lock/unlock gesture debounce |
//! | [`store`] | Typed slot access to non-volatile memory |
//! | [`serial`] | USB string-descriptor blob codec for the persisted serial number |
//! | [`protocol`] | Vendor control-request decoding and dispatch |
//! | [`device`] | [`Focuser`] facade tying the pieces together: init, tick, foreground poll |
//! | [`mutex`] | Critical-section scoped mutex shared by interrupt and foreground contexts |
//!
//! Everything here is `no_std` and free of hardware dependencies; the
//! firmware crate supplies [`motion::driver::StepperDriver`],
//! [`store::NonVolatileStore`], [`receiver::ReceiverPins`] and
//! [`receiver::Indicator`] implementations for the target board.

#![no_std]

pub mod device;
pub mod motion;
pub mod mutex;
pub mod protocol;
pub mod receiver;
pub mod serial;
pub mod store;

pub use device::Focuser;
pub use motion::{Motor, SpeedMode, TopSpeed, POSITION_MAX};
pub use protocol::{ControlRequestHeader, Request};

/// USB vendor id the device enumerates with.
pub const USB_VID: u16 = 0xf055;
/// USB product id the device enumerates with.
pub const USB_PID: u16 = 0x1235;
