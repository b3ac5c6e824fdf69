// SPDX-License-Identifier: MIT

//! USB vendor control-request protocol.

pub mod dispatch;
pub mod messages;

pub use dispatch::{handle_control_in, handle_control_out};
pub use messages::{ControlRequestHeader, Request, RequestDirection};
