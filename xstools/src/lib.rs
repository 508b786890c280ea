//! # XSTOOLs
//!
//! Host-side access to circuits loaded into the FPGA of an XESS board. Two kinds of modules are
//! supported: word-addressable memories (registers and block RAMs) through [`hostio::Mem`], and
//! generic devices-under-test through [`hostio::Dut`]. Both sit on top of the capability traits
//! in [`device`], so they run the same against real hardware ([`device::usb::XsUsb`]) or a
//! simulated board ([`device::mock::Mock`]).

#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod core;
pub mod device;
pub mod hostio;
pub mod prelude;
pub mod trial;
