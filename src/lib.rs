#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod error;
pub mod i2c;

pub use embedded_hal::i2c as eh_i2c;
pub use error::Error;
pub use i2c::backend::{BusStatus, TwoWire};
pub use i2c::backend::eh1::Eh1TwoWire;
#[cfg(feature = "std")]
pub use i2c::backend::StdDelay;
#[cfg(feature = "ftdi")]
pub use i2c::backend::ftdi::I2cFtBitbang;
#[cfg(feature = "ftdi")]
pub use libftd2xx::{Ft4232h, FtdiCommon, BitMode};
pub use i2c::protocol::registers::{
    DeviceSelect, DynamicRegister, I2cSso, MbCtrl, MbMode, MemoryRegion, SystemRegister,
};
pub use i2c::st25dv::St25dv;
