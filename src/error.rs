use core::convert::Infallible;

use thiserror::Error as DeriveError;

use crate::i2c::backend::BusStatus;

#[derive(DeriveError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid memory region selector: {0}")]
    InvalidRegion(u8),

    #[error("Bus transfer failed, status: {0}")]
    Bus(BusStatus),

    #[error("Verification failed at {register:#06X}: expected {expected:#04X}, got {actual:#04X}")]
    VerificationFailed { register: u16, expected: u8, actual: u8 },

    #[error("Mailbox message length {0} out of range (1..=256)")]
    InvalidMessageLength(usize),
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
