/// Fast transfer mode mailbox
///
/// 256 bytes of RAM shared between the I²C host and the RF reader. A
/// message is only accepted while MB_EN is set (`enable_ftm`). The payload
/// is opaque to the driver.

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::error::Error;
use super::backend::TwoWire;
use super::protocol::registers::{mailbox, DynamicRegister, MbCtrl, MemoryRegion};
use super::st25dv::St25dv;

impl<B, D> St25dv<B, D>
where
    B: TwoWire,
    D: DelayNs,
{
    /// Read MB_CTRL_Dyn
    pub fn mailbox_status(&mut self) -> Result<MbCtrl, Error> {
        let ctrl = self.read_register(MemoryRegion::Dynamic, DynamicRegister::MB_CTRL_Dyn.address())?;
        Ok(MbCtrl::from_bits_retain(ctrl))
    }

    /// Put a message for the RF side in the mailbox
    pub fn write_message(&mut self, msg: &[u8]) -> Result<(), Error> {
        if msg.is_empty() || msg.len() > mailbox::SIZE {
            return Err(Error::InvalidMessageLength(msg.len()));
        }
        debug!("Writing {} byte mailbox message", msg.len());
        self.write(MemoryRegion::Dynamic, mailbox::START, msg)
    }

    /// Length of the message waiting in the mailbox, 0 if there is none
    pub fn message_length(&mut self) -> Result<usize, Error> {
        if !self.mailbox_status()?.has_message() {
            return Ok(0);
        }
        let len = self.read_register(MemoryRegion::Dynamic, DynamicRegister::MB_LEN_Dyn.address())?;
        Ok(usize::from(len) + 1)
    }

    /// Read the waiting message into `buf`, returns its length
    ///
    /// At most `buf.len()` bytes are read; a longer message is truncated.
    pub fn read_message(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let len = self.message_length()?.min(buf.len());
        if len == 0 {
            return Ok(0);
        }
        debug!("Reading {len} byte mailbox message");
        self.read(MemoryRegion::Dynamic, mailbox::START, &mut buf[..len])
    }
}
