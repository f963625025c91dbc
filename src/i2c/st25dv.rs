//! ST25DV register access engine
//!
//! Every access is one of two framed exchanges:
//!
//! * write: `[select] [addr hi] [addr lo] [data...] STOP`, followed by the
//!   EEPROM programming wait when the target is user or system memory
//! * read: `[select] [addr hi] [addr lo] STOP` to load the chip's address
//!   pointer, then a separate read of the data
//!
//! The password, fast transfer mode and provisioning sequences in
//! `session.rs` and `mailbox.rs` are built on these two operations.

use embedded_hal::delay::DelayNs;
use log::trace;

use crate::error::Error;
use super::backend::{status, BusStatus, TwoWire};
use super::protocol::registers::{DeviceSelect, MemoryRegion, SystemRegister};
use super::protocol::transaction::Transaction;

/// ST25DV dynamic NFC tag on a two-wire bus
///
/// * `B` – bus transport
/// * `D` – delay provider for the EEPROM programming wait
pub struct St25dv<B, D> {
    bus: B,
    delay: D,
}

impl<B, D> St25dv<B, D>
where
    B: TwoWire,
    D: DelayNs,
{
    pub fn new(bus: B, delay: D) -> Self {
        Self { bus, delay }
    }

    /// Give back the bus and delay provider
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Write `data` to consecutive registers starting at `address`
    ///
    /// `region` is a `MemoryRegion` or a raw selector (0 dynamic/mailbox,
    /// 1 user, 2 system); anything else fails with `Error::InvalidRegion`
    /// before the bus is touched. For user and system memory this blocks
    /// until the chip has finished programming its EEPROM (5 ms per started
    /// 4-byte block).
    pub fn write<R>(&mut self, region: R, address: u16, data: &[u8]) -> Result<(), Error>
    where
        R: TryInto<MemoryRegion>,
        Error: From<R::Error>,
    {
        let region = region.try_into()?;
        let txn = Transaction::write(region, address, data);

        self.bus.begin_transfer(txn.device_select().address());
        self.bus.write_bytes(&txn.address_bytes());
        self.bus.write_bytes(data);
        let status = self.bus.end_transfer(true);
        trace!(
            "{region:?} @ {address:#06X}: write [{}] -> {status}",
            hex::encode(data)
        );
        check(status)?;

        self.wait_eeprom(txn.completion_delay_ms());
        Ok(())
    }

    /// Read consecutive registers starting at `address` into `buf`
    ///
    /// Returns the number of bytes the chip delivered. When it delivers
    /// fewer than `buf.len()`, the rest of `buf` is left as it was.
    pub fn read<R>(&mut self, region: R, address: u16, buf: &mut [u8]) -> Result<usize, Error>
    where
        R: TryInto<MemoryRegion>,
        Error: From<R::Error>,
    {
        let region = region.try_into()?;
        let txn = Transaction::read(region, address, buf.len());
        let device = txn.device_select().address();

        // The address phase is closed with a STOP before the data is pulled
        self.bus.begin_transfer(device);
        self.bus.write_bytes(&txn.address_bytes());
        let status = self.bus.end_transfer(true);
        trace!("{region:?} @ {address:#06X}: set pointer -> {status}");
        check(status)?;

        self.bus.request_bytes(device, buf.len());
        let mut received = 0;
        while received < buf.len() && self.bus.bytes_available() > 0 {
            buf[received] = self.bus.read_byte();
            received += 1;
        }

        let status = self.bus.end_transfer(true);
        trace!(
            "{region:?} @ {address:#06X}: read {received}/{} [{}] -> {status}",
            buf.len(),
            hex::encode(&buf[..received])
        );
        check(status)?;

        Ok(received)
    }

    /// Read a single register
    pub fn read_register<R>(&mut self, region: R, address: u16) -> Result<u8, Error>
    where
        R: TryInto<MemoryRegion>,
        Error: From<R::Error>,
    {
        let mut value = [0u8; 1];
        self.read(region, address, &mut value)?;
        Ok(value[0])
    }

    /// Write a single register
    pub fn write_register<R>(&mut self, region: R, address: u16, value: u8) -> Result<(), Error>
    where
        R: TryInto<MemoryRegion>,
        Error: From<R::Error>,
    {
        self.write(region, address, &[value])
    }

    /// Size of the user EEPROM in bytes, from MEM_SIZE and BLK_SIZE
    pub fn user_memory_size(&mut self) -> Result<usize, Error> {
        let mut mem_size = [0u8; 2];
        self.read(MemoryRegion::System, SystemRegister::MEM_SIZE.address(), &mut mem_size)?;
        let blk_size = self.read_register(MemoryRegion::System, SystemRegister::BLK_SIZE.address())?;

        let blocks = usize::from(u16::from_le_bytes(mem_size)) + 1;
        Ok(blocks * (usize::from(blk_size) + 1))
    }

    /// Send a pre-built command frame on `device` in one transfer
    pub(crate) fn send_frame(&mut self, device: DeviceSelect, frame: &[u8]) -> Result<(), Error> {
        self.bus.begin_transfer(device.address());
        self.bus.write_bytes(frame);
        let status = self.bus.end_transfer(true);
        trace!("{device:?}: command frame of {} bytes -> {status}", frame.len());
        check(status)
    }

    /// The chip ignores the bus while programming, nothing may be sent meanwhile
    pub(crate) fn wait_eeprom(&mut self, ms: u32) {
        if ms > 0 {
            trace!("waiting {ms} ms for EEPROM programming");
            self.delay.delay_ms(ms);
        }
    }
}

fn check(status: BusStatus) -> Result<(), Error> {
    if status == status::SUCCESS {
        Ok(())
    } else {
        Err(Error::Bus(status))
    }
}
