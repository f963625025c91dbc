//! embedded-hal 1.0 I²C backend
//!
//! Adapts any `embedded_hal::i2c::I2c` bus to the framed `TwoWire`
//! transport. The open write transfer is buffered and sent as a single
//! I²C write when finalized; a requested read is performed immediately and
//! its status is reported by the next `end_transfer`.

use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};
use log::trace;

use super::{status, BusStatus, TwoWire};

/// embedded-hal 1.0 two-wire adapter
pub struct Eh1TwoWire<I2C> {
    i2c: I2C,
    device: Option<u8>,
    tx: Vec<u8>,
    rx: VecDeque<u8>,
    read_status: BusStatus,
}

impl<I2C> Eh1TwoWire<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            device: None,
            tx: Vec::new(),
            rx: VecDeque::new(),
            read_status: status::SUCCESS,
        }
    }

    /// Give back the wrapped bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn status_of(err: I2C::Error) -> BusStatus {
        match err.kind() {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => status::NACK_DATA,
            ErrorKind::NoAcknowledge(_) => status::NACK_ADDRESS,
            _ => status::OTHER,
        }
    }
}

impl<I2C> TwoWire for Eh1TwoWire<I2C>
where
    I2C: I2c,
{
    fn begin_transfer(&mut self, device: u8) {
        self.device = Some(device);
        self.tx.clear();
    }

    fn write_byte(&mut self, byte: u8) {
        self.tx.push(byte);
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.tx.extend_from_slice(bytes);
    }

    fn end_transfer(&mut self, _send_stop: bool) -> BusStatus {
        // embedded-hal closes every call with a STOP, so `send_stop` is implied
        match self.device.take() {
            Some(address) => {
                let result = self.i2c.write(address, &self.tx);
                self.tx.clear();
                match result {
                    Ok(()) => status::SUCCESS,
                    Err(e) => {
                        let code = Self::status_of(e);
                        trace!("write to {address:#04X} failed: status {code}");
                        code
                    }
                }
            }
            None => core::mem::replace(&mut self.read_status, status::SUCCESS),
        }
    }

    fn request_bytes(&mut self, device: u8, count: usize) -> usize {
        self.rx.clear();
        if count == 0 {
            self.read_status = status::SUCCESS;
            return 0;
        }

        let mut buf = vec![0u8; count];
        match self.i2c.read(device, &mut buf) {
            Ok(()) => {
                self.read_status = status::SUCCESS;
                self.rx.extend(buf);
                count
            }
            Err(e) => {
                self.read_status = Self::status_of(e);
                trace!("read from {device:#04X} failed: status {}", self.read_status);
                0
            }
        }
    }

    fn bytes_available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }
}
