/// Backend abstraction module - bus transports the driver runs on
///
/// The driver speaks to the chip through the `TwoWire` trait, a framed
/// begin/queue/finalize transport. Adapters are provided for embedded-hal
/// I²C buses and, with the `ftdi` feature, for an FT4232H bit-bang bus.

pub mod eh1;

#[cfg(feature = "ftdi")]
pub mod ftdi;

/// Transport status returned when a transfer is finalized. `0` is success,
/// anything else is transport specific and passed through unchanged.
pub type BusStatus = u8;

/// Status codes used by the bundled adapters (classic two-wire convention)
pub mod status {
    use super::BusStatus;

    pub const SUCCESS: BusStatus = 0;
    /// Transfer did not fit the transmit buffer
    pub const DATA_TOO_LONG: BusStatus = 1;
    /// Device select was not acknowledged
    pub const NACK_ADDRESS: BusStatus = 2;
    /// A data byte was not acknowledged
    pub const NACK_DATA: BusStatus = 3;
    /// Arbitration loss, bus fault, overrun, ...
    pub const OTHER: BusStatus = 4;
    pub const TIMEOUT: BusStatus = 5;
}

/// Framed two-wire transport
///
/// A write transfer is opened with `begin_transfer`, filled with
/// `write_byte`/`write_bytes` and sent by `end_transfer`. A read is issued
/// with `request_bytes` and drained with `bytes_available`/`read_byte`; the
/// `end_transfer` that follows a read reports that read's status.
pub trait TwoWire {
    /// Open a transfer addressed to a 7-bit device code
    fn begin_transfer(&mut self, device: u8);

    /// Queue one byte into the open transfer
    fn write_byte(&mut self, byte: u8);

    /// Queue a run of bytes into the open transfer
    fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_byte(b);
        }
    }

    /// Finalize the current transfer
    fn end_transfer(&mut self, send_stop: bool) -> BusStatus;

    /// Read up to `count` bytes from `device`, returning how many were received
    fn request_bytes(&mut self, device: u8, count: usize) -> usize;

    /// Number of received bytes not yet pulled
    fn bytes_available(&self) -> usize;

    /// Pull the next received byte
    fn read_byte(&mut self) -> u8;
}

/// `DelayNs` on the host clock
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(feature = "std")]
impl embedded_hal::delay::DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns.into()));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms.into()));
    }
}
