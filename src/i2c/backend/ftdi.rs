/// FTDI bit-bang I²C backend using libftd2xx
///
/// Drives SCL/SDA as open-drain lines on an FT4232H channel in synchronous
/// bit-bang mode. Slow, but enough to talk to an ST25DV on a bench.

use std::time::Duration;

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use libftd2xx::{BitMode, DeviceTypeError, Ft4232h, FtdiCommon};
use log::{debug, trace};

const BITMODE: libftd2xx::BitMode = BitMode::SyncBitbang;

/// Half of one SCL period
const HALF_PERIOD_NS: u64 = 800;

pub struct I2cFtBitbang {
    device: Ft4232h,
    scl: u8,
    sda: u8,
    gpio_val: u8,
    gpio_dir: u8,
}

impl I2cFtBitbang {
    /// `scl_pin`/`sda_pin` are bit numbers on the bit-bang port (CDBUS6/7 on
    /// the bench adapter)
    pub fn new(device: Ft4232h, scl_pin: u8, sda_pin: u8) -> Self {
        let scl = 1 << scl_pin;
        let sda = 1 << sda_pin;
        Self {
            device,
            scl,
            sda,
            gpio_val: scl | sda, // Both high
            gpio_dir: 0,         // Both as input (high, open-drain)
        }
    }

    /// Open by USB description
    pub fn open(description: &str, scl_pin: u8, sda_pin: u8) -> Result<Self, DeviceTypeError> {
        let device = Ft4232h::with_description(description)?;
        debug!("Opened FTDI device {description:?} (SCL={scl_pin}, SDA={sda_pin})");
        Ok(Self::new(device, scl_pin, sda_pin))
    }
}

impl I2cFtBitbang {
    fn gpio_write(&mut self) -> Result<(), ErrorKind> {
        self.device
            .set_bit_mode(self.gpio_dir, BITMODE)
            .map_err(|_| ErrorKind::Other)?;
        self.device
            .write(&[self.gpio_val])
            .map_err(|_| ErrorKind::Other)?;
        Ok(())
    }

    fn gpio_read(&mut self) -> Result<u8, ErrorKind> {
        self.device.bit_mode().map_err(|_| ErrorKind::Other)
    }

    fn delay(&self, ns: u64) {
        std::thread::sleep(Duration::from_nanos(ns));
    }

    /* Release SDA (input, pulled high) */
    fn sda_high(&mut self) -> Result<(), ErrorKind> {
        self.gpio_val |= self.sda;
        self.gpio_dir &= !self.sda;
        self.gpio_write()
    }

    /* Drive SDA low */
    fn sda_low(&mut self) -> Result<(), ErrorKind> {
        self.gpio_val &= !self.sda;
        self.gpio_dir |= self.sda;
        self.gpio_write()
    }

    fn scl_high(&mut self) -> Result<(), ErrorKind> {
        self.gpio_val |= self.scl;
        self.gpio_dir &= !self.scl;
        self.gpio_write()
    }

    fn scl_low(&mut self) -> Result<(), ErrorKind> {
        self.gpio_val &= !self.scl;
        self.gpio_dir |= self.scl;
        self.gpio_write()
    }

    /// Start (or repeated start): SDA falls while SCL is high
    fn start(&mut self) -> Result<(), ErrorKind> {
        self.sda_high()?;
        self.scl_high()?;
        self.delay(HALF_PERIOD_NS);
        self.sda_low()?;
        self.delay(HALF_PERIOD_NS);
        self.scl_low()?;
        self.delay(HALF_PERIOD_NS);
        Ok(())
    }

    /// Stop: SDA rises while SCL is high
    fn stop(&mut self) -> Result<(), ErrorKind> {
        self.sda_low()?;
        self.delay(HALF_PERIOD_NS);
        self.scl_high()?;
        self.delay(HALF_PERIOD_NS);
        self.sda_high()?;
        self.delay(HALF_PERIOD_NS);
        Ok(())
    }

    /// Shift one byte out, returns true on ACK
    fn tx(&mut self, byte: u8) -> Result<bool, ErrorKind> {
        let mut byte = byte;
        for _ in 0..8 {
            if byte & 0x80 != 0 { self.sda_high()?; } else { self.sda_low()?; }
            byte <<= 1;
            self.delay(HALF_PERIOD_NS / 2);
            self.scl_high()?;
            self.delay(HALF_PERIOD_NS);
            self.scl_low()?;
            self.delay(HALF_PERIOD_NS / 2);
        }

        // Release SDA for ACK
        self.sda_high()?;
        self.delay(HALF_PERIOD_NS / 2);
        self.scl_high()?;
        self.delay(HALF_PERIOD_NS);

        let pins = self.gpio_read()?;

        self.scl_low()?;
        self.delay(HALF_PERIOD_NS / 2);
        Ok(pins & self.sda == 0)
    }

    fn rx(&mut self, send_nack: bool) -> Result<u8, ErrorKind> {
        let mut data = 0u8;

        self.sda_high()?;
        for _ in 0..8 {
            data <<= 1;
            self.scl_high()?;
            self.delay(HALF_PERIOD_NS);

            if self.gpio_read()? & self.sda != 0 {
                data |= 1;
            }

            self.scl_low()?;
            self.delay(HALF_PERIOD_NS);
        }

        if send_nack { self.sda_high()?; } else { self.sda_low()?; }
        self.delay(HALF_PERIOD_NS / 2);
        self.scl_high()?;
        self.delay(HALF_PERIOD_NS);
        self.scl_low()?;
        self.delay(HALF_PERIOD_NS / 2);
        self.sda_high()?;

        Ok(data)
    }

    fn operation(&mut self, address: u8, op: &mut Operation<'_>) -> Result<(), ErrorKind> {
        self.start()?;
        match op {
            Operation::Read(rd) => {
                if !self.tx(address << 1 | 0x01)? {
                    trace!("{address:#04X}: read select NACK");
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                }
                let last = rd.len().saturating_sub(1);
                for (i, byte) in rd.iter_mut().enumerate() {
                    // Last byte is answered with NACK
                    *byte = self.rx(i == last)?;
                }
            }
            Operation::Write(wr) => {
                if !self.tx(address << 1)? {
                    trace!("{address:#04X}: write select NACK");
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                }
                for &b in wr.iter() {
                    if !self.tx(b)? {
                        trace!("{address:#04X}: data NACK");
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                    }
                }
            }
        }
        Ok(())
    }
}

impl I2c for I2cFtBitbang {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut result = Ok(());
        for op in operations.iter_mut() {
            result = self.operation(address, op);
            if result.is_err() {
                break;
            }
        }
        // Always release the bus, even after a NACK
        self.stop()?;
        result
    }
}

impl ErrorType for I2cFtBitbang {
    type Error = ErrorKind;
}
