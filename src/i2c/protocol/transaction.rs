/// Transaction types and framing for the ST25DV I²C protocol

use super::registers::{password, timing, DeviceSelect, MemoryRegion, SystemRegister};

/// Transaction type (hardware-independent representation)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction<'a> {
    /// Write `data` starting at `address`, one framed transfer
    Write {
        region: MemoryRegion,
        address: u16,
        data: &'a [u8],
    },
    /// Set the read pointer to `address`, then pull `len` bytes
    Read {
        region: MemoryRegion,
        address: u16,
        len: usize,
    },
}

impl<'a> Transaction<'a> {
    pub fn write(region: MemoryRegion, address: u16, data: &'a [u8]) -> Self {
        Self::Write { region, address, data }
    }

    pub fn read(region: MemoryRegion, address: u16, len: usize) -> Self {
        Self::Read { region, address, len }
    }

    pub fn region(&self) -> MemoryRegion {
        match self {
            Self::Write { region, .. } | Self::Read { region, .. } => *region,
        }
    }

    pub fn device_select(&self) -> DeviceSelect {
        self.region().device_select()
    }

    /// Register address, high byte first as sent on the wire
    pub fn address_bytes(&self) -> [u8; 2] {
        match self {
            Self::Write { address, .. } | Self::Read { address, .. } => address.to_be_bytes(),
        }
    }

    /// Number of bytes carried by the data phase
    pub fn len(&self) -> usize {
        match self {
            Self::Write { data, .. } => data.len(),
            Self::Read { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time the chip stays off the bus once this transaction completes
    pub fn completion_delay_ms(&self) -> u32 {
        match self {
            Self::Write { region, data, .. } if region.is_eeprom() => eeprom_write_delay_ms(data.len()),
            _ => 0,
        }
    }
}

/// EEPROM programming time for `len` bytes: one cycle per started 4-byte block
pub fn eeprom_write_delay_ms(len: usize) -> u32 {
    let blocks = len / timing::EEPROM_BLOCK + usize::from(len % timing::EEPROM_BLOCK != 0);
    // u32 holds any realistic transfer; saturate rather than wrap
    u32::try_from(blocks)
        .unwrap_or(u32::MAX / timing::EEPROM_BLOCK_MS)
        .saturating_mul(timing::EEPROM_BLOCK_MS)
}

/// Length of a password command frame
pub const PASSWORD_FRAME_LEN: usize = 2 + password::LEN + 1 + password::LEN;

/// Frame of a password command (sent on `DeviceSelect::SystemMemory`):
/// password address, password, validation code, password again
pub fn password_frame(validation: u8, pwd: &[u8; password::LEN]) -> [u8; PASSWORD_FRAME_LEN] {
    let mut frame = [0u8; PASSWORD_FRAME_LEN];
    frame[..2].copy_from_slice(&SystemRegister::I2C_PWD.address().to_be_bytes());
    frame[2..2 + password::LEN].copy_from_slice(pwd);
    frame[2 + password::LEN] = validation;
    frame[3 + password::LEN..].copy_from_slice(pwd);
    frame
}
