/// Device select codes, memory regions and register maps of the ST25DV
/// (values from the ST25DV04K/16K/64K datasheet, DS10925)

use crate::error::Error;

/// I²C device select code (7-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceSelect {
    /// User memory, dynamic registers and FTM mailbox (0xA6 on the wire)
    UserMemory = 0b1010_0110 >> 1,
    /// System configuration and the password command (0xAE on the wire)
    SystemMemory = 0b1010_1110 >> 1,
}

impl DeviceSelect {
    /// Get the 7-bit bus address
    pub fn address(self) -> u8 {
        self as u8
    }
}

/// Memory area a register access operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MemoryRegion {
    /// Dynamic registers and FTM mailbox, volatile
    Dynamic = 0,
    /// User EEPROM
    User = 1,
    /// System configuration EEPROM
    System = 2,
}

impl MemoryRegion {
    pub fn device_select(self) -> DeviceSelect {
        match self {
            Self::Dynamic | Self::User => DeviceSelect::UserMemory,
            Self::System => DeviceSelect::SystemMemory,
        }
    }

    /// Whether writes land in EEPROM and leave the chip busy afterwards
    pub fn is_eeprom(self) -> bool {
        !matches!(self, Self::Dynamic)
    }
}

impl TryFrom<u8> for MemoryRegion {
    type Error = Error;

    fn try_from(selector: u8) -> Result<Self, Self::Error> {
        match selector {
            0 => Ok(Self::Dynamic),
            1 => Ok(Self::User),
            2 => Ok(Self::System),
            _ => Err(Error::InvalidRegion(selector)),
        }
    }
}

impl From<MemoryRegion> for u8 {
    fn from(region: MemoryRegion) -> u8 {
        region as u8
    }
}

/// Dynamic registers (device select 0x53, volatile)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum DynamicRegister {
    GPO_CTRL_Dyn = 0x2000,
    EH_CTRL_Dyn = 0x2002,
    RF_MNGT_Dyn = 0x2003,
    /// I²C security session status
    I2C_SSO_Dyn = 0x2004,
    IT_STS_Dyn = 0x2005,
    /// Fast transfer mode control
    MB_CTRL_Dyn = 0x2006,
    /// Length of the mailbox message, minus one
    MB_LEN_Dyn = 0x2007,
}

/// System configuration registers (device select 0x57, EEPROM)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SystemRegister {
    GPO = 0x0000,
    IT_TIME = 0x0001,
    EH_MODE = 0x0002,
    RF_MNGT = 0x0003,
    RFA1SS = 0x0004,
    ENDA1 = 0x0005,
    RFA2SS = 0x0006,
    ENDA2 = 0x0007,
    RFA3SS = 0x0008,
    ENDA3 = 0x0009,
    RFA4SS = 0x000A,
    I2CSS = 0x000B,
    LOCK_CCFILE = 0x000C,
    /// Permits the host to switch fast transfer mode on
    MB_MODE = 0x000D,
    MB_WDG = 0x000E,
    LOCK_CFG = 0x000F,
    LOCK_DSFID = 0x0010,
    LOCK_AFI = 0x0011,
    DSFID = 0x0012,
    AFI = 0x0013,
    /// User memory size in blocks, minus one (2 bytes, little-endian)
    MEM_SIZE = 0x0014,
    /// Block size in bytes, minus one
    BLK_SIZE = 0x0016,
    IC_REF = 0x0017,
    /// 8 bytes
    UID = 0x0018,
    IC_REV = 0x0020,
    /// I²C password, target of the present/write password commands
    I2C_PWD = 0x0900,
}

impl DynamicRegister {
    pub fn address(self) -> u16 {
        self as u16
    }
}

impl SystemRegister {
    pub fn address(self) -> u16 {
        self as u16
    }
}

/// Fast transfer mode mailbox RAM (dynamic region)
pub mod mailbox {
    /// First byte of the mailbox
    pub const START: u16 = 0x2008;
    pub const SIZE: usize = 256;
}

/// Password command framing
pub mod password {
    /// Bytes in an I²C password
    pub const LEN: usize = 8;
    /// Validation code of the present-password command
    pub const VALIDATION_PRESENT: u8 = 0x09;
    /// Validation code of the write-password command
    pub const VALIDATION_WRITE: u8 = 0x07;
    /// Factory default I²C password
    pub const FACTORY_DEFAULT: [u8; LEN] = [0u8; LEN];
}

/// EEPROM programming time
pub mod timing {
    /// Bytes programmed per EEPROM cycle
    pub const EEPROM_BLOCK: usize = 4;
    /// Duration of one programming cycle
    pub const EEPROM_BLOCK_MS: u32 = 5;
}

bitflags::bitflags! {
    /// MB_CTRL_Dyn
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MbCtrl: u8 {
        const MB_EN            = 1 << 0;
        const HOST_PUT_MSG     = 1 << 1;
        const RF_PUT_MSG       = 1 << 2;
        const HOST_MISS_MSG    = 1 << 4;
        const RF_MISS_MSG      = 1 << 5;
        const HOST_CURRENT_MSG = 1 << 6;
        const RF_CURRENT_MSG   = 1 << 7;
    }
}

bitflags::bitflags! {
    /// I2C_SSO_Dyn
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct I2cSso: u8 {
        const SESSION_OPEN = 1 << 0;
    }
}

bitflags::bitflags! {
    /// MB_MODE
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MbMode: u8 {
        const FTM_ALLOWED = 1 << 0;
    }
}

impl MbCtrl {
    /// A message is waiting in the mailbox
    pub fn has_message(&self) -> bool {
        self.intersects(Self::HOST_PUT_MSG | Self::RF_PUT_MSG)
    }
}
