/// Security session, fast transfer mode switch and first time provisioning
///
/// All of these are short sequences on top of the register access engine.
/// A sequence stops at the first failing step and reports it: bus faults as
/// `Error::Bus`, a bit that did not stick as `Error::VerificationFailed`.
/// Callers that only care about success can use `.is_ok()`.

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::error::Error;
use super::backend::TwoWire;
use super::protocol::registers::{
    password, DeviceSelect, DynamicRegister, I2cSso, MbCtrl, MbMode, MemoryRegion, SystemRegister,
};
use super::protocol::transaction::{eeprom_write_delay_ms, password_frame};
use super::st25dv::St25dv;

impl<B, D> St25dv<B, D>
where
    B: TwoWire,
    D: DelayNs,
{
    /// Present the I²C password to open a security session
    ///
    /// The chip acknowledges wrong passwords too; use `session_open` to find
    /// out whether the session actually opened.
    pub fn present_password(&mut self, pwd: &[u8; password::LEN]) -> Result<(), Error> {
        debug!("Presenting I2C password");
        let frame = password_frame(password::VALIDATION_PRESENT, pwd);
        self.send_frame(DeviceSelect::SystemMemory, &frame)
    }

    /// Replace the I²C password. Needs an open security session.
    pub fn write_password(&mut self, pwd: &[u8; password::LEN]) -> Result<(), Error> {
        debug!("Writing new I2C password");
        let frame = password_frame(password::VALIDATION_WRITE, pwd);
        self.send_frame(DeviceSelect::SystemMemory, &frame)?;
        self.wait_eeprom(eeprom_write_delay_ms(password::LEN));
        Ok(())
    }

    /// State of the I²C security session (I2C_SSO_Dyn)
    pub fn session_open(&mut self) -> Result<bool, Error> {
        let sso = self.read_register(MemoryRegion::Dynamic, DynamicRegister::I2C_SSO_Dyn.address())?;
        Ok(I2cSso::from_bits_retain(sso).contains(I2cSso::SESSION_OPEN))
    }

    /// Switch fast transfer mode on (MB_EN in MB_CTRL_Dyn) and check it stuck
    ///
    /// Only works once MB_MODE permits it, see `first_time_setup`.
    pub fn enable_ftm(&mut self) -> Result<(), Error> {
        debug!("Enabling fast transfer mode");
        self.set_and_verify(
            MemoryRegion::Dynamic,
            DynamicRegister::MB_CTRL_Dyn.address(),
            MbCtrl::MB_EN.bits(),
            true,
        )
    }

    /// Switch fast transfer mode off; clears the mailbox
    pub fn disable_ftm(&mut self) -> Result<(), Error> {
        debug!("Disabling fast transfer mode");
        self.set_and_verify(
            MemoryRegion::Dynamic,
            DynamicRegister::MB_CTRL_Dyn.address(),
            MbCtrl::MB_EN.bits(),
            false,
        )
    }

    /// Provision a factory fresh tag so fast transfer mode can be used:
    ///
    /// 1. Present the factory default (all zero) password
    /// 2. Check the security session opened
    /// 3. Set MB_MODE to allow fast transfer mode
    /// 4. Check MB_MODE reads back set
    pub fn first_time_setup(&mut self) -> Result<(), Error> {
        self.present_password(&password::FACTORY_DEFAULT)?;

        debug!("Checking I2C security session");
        self.verify_bits(
            MemoryRegion::Dynamic,
            DynamicRegister::I2C_SSO_Dyn.address(),
            I2cSso::SESSION_OPEN.bits(),
            true,
        )?;

        debug!("Allowing fast transfer mode");
        self.set_and_verify(
            MemoryRegion::System,
            SystemRegister::MB_MODE.address(),
            MbMode::FTM_ALLOWED.bits(),
            true,
        )
    }

    /// Write `mask` (or zero) to a register and check the masked bits read back
    fn set_and_verify(
        &mut self,
        region: MemoryRegion,
        address: u16,
        mask: u8,
        set: bool,
    ) -> Result<(), Error> {
        let value = if set { mask } else { 0 };
        self.write_register(region, address, value)?;
        self.verify_bits(region, address, mask, set)
    }

    fn verify_bits(
        &mut self,
        region: MemoryRegion,
        address: u16,
        mask: u8,
        set: bool,
    ) -> Result<(), Error> {
        let expected = if set { mask } else { 0 };
        let actual = self.read_register(region, address)? & mask;
        if actual == expected {
            Ok(())
        } else {
            debug!("{address:#06X}: expected {expected:#04X}, got {actual:#04X}");
            Err(Error::VerificationFailed { register: address, expected, actual })
        }
    }
}
