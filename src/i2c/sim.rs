//! Simulated ST25DV for unit tests
//!
//! Models both device selects with auto-incrementing address pointers, the
//! password-gated security session, MB_MODE gating of MB_EN, the mailbox
//! flags and write protection of system memory. Every transport call is
//! logged so tests can check framing and ordering.

use std::collections::{HashMap, VecDeque};

use embedded_hal::delay::DelayNs;

use super::backend::{status, BusStatus, TwoWire};
use super::protocol::registers::{
    mailbox, password, DeviceSelect, DynamicRegister, MbCtrl, SystemRegister,
};

const USER: u8 = DeviceSelect::UserMemory as u8;
const SYSTEM: u8 = DeviceSelect::SystemMemory as u8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Begin(u8),
    /// `device` is `None` when the finalize closes a read
    End { device: Option<u8>, frame: Vec<u8> },
    Request(u8, usize),
}

pub struct SimSt25dv {
    /// Device select 0x53: user memory, dynamic registers, mailbox
    user: HashMap<u16, u8>,
    /// Device select 0x57: system configuration
    system: HashMap<u16, u8>,
    password: [u8; password::LEN],
    session_open: bool,
    pointer: u16,

    device: Option<u8>,
    tx: Vec<u8>,
    rx: VecDeque<u8>,
    ends: usize,

    pub calls: Vec<Call>,
    /// Make the nth finalize (0-based) return this status without effect
    pub fail_end: Option<(usize, BusStatus)>,
    /// Offer at most this many bytes per read
    pub offer_limit: Option<usize>,
    /// Offer this many bytes beyond what was requested
    pub extra_bytes: usize,
    /// Correct passwords still leave the session closed
    pub ignore_password: bool,
    /// MB_EN never sticks
    pub reject_ftm: bool,
}

impl SimSt25dv {
    /// Factory fresh ST25DV04K: 128 blocks of 4 bytes, zero password
    pub fn new() -> Self {
        let mut system = HashMap::new();
        system.insert(SystemRegister::MEM_SIZE.address(), 0x7F);
        system.insert(SystemRegister::MEM_SIZE.address() + 1, 0x00);
        system.insert(SystemRegister::BLK_SIZE.address(), 0x03);

        Self {
            user: HashMap::new(),
            system,
            password: password::FACTORY_DEFAULT,
            session_open: false,
            pointer: 0,
            device: None,
            tx: Vec::new(),
            rx: VecDeque::new(),
            ends: 0,
            calls: Vec::new(),
            fail_end: None,
            offer_limit: None,
            extra_bytes: 0,
            ignore_password: false,
            reject_ftm: false,
        }
    }

    pub fn open_session(&mut self) {
        self.session_open = true;
    }

    /// MB_MODE already set, as after provisioning
    pub fn allow_ftm(&mut self) {
        self.system.insert(SystemRegister::MB_MODE.address(), 0x01);
    }

    pub fn session_is_open(&self) -> bool {
        self.session_open
    }

    pub fn set_password(&mut self, pwd: [u8; password::LEN]) {
        self.password = pwd;
    }

    pub fn password(&self) -> [u8; password::LEN] {
        self.password
    }

    /// Put a message in the mailbox as if the RF side had sent it
    pub fn rf_put_message(&mut self, msg: &[u8]) {
        for (i, &b) in msg.iter().enumerate() {
            self.user.insert(mailbox::START + i as u16, b);
        }
        let ctrl = self.load(USER, DynamicRegister::MB_CTRL_Dyn.address());
        self.user.insert(DynamicRegister::MB_CTRL_Dyn.address(), ctrl | MbCtrl::RF_PUT_MSG.bits());
        self.user.insert(DynamicRegister::MB_LEN_Dyn.address(), (msg.len() - 1) as u8);
    }

    pub fn peek(&self, device: DeviceSelect, address: u16) -> u8 {
        self.load(device.address(), address)
    }

    fn load(&self, device: u8, address: u16) -> u8 {
        if device == SYSTEM {
            return self.system.get(&address).copied().unwrap_or(0);
        }
        if address == DynamicRegister::I2C_SSO_Dyn.address() {
            return u8::from(self.session_open);
        }
        self.user.get(&address).copied().unwrap_or(0)
    }

    fn ftm_allowed(&self) -> bool {
        self.load(SYSTEM, SystemRegister::MB_MODE.address()) & 0x01 != 0
    }

    fn ftm_enabled(&self) -> bool {
        self.load(USER, DynamicRegister::MB_CTRL_Dyn.address()) & MbCtrl::MB_EN.bits() != 0
    }

    fn password_command(&mut self, data: &[u8]) -> BusStatus {
        if data.len() != 2 * password::LEN + 1 {
            return status::NACK_DATA;
        }
        let (first, rest) = data.split_at(password::LEN);
        let (code, second) = (rest[0], &rest[1..]);
        if first != second {
            return status::NACK_DATA;
        }

        match code {
            password::VALIDATION_PRESENT => {
                self.session_open = !self.ignore_password && first == self.password;
                status::SUCCESS
            }
            password::VALIDATION_WRITE if self.session_open => {
                self.password.copy_from_slice(first);
                status::SUCCESS
            }
            _ => status::NACK_DATA,
        }
    }

    fn write_user(&mut self, address: u16, data: &[u8]) -> BusStatus {
        let mb_ctrl = DynamicRegister::MB_CTRL_Dyn.address();
        let mb_end = mailbox::START + mailbox::SIZE as u16;

        if (mailbox::START..mb_end).contains(&address) {
            if !self.ftm_enabled() || data.len() > mailbox::SIZE {
                return status::NACK_DATA;
            }
            for (i, &b) in data.iter().enumerate() {
                self.user.insert(address + i as u16, b);
            }
            let ctrl = self.load(USER, mb_ctrl) | MbCtrl::HOST_PUT_MSG.bits();
            self.user.insert(mb_ctrl, ctrl);
            self.user.insert(DynamicRegister::MB_LEN_Dyn.address(), (data.len() - 1) as u8);
            return status::SUCCESS;
        }

        if address >= DynamicRegister::GPO_CTRL_Dyn.address() {
            // Only MB_EN is host writable in this model
            if address == mb_ctrl {
                let enable = data[0] & MbCtrl::MB_EN.bits() != 0
                    && self.ftm_allowed()
                    && !self.reject_ftm;
                if enable {
                    self.user.insert(mb_ctrl, self.load(USER, mb_ctrl) | MbCtrl::MB_EN.bits());
                } else {
                    self.user.insert(mb_ctrl, 0);
                    self.user.insert(DynamicRegister::MB_LEN_Dyn.address(), 0);
                }
            }
            return status::SUCCESS;
        }

        for (i, &b) in data.iter().enumerate() {
            self.user.insert(address.wrapping_add(i as u16), b);
        }
        status::SUCCESS
    }

    fn write_system(&mut self, address: u16, data: &[u8]) -> BusStatus {
        if !self.session_open {
            return status::NACK_DATA;
        }
        for (i, &b) in data.iter().enumerate() {
            self.system.insert(address.wrapping_add(i as u16), b);
        }
        status::SUCCESS
    }
}

impl TwoWire for SimSt25dv {
    fn begin_transfer(&mut self, device: u8) {
        self.calls.push(Call::Begin(device));
        self.device = Some(device);
        self.tx.clear();
    }

    fn write_byte(&mut self, byte: u8) {
        self.tx.push(byte);
    }

    fn end_transfer(&mut self, _send_stop: bool) -> BusStatus {
        let device = self.device.take();
        let frame = std::mem::take(&mut self.tx);
        self.calls.push(Call::End { device, frame: frame.clone() });

        let nth = self.ends;
        self.ends += 1;
        if let Some((fail_at, code)) = self.fail_end {
            if fail_at == nth {
                return code;
            }
        }

        let Some(device) = device else {
            return status::SUCCESS;
        };
        if device != USER && device != SYSTEM {
            return status::NACK_ADDRESS;
        }
        if frame.len() < 2 {
            return status::SUCCESS;
        }

        let address = u16::from_be_bytes([frame[0], frame[1]]);
        let data = &frame[2..];
        self.pointer = address;
        if data.is_empty() {
            return status::SUCCESS;
        }

        if device == SYSTEM && address == SystemRegister::I2C_PWD.address() {
            self.password_command(data)
        } else if device == SYSTEM {
            self.write_system(address, data)
        } else {
            self.write_user(address, data)
        }
    }

    fn request_bytes(&mut self, device: u8, count: usize) -> usize {
        self.calls.push(Call::Request(device, count));
        self.rx.clear();
        if device != USER && device != SYSTEM {
            return 0;
        }

        let offered = self.offer_limit.map_or(count, |limit| count.min(limit)) + self.extra_bytes;
        for i in 0..offered {
            let b = self.load(device, self.pointer.wrapping_add(i as u16));
            self.rx.push_back(b);
        }
        self.pointer = self.pointer.wrapping_add(offered as u16);
        offered
    }

    fn bytes_available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0xFF)
    }
}

/// Delay provider that only records what was asked of it
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub waits_ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ms.push(ns.div_ceil(1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
    }
}
