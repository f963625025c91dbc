/// Protocol module - hardware-independent ST25DV I²C protocol definitions
///
/// Device select codes, register maps and transaction framing, without
/// depending on any bus backend.

pub mod registers;
pub mod transaction;
