use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use libst25dv::{Eh1TwoWire, I2cFtBitbang, MemoryRegion, St25dv, StdDelay};

/// Bytes per read while dumping user memory
const DUMP_CHUNK: usize = 32;

#[derive(Parser)]
#[command(name = "st25dv_cli", version = "1.0")]
struct Args {
    /// FTDI device description
    #[arg(long, default_value = "Facet2 FabA+ C")]
    device: String,
    /// Bit-bang pin used as SCL
    #[arg(long, default_value_t = 6)]
    scl: u8,
    /// Bit-bang pin used as SDA
    #[arg(long, default_value_t = 7)]
    sda: u8,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: log::Level,
    /// Command to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read registers
    Read {
        region: Region,
        /// First register (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_address)]
        address: u16,
        /// Number of bytes
        len: usize,
    },
    /// Write registers
    Write {
        region: Region,
        #[arg(value_parser = parse_address)]
        address: u16,
        /// Data as hex string
        data: String,
    },
    /// Present the I2C password to open a security session
    PresentPassword {
        /// 8 byte password as hex string
        password: String,
    },
    /// Change the I2C password (needs an open session)
    WritePassword {
        password: String,
    },
    /// Show whether the I2C security session is open
    Session,
    /// Switch fast transfer mode on
    EnableFtm,
    /// Switch fast transfer mode off
    DisableFtm,
    /// Provision a factory fresh tag for fast transfer mode
    FirstTimeSetup,
    /// Dump the user EEPROM to a file
    Dump {
        output: PathBuf,
    },
    /// Put a message (hex string) in the mailbox
    MailboxSend {
        data: String,
    },
    /// Print the message waiting in the mailbox
    MailboxRecv,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Region {
    Dynamic,
    User,
    System,
}

impl From<Region> for MemoryRegion {
    fn from(region: Region) -> Self {
        match region {
            Region::Dynamic => MemoryRegion::Dynamic,
            Region::User => MemoryRegion::User,
            Region::System => MemoryRegion::System,
        }
    }
}

fn parse_address(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn parse_password(s: &str) -> Result<[u8; 8]> {
    let bytes = hex::decode(s)?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow!("Password must be 8 bytes, got {}", b.len()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    simple_logger::init_with_level(args.log_level)?;

    let i2c_if = I2cFtBitbang::open(&args.device, args.scl, args.sda)
        .map_err(|e| anyhow!("Opening {:?} failed: {e:?}", args.device))?;
    let mut tag = St25dv::new(Eh1TwoWire::new(i2c_if), StdDelay);

    match args.command {
        Command::Read { region, address, len } => {
            let mut buf = vec![0u8; len];
            let n = tag.read(MemoryRegion::from(region), address, &mut buf)?;
            println!("{}", hex::encode(&buf[..n]));
            if n < len {
                eprintln!("[!] Chip returned {n} of {len} bytes");
            }
        },
        Command::Write { region, address, data } => {
            let data = hex::decode(data)?;
            tag.write(MemoryRegion::from(region), address, &data)?;
            println!("[*] Wrote {} bytes @ {address:#06X}", data.len());
        },
        Command::PresentPassword { password } => {
            tag.present_password(&parse_password(&password)?)?;
            let open = tag.session_open()?;
            println!("[*] Security session {}", if open { "open" } else { "closed" });
        },
        Command::WritePassword { password } => {
            tag.write_password(&parse_password(&password)?)?;
            println!("[*] Password changed");
        },
        Command::Session => {
            let open = tag.session_open()?;
            println!("Security session {}", if open { "open" } else { "closed" });
        },
        Command::EnableFtm => {
            tag.enable_ftm()?;
            println!("[*] Fast transfer mode enabled");
        },
        Command::DisableFtm => {
            tag.disable_ftm()?;
            println!("[*] Fast transfer mode disabled");
        },
        Command::FirstTimeSetup => {
            tag.first_time_setup()?;
            println!("[*] Tag provisioned, fast transfer mode can be enabled");
        },
        Command::Dump { output } => {
            let size = tag.user_memory_size()?;
            println!("[+] User memory: {size} bytes");

            let progress = ProgressBar::new(size as u64)
                .with_style(
                    ProgressStyle::default_spinner()
                        .template("[{elapsed_precise}, eta:{eta}] {bar:40.cyan/blue} {bytes} / {total_bytes} ({binary_bytes_per_sec})")?
                );

            let mut file = File::create(output)?;
            let mut buf = [0u8; DUMP_CHUNK];
            for offset in (0..size).step_by(DUMP_CHUNK) {
                let chunk = &mut buf[..DUMP_CHUNK.min(size - offset)];
                let address = u16::try_from(offset)?;
                let n = tag.read(MemoryRegion::User, address, chunk)?;
                if n != chunk.len() {
                    return Err(anyhow!("Short read @ {address:#06X}: {n} of {} bytes", chunk.len()));
                }
                file.write_all(chunk)?;
                progress.set_position((offset + n) as u64);
            }
            progress.finish();
            println!("[*] Done");
        },
        Command::MailboxSend { data } => {
            let data = hex::decode(data)?;
            tag.write_message(&data)?;
            println!("[*] Message of {} bytes queued", data.len());
        },
        Command::MailboxRecv => {
            let mut buf = [0u8; 256];
            let n = tag.read_message(&mut buf)?;
            if n == 0 {
                println!("Mailbox empty");
            } else {
                println!("{}", hex::encode(&buf[..n]));
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x2006"), Ok(0x2006));
        assert_eq!(parse_address("0X000d"), Ok(0x000D));
        assert_eq!(parse_address("13"), Ok(13));
        assert!(parse_address("0x10000").is_err());
        assert!(parse_address("dynamic").is_err());
    }

    #[test]
    fn test_parse_password() {
        assert_eq!(parse_password("0000000000000000").unwrap(), [0u8; 8]);
        assert_eq!(
            parse_password("0102030405060708").unwrap(),
            [1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert!(parse_password("01020304").is_err());
        assert!(parse_password("zz").is_err());
    }

    #[test]
    fn test_region_mapping() {
        assert_eq!(MemoryRegion::from(Region::Dynamic), MemoryRegion::Dynamic);
        assert_eq!(MemoryRegion::from(Region::System), MemoryRegion::System);
    }
}
