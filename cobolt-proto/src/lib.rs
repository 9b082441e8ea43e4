//! Protocol for host to Cobolt laser communication
//!
//! Cobolt lasers speak a line based ASCII protocol: every command is a short
//! mnemonic terminated by `\r\n` and every command is answered by exactly one
//! line, either `OK`, a value or an error text.
#![cfg_attr(not(feature = "std"), no_std)]
use core::fmt::{self, Write};
use heapless::{String, Vec};

mod model;
mod status;

pub use model::{
    current_in_milliamps, legacy_identity, legacy_model_number, wavelength_nm, LaserKind,
};
pub use status::{AutostartState, Fault, Impedance, Interlock, OperatingMode};

pub const TERMINATION: &[u8; 2] = b"\r\n";
pub const CMD_BUF_SIZE: usize = 64;
/// Longest reply line a host should accumulate before giving up on a newline.
pub const LINE_BUF_SIZE: usize = 256;

/// Commands that can be sent to a Cobolt laser.
///
/// Setpoints carry the value in the unit the laser expects on the wire,
/// conversions from user facing units happen on the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command<'a> {
    /// `gsn?`
    GetSerialNumber,
    /// `sn?`
    SerialNumber,
    FirmwareVersion,
    ModelNumber,
    /// `?`, answered with `OK` by a responsive laser
    Ping,
    /// Autostart sequence, the laser waits for its TEC setpoints and warms up
    TurnOn,
    TurnOff,
    IsOn,
    Interlock,
    Fault,
    ClearFault,
    OperatingMode,
    AutostartState,
    ConstantCurrent,
    SetCurrent(f64),
    Current,
    CurrentSetpoint,
    ConstantPower,
    /// Power setpoint in W
    SetPower(f64),
    Power,
    PowerSetpoint,
    OperatingHours,
    ModulationMode,
    DigitalModulation(bool),
    AnalogModulation(bool),
    OnOffModulation(bool),
    DigitalModulationState,
    AnalogModulationState,
    /// Modulation power in mW
    SetModulationPower(f64),
    ModulationPower,
    SetAnalogImpedance(Impedance),
    AnalogImpedance,
    /// Modulation high current in mA
    SetModulationCurrentHigh(f64),
    /// Modulation low current in mA
    SetModulationCurrentLow(f64),
    ModulationCurrentHigh,
    ModulationCurrentLow,
    ModulationTec,
    /// Modulation TEC temperature in °C
    SetModulationTec(f64),
    ModulationTecSetpoint,
    /// Anything else, sent verbatim
    Raw(&'a str),
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::GetSerialNumber => f.write_str("gsn?"),
            Command::SerialNumber => f.write_str("sn?"),
            Command::FirmwareVersion => f.write_str("gfv?"),
            Command::ModelNumber => f.write_str("glm?"),
            Command::Ping => f.write_str("?"),
            Command::TurnOn => f.write_str("@cob1"),
            Command::TurnOff => f.write_str("l0"),
            Command::IsOn => f.write_str("l?"),
            Command::Interlock => f.write_str("ilk?"),
            Command::Fault => f.write_str("f?"),
            Command::ClearFault => f.write_str("cf"),
            Command::OperatingMode => f.write_str("gam?"),
            Command::AutostartState => f.write_str("gom?"),
            Command::ConstantCurrent => f.write_str("ci"),
            Command::SetCurrent(current) => write!(f, "slc {}", current),
            Command::Current => f.write_str("i?"),
            Command::CurrentSetpoint => f.write_str("glc?"),
            Command::ConstantPower => f.write_str("cp"),
            Command::SetPower(watts) => write!(f, "p {}", watts),
            Command::Power => f.write_str("pa?"),
            Command::PowerSetpoint => f.write_str("p?"),
            Command::OperatingHours => f.write_str("hrs?"),
            Command::ModulationMode => f.write_str("em"),
            Command::DigitalModulation(enable) => write!(f, "sdmes {}", u8::from(*enable)),
            Command::AnalogModulation(enable) => write!(f, "sames {}", u8::from(*enable)),
            Command::OnOffModulation(true) => f.write_str("eoom"),
            Command::OnOffModulation(false) => f.write_str("xoom"),
            Command::DigitalModulationState => f.write_str("gdmes?"),
            Command::AnalogModulationState => f.write_str("games?"),
            Command::SetModulationPower(power) => write!(f, "slmp {}", power),
            Command::ModulationPower => f.write_str("glmp?"),
            Command::SetAnalogImpedance(impedance) => write!(f, "salis {}", impedance.code()),
            Command::AnalogImpedance => f.write_str("galis?"),
            Command::SetModulationCurrentHigh(current) => write!(f, "smc {}", current),
            Command::SetModulationCurrentLow(current) => write!(f, "slth {}", current),
            Command::ModulationCurrentHigh => f.write_str("gmc?"),
            Command::ModulationCurrentLow => f.write_str("glth?"),
            Command::ModulationTec => f.write_str("rtec4t?"),
            Command::SetModulationTec(temperature) => write!(f, "stec4t {}", temperature),
            Command::ModulationTecSetpoint => f.write_str("gtec4t?"),
            Command::Raw(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EncodeError {
    /// The command does not fit into [`CMD_BUF_SIZE`] bytes
    Overflow,
    /// Empty command or a line terminator inside the command text
    InvalidText,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Overflow => write!(f, "command longer than {} bytes", CMD_BUF_SIZE),
            EncodeError::InvalidText => f.write_str("command is empty or contains a line break"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// A single reply line with its terminator removed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Reply<'a> {
    Ok,
    Error(&'a str),
    Value(&'a str),
}

impl<'a> Reply<'a> {
    pub fn from_line(line: &'a str) -> Self {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        if line == "OK" {
            Reply::Ok
        } else if contains_error(line) {
            Reply::Error(line)
        } else {
            Reply::Value(line)
        }
    }

    pub fn as_str(&self) -> &'a str {
        match self {
            Reply::Ok => "OK",
            Reply::Error(text) | Reply::Value(text) => *text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

fn contains_error(line: &str) -> bool {
    line.as_bytes()
        .windows(5)
        .any(|w| w.eq_ignore_ascii_case(b"error"))
}

#[derive(Debug, Eq, PartialEq)]
pub enum ParseResult<'a> {
    Found(Reply<'a>),
    Need,
    DataInvalid,
}

/// Looks for a complete reply line at the start of `line_buf`.
///
/// Anything after the first `\n` is ignored.
pub fn parse(line_buf: &[u8]) -> ParseResult<'_> {
    let end = match line_buf.iter().position(|b| *b == b'\n') {
        Some(pos) => pos,
        None => return ParseResult::Need,
    };
    match core::str::from_utf8(&line_buf[..end]) {
        Ok(line) => ParseResult::Found(Reply::from_line(line)),
        Err(_) => ParseResult::DataInvalid,
    }
}

pub fn wrap_cmd(cmd: &Command<'_>) -> Result<Vec<u8, CMD_BUF_SIZE>, EncodeError> {
    let mut text = String::<CMD_BUF_SIZE>::new();
    write!(text, "{}", cmd).map_err(|_| EncodeError::Overflow)?;
    if text.is_empty() || text.contains(&['\r', '\n'][..]) {
        return Err(EncodeError::InvalidText);
    }
    let mut buf = Vec::<u8, CMD_BUF_SIZE>::new();
    buf.extend_from_slice(text.as_bytes())
        .map_err(|_| EncodeError::Overflow)?;
    buf.extend_from_slice(TERMINATION)
        .map_err(|_| EncodeError::Overflow)?;
    Ok(buf)
}
