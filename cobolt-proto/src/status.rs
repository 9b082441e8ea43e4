//! Numeric status codes returned by the laser and their meaning
use core::fmt;
use serde::{Deserialize, Serialize};

/// Answer to `f?`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Fault {
    NoError,
    Temperature,
    Interlock,
    ConstantPowerTimeout,
}

impl Fault {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(Fault::NoError),
            "1" => Some(Fault::Temperature),
            "3" => Some(Fault::Interlock),
            "4" => Some(Fault::ConstantPowerTimeout),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Fault::NoError => 0,
            Fault::Temperature => 1,
            Fault::Interlock => 3,
            Fault::ConstantPowerTimeout => 4,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Fault::NoError => "No errors",
            Fault::Temperature => "Temperature error",
            Fault::Interlock => "Interlock error",
            Fault::ConstantPowerTimeout => "Constant power time out",
        };
        write!(f, "{} - {}", self.code(), text)
    }
}

/// Answer to `gam?`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum OperatingMode {
    ConstantCurrent,
    ConstantPower,
    Modulation,
}

impl OperatingMode {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(OperatingMode::ConstantCurrent),
            "1" => Some(OperatingMode::ConstantPower),
            "2" => Some(OperatingMode::Modulation),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OperatingMode::ConstantCurrent => "Constant Current",
            OperatingMode::ConstantPower => "Constant Power",
            OperatingMode::Modulation => "Modulation Mode",
        };
        write!(f, "{} - {}", self.code(), text)
    }
}

/// Answer to `gom?`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum AutostartState {
    Off,
    WaitingForKey,
    Continuous,
    OnOffModulation,
    Modulation,
    Fault,
    Aborted,
}

impl AutostartState {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(AutostartState::Off),
            "1" => Some(AutostartState::WaitingForKey),
            "2" => Some(AutostartState::Continuous),
            "3" => Some(AutostartState::OnOffModulation),
            "4" => Some(AutostartState::Modulation),
            "5" => Some(AutostartState::Fault),
            "6" => Some(AutostartState::Aborted),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for AutostartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AutostartState::Off => "Off",
            AutostartState::WaitingForKey => "Waiting for key",
            AutostartState::Continuous => "Continuous",
            AutostartState::OnOffModulation => "On/Off Modulation",
            AutostartState::Modulation => "Modulation",
            AutostartState::Fault => "Fault",
            AutostartState::Aborted => "Aborted",
        };
        write!(f, "{} - {}", self.code(), text)
    }
}

/// Answer to `ilk?`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Interlock {
    Closed,
    Open,
}

impl Interlock {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(Interlock::Closed),
            "1" => Some(Interlock::Open),
            _ => None,
        }
    }
}

impl fmt::Display for Interlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interlock::Closed => f.write_str("closed"),
            Interlock::Open => f.write_str("open"),
        }
    }
}

/// Input impedance of the analog modulation port
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Impedance {
    HighZ,
    FiftyOhm,
}

impl Impedance {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(Impedance::HighZ),
            "1" => Some(Impedance::FiftyOhm),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Impedance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impedance::HighZ => f.write_str("HighZ"),
            Impedance::FiftyOhm => f.write_str("50 Ohm"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_codes() {
        assert_eq!(Some(Fault::NoError), Fault::from_code("0"));
        assert_eq!(Some(Fault::Interlock), Fault::from_code("3\r"));
        assert_eq!(None, Fault::from_code("2"));
        assert_eq!(4, Fault::ConstantPowerTimeout.code());
    }

    #[test]
    fn test_mode_and_state_codes() {
        assert_eq!(
            Some(OperatingMode::Modulation),
            OperatingMode::from_code("2")
        );
        assert_eq!(None, OperatingMode::from_code("3"));
        assert_eq!(
            Some(AutostartState::Aborted),
            AutostartState::from_code("6")
        );
        assert_eq!(3, AutostartState::OnOffModulation.code());
        assert_eq!(None, AutostartState::from_code("OK"));
    }

    #[test]
    fn test_interlock_and_impedance() {
        assert_eq!(Some(Interlock::Open), Interlock::from_code("1"));
        assert_eq!(Some(Impedance::HighZ), Impedance::from_code("0"));
        assert_eq!(1, Impedance::FiftyOhm.code());
    }
}
