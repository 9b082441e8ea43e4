use std::fmt;
use std::io::{Read, Write};
use std::time::Duration;

use cobolt_proto::{
    self as cp, AutostartState, Command, Fault, Interlock, LaserKind, OperatingMode, Reply,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::modulation::{Dpl06, Mld06};
use crate::{Error, Result, Session};

/// A connected Cobolt laser.
///
/// Dropping the laser closes its port. Family specific commands are reached
/// through [`Laser::mld`] and [`Laser::dpl`].
pub struct Laser<P> {
    session: Session<P>,
    port_name: String,
    serial_number: Option<String>,
    model_number: Option<String>,
    kind: LaserKind,
}

/// Identity of a laser, for listings.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LaserInfo {
    pub port: String,
    pub serial_number: Option<String>,
    pub model_number: Option<String>,
    pub kind: LaserKind,
    pub wavelength_nm: Option<u16>,
}

/// Snapshot of the operating state of a laser.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LaserStatus {
    pub on: bool,
    pub interlock: Option<Interlock>,
    pub fault: Option<Fault>,
    pub mode: Option<OperatingMode>,
    pub state: Option<AutostartState>,
    pub current_ma: f64,
    pub power_mw: f64,
}

impl<P: Read + Write> Laser<P> {
    /// Wraps an open port without talking to the device yet.
    pub fn new(port_name: impl Into<String>, port: P, timeout: Duration) -> Self {
        Self {
            session: Session::new(port, timeout),
            port_name: port_name.into(),
            serial_number: None,
            model_number: None,
            kind: LaserKind::Generic,
        }
    }

    /// Wraps an open port and identifies the laser behind it.
    pub fn connect(port_name: impl Into<String>, port: P, timeout: Duration) -> Result<Self> {
        let mut laser = Self::new(port_name, port, timeout);
        laser.identify()?;
        Ok(laser)
    }

    /// Fetches serial and model number and classifies the laser.
    ///
    /// Fails with [`Error::NotCobolt`] when the device does not answer like a
    /// Cobolt laser.
    pub fn identify(&mut self) -> Result<()> {
        let firmware = self.identity_query(&Command::FirmwareVersion)?;
        if Reply::from_line(&firmware).is_error() {
            return Err(Error::NotCobolt(self.port_name.clone()));
        }
        let mut serial_number = self.identity_query(&Command::SerialNumber)?;
        let mut model_number = None;
        if !firmware.contains('.') {
            if let Some((prefix, serial)) = cp::legacy_identity(&serial_number) {
                model_number = cp::legacy_model_number(prefix).map(|m| m.as_str().to_string());
                serial_number = serial.to_string();
            }
        } else {
            model_number = Some(self.identity_query(&Command::ModelNumber)?);
        }

        self.kind = model_number
            .as_deref()
            .map_or(LaserKind::Generic, LaserKind::classify);
        self.serial_number = Some(serial_number);
        self.model_number = model_number;
        info!(port = self.port_name.as_str(), laser = %self, "identified laser");
        Ok(())
    }

    fn identity_query(&mut self, cmd: &Command<'_>) -> Result<String> {
        match self.session.query(cmd) {
            Err(Error::NoResponse(_)) => Err(Error::NotCobolt(self.port_name.clone())),
            result => result,
        }
    }

    /// Sends any command and returns the raw reply line.
    pub fn query(&mut self, cmd: &Command<'_>) -> Result<String> {
        self.session.query(cmd)
    }

    /// Sends a command whose reply only signals success.
    pub(crate) fn execute(&mut self, cmd: &Command<'_>) -> Result<()> {
        let line = self.session.query(cmd)?;
        match Reply::from_line(&line) {
            Reply::Error(text) => Err(unexpected(cmd, text)),
            _ => Ok(()),
        }
    }

    pub(crate) fn query_value(&mut self, cmd: &Command<'_>) -> Result<f64> {
        let line = self.session.query(cmd)?;
        line.trim().parse().map_err(|_| unexpected(cmd, &line))
    }

    pub(crate) fn query_flag(&mut self, cmd: &Command<'_>) -> Result<bool> {
        let line = self.session.query(cmd)?;
        match line.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            _ => Err(unexpected(cmd, &line)),
        }
    }

    fn query_code<T>(&mut self, cmd: &Command<'_>, decode: fn(&str) -> Option<T>) -> Result<T> {
        let line = self.session.query(cmd)?;
        decode(&line).ok_or_else(|| unexpected(cmd, &line))
    }

    /// Asks the laser whether it is still answering.
    pub fn is_connected(&mut self) -> bool {
        matches!(self.session.query(&Command::Ping), Ok(line) if line == "OK")
    }

    /// Turns the laser on with the autostart sequence.
    pub fn turn_on(&mut self) -> Result<()> {
        info!("turning on laser");
        self.execute(&Command::TurnOn)
    }

    pub fn turn_off(&mut self) -> Result<()> {
        info!("turning off laser");
        self.execute(&Command::TurnOff)
    }

    pub fn is_on(&mut self) -> Result<bool> {
        self.query_flag(&Command::IsOn)
    }

    pub fn interlock(&mut self) -> Result<Interlock> {
        self.query_code(&Command::Interlock, Interlock::from_code)
    }

    pub fn fault(&mut self) -> Result<Fault> {
        self.query_code(&Command::Fault, Fault::from_code)
    }

    pub fn clear_fault(&mut self) -> Result<()> {
        self.execute(&Command::ClearFault)
    }

    pub fn operating_mode(&mut self) -> Result<OperatingMode> {
        self.query_code(&Command::OperatingMode, OperatingMode::from_code)
    }

    pub fn autostart_state(&mut self) -> Result<AutostartState> {
        self.query_code(&Command::AutostartState, AutostartState::from_code)
    }

    /// Enters constant current mode, optionally setting the current in mA first.
    pub fn constant_current(&mut self, current_ma: Option<f64>) -> Result<()> {
        match current_ma {
            Some(current_ma) => {
                self.write_current(current_ma)?;
                info!(current_ma, "entering constant current mode");
            }
            None => info!("entering constant current mode"),
        }
        self.execute(&Command::ConstantCurrent)
    }

    pub fn set_current(&mut self, current_ma: f64) -> Result<()> {
        info!(current_ma, "setting current");
        self.write_current(current_ma)
    }

    fn write_current(&mut self, current_ma: f64) -> Result<()> {
        let in_ma = self
            .model_number
            .as_deref()
            .map_or(false, cp::current_in_milliamps);
        let value = if in_ma {
            current_ma
        } else {
            current_ma / 1000.0
        };
        self.execute(&Command::SetCurrent(value))
    }

    /// Laser current in mA
    pub fn current(&mut self) -> Result<f64> {
        self.query_value(&Command::Current)
    }

    pub fn current_setpoint(&mut self) -> Result<f64> {
        self.query_value(&Command::CurrentSetpoint)
    }

    /// Enters constant power mode, optionally setting the power in mW first.
    pub fn constant_power(&mut self, power_mw: Option<f64>) -> Result<()> {
        match power_mw {
            Some(power_mw) => {
                self.execute(&Command::SetPower(power_mw / 1000.0))?;
                info!(power_mw, "entering constant power mode");
            }
            None => info!("entering constant power mode"),
        }
        self.execute(&Command::ConstantPower)
    }

    pub fn set_power(&mut self, power_mw: f64) -> Result<()> {
        info!(power_mw, "setting power");
        self.execute(&Command::SetPower(power_mw / 1000.0))
    }

    /// Output power in mW
    pub fn power(&mut self) -> Result<f64> {
        Ok(self.query_value(&Command::Power)? * 1000.0)
    }

    pub fn power_setpoint(&mut self) -> Result<f64> {
        Ok(self.query_value(&Command::PowerSetpoint)? * 1000.0)
    }

    pub fn operating_hours(&mut self) -> Result<String> {
        self.session.query(&Command::OperatingHours)
    }

    pub fn status(&mut self) -> Result<LaserStatus> {
        Ok(LaserStatus {
            on: self.is_on()?,
            interlock: Interlock::from_code(&self.query(&Command::Interlock)?),
            fault: Fault::from_code(&self.query(&Command::Fault)?),
            mode: OperatingMode::from_code(&self.query(&Command::OperatingMode)?),
            state: AutostartState::from_code(&self.query(&Command::AutostartState)?),
            current_ma: self.current()?,
            power_mw: self.power()?,
        })
    }

    /// Commands of 06-MLD lasers.
    pub fn mld(&mut self) -> Result<Mld06<'_, P>> {
        match self.kind {
            LaserKind::Mld06 => Ok(Mld06::new(self)),
            kind => Err(Error::Unsupported {
                operation: "06-MLD modulation",
                kind,
            }),
        }
    }

    /// Commands of 06-DPL lasers.
    pub fn dpl(&mut self) -> Result<Dpl06<'_, P>> {
        match self.kind {
            LaserKind::Dpl06 => Ok(Dpl06::new(self)),
            kind => Err(Error::Unsupported {
                operation: "06-DPL modulation",
                kind,
            }),
        }
    }

    /// Closes the port and leaves the laser in its current state.
    pub fn close(self) {
        debug!(port = self.port_name.as_str(), "closing laser");
    }

    /// Turns the laser off and closes the port.
    pub fn shutdown(mut self) -> Result<()> {
        self.turn_off()?;
        self.close();
        Ok(())
    }
}

impl<P> Laser<P> {
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    pub fn model_number(&self) -> Option<&str> {
        self.model_number.as_deref()
    }

    pub fn kind(&self) -> LaserKind {
        self.kind
    }

    pub fn wavelength_nm(&self) -> Option<u16> {
        self.model_number.as_deref().and_then(cp::wavelength_nm)
    }

    pub fn info(&self) -> LaserInfo {
        LaserInfo {
            port: self.port_name.clone(),
            serial_number: self.serial_number.clone(),
            model_number: self.model_number.clone(),
            kind: self.kind,
            wavelength_nm: self.wavelength_nm(),
        }
    }
}

impl<P> fmt::Display for Laser<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let serial_number = self.serial_number().unwrap_or("None");
        let model_number = self.model_number().unwrap_or("None");
        write!(
            f,
            "Serial number: {}, Model number: {}",
            serial_number, model_number
        )?;
        if let Some(nm) = self.wavelength_nm() {
            write!(f, ", Wavelength: {} nm, Type: {}", nm, self.kind)?;
        }
        Ok(())
    }
}

pub(crate) fn unexpected(cmd: &Command<'_>, response: &str) -> Error {
    Error::UnexpectedResponse {
        command: cmd.to_string(),
        response: response.to_string(),
    }
}
