//! Modulation commands of the 06-01 laser families

use std::io::{Read, Write};

use cobolt_proto::{Command, Impedance};
use serde::Serialize;
use tracing::info;

use crate::laser::{unexpected, Laser};
use crate::Result;

/// Which modulation inputs are enabled.
#[derive(Serialize, Debug, Clone, Copy, Eq, PartialEq)]
pub struct ModulationState {
    pub analog: bool,
    pub digital: bool,
}

fn modulation_state<P: Read + Write>(laser: &mut Laser<P>) -> Result<ModulationState> {
    let digital = laser.query_flag(&Command::DigitalModulationState)?;
    let analog = laser.query_flag(&Command::AnalogModulationState)?;
    Ok(ModulationState { analog, digital })
}

/// 06-MLD diode laser, borrowed from a [`Laser`] of that kind.
pub struct Mld06<'l, P> {
    laser: &'l mut Laser<P>,
}

impl<'l, P: Read + Write> Mld06<'l, P> {
    pub(crate) fn new(laser: &'l mut Laser<P>) -> Self {
        Self { laser }
    }

    /// Enters modulation mode, optionally setting the modulation power in mW first.
    pub fn modulation_mode(&mut self, power_mw: Option<f64>) -> Result<()> {
        info!("entering modulation mode");
        if let Some(power_mw) = power_mw {
            self.laser.execute(&Command::SetModulationPower(power_mw))?;
        }
        self.laser.execute(&Command::ModulationMode)
    }

    pub fn digital_modulation(&mut self, enable: bool) -> Result<()> {
        self.laser.execute(&Command::DigitalModulation(enable))
    }

    pub fn analog_modulation(&mut self, enable: bool) -> Result<()> {
        self.laser.execute(&Command::AnalogModulation(enable))
    }

    pub fn on_off_modulation(&mut self, enable: bool) -> Result<()> {
        self.laser.execute(&Command::OnOffModulation(enable))
    }

    pub fn modulation_state(&mut self) -> Result<ModulationState> {
        modulation_state(self.laser)
    }

    pub fn set_modulation_power(&mut self, power_mw: f64) -> Result<()> {
        info!(power_mw, "setting modulation power");
        self.laser.execute(&Command::SetModulationPower(power_mw))
    }

    /// Modulation power setpoint in mW
    pub fn modulation_power(&mut self) -> Result<f64> {
        self.laser.query_value(&Command::ModulationPower)
    }

    pub fn set_analog_impedance(&mut self, impedance: Impedance) -> Result<()> {
        self.laser.execute(&Command::SetAnalogImpedance(impedance))
    }

    pub fn analog_impedance(&mut self) -> Result<Impedance> {
        let cmd = Command::AnalogImpedance;
        let line = self.laser.query(&cmd)?;
        Impedance::from_code(&line).ok_or_else(|| unexpected(&cmd, &line))
    }
}

/// 06-DPL modulated DPSS laser, borrowed from a [`Laser`] of that kind.
pub struct Dpl06<'l, P> {
    laser: &'l mut Laser<P>,
}

impl<'l, P: Read + Write> Dpl06<'l, P> {
    pub(crate) fn new(laser: &'l mut Laser<P>) -> Self {
        Self { laser }
    }

    /// Enters modulation mode, optionally setting the high current in mA first.
    pub fn modulation_mode(&mut self, high_ma: Option<f64>) -> Result<()> {
        info!("entering modulation mode");
        if let Some(high_ma) = high_ma {
            self.laser.execute(&Command::SetModulationCurrentHigh(high_ma))?;
        }
        self.laser.execute(&Command::ModulationMode)
    }

    pub fn digital_modulation(&mut self, enable: bool) -> Result<()> {
        self.laser.execute(&Command::DigitalModulation(enable))
    }

    pub fn analog_modulation(&mut self, enable: bool) -> Result<()> {
        self.laser.execute(&Command::AnalogModulation(enable))
    }

    pub fn modulation_state(&mut self) -> Result<ModulationState> {
        modulation_state(self.laser)
    }

    pub fn set_modulation_current_high(&mut self, high_ma: f64) -> Result<()> {
        self.laser.execute(&Command::SetModulationCurrentHigh(high_ma))
    }

    pub fn set_modulation_current_low(&mut self, low_ma: f64) -> Result<()> {
        self.laser.execute(&Command::SetModulationCurrentLow(low_ma))
    }

    /// Modulation current setpoints in mA as `(high, low)`
    pub fn modulation_current(&mut self) -> Result<(f64, f64)> {
        let high = self.laser.query_value(&Command::ModulationCurrentHigh)?;
        let low = self.laser.query_value(&Command::ModulationCurrentLow)?;
        Ok((high, low))
    }

    /// Modulation TEC temperature in °C
    pub fn modulation_tec(&mut self) -> Result<f64> {
        self.laser.query_value(&Command::ModulationTec)
    }

    pub fn set_modulation_tec(&mut self, temperature: f64) -> Result<()> {
        info!(temperature, "setting modulation TEC");
        self.laser.execute(&Command::SetModulationTec(temperature))
    }

    pub fn modulation_tec_setpoint(&mut self) -> Result<f64> {
        self.laser.query_value(&Command::ModulationTecSetpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPort;
    use std::time::Duration;

    const SHORT: Duration = Duration::from_millis(20);
    const MLD_IDENTITY: &[u8] = b"9.1\r\n100\r\n0405-06-01-0100-100\r\n";
    const DPL_IDENTITY: &[u8] = b"9.1\r\n200\r\n0532-06-01-0050-300\r\n";

    fn connect(identity: &[u8], replies: &[u8]) -> (Laser<MockPort>, crate::mock::MockHandle) {
        let mut rx = identity.to_vec();
        rx.extend_from_slice(replies);
        let (port, handle) = MockPort::new(&rx);
        let laser = Laser::connect("/dev/ttyUSB0", port, SHORT).unwrap();
        (laser, handle)
    }

    fn sent_after_identity(handle: &crate::mock::MockHandle) -> String {
        handle.sent_text().replacen("gfv?\r\nsn?\r\nglm?\r\n", "", 1)
    }

    #[test]
    fn test_mld_modulation() -> Result<()> {
        let (mut laser, handle) = connect(MLD_IDENTITY, b"OK\r\nOK\r\nOK\r\n1\r\n0\r\n1\r\n");
        let mut mld = laser.mld()?;
        mld.modulation_mode(Some(30.0))?;
        mld.on_off_modulation(true)?;
        assert_eq!(
            ModulationState {
                analog: false,
                digital: true
            },
            mld.modulation_state()?
        );
        assert_eq!(Impedance::FiftyOhm, mld.analog_impedance()?);
        assert_eq!(
            "slmp 30\r\nem\r\neoom\r\ngdmes?\r\ngames?\r\ngalis?\r\n",
            sent_after_identity(&handle)
        );
        assert!(laser.dpl().is_err());
        Ok(())
    }

    #[test]
    fn test_dpl_modulation() -> Result<()> {
        let (mut laser, handle) = connect(DPL_IDENTITY, b"OK\r\nOK\r\n1500\r\n300\r\n25.1\r\n");
        let mut dpl = laser.dpl()?;
        dpl.set_modulation_current_high(1500.0)?;
        dpl.set_modulation_current_low(300.0)?;
        assert_eq!((1500.0, 300.0), dpl.modulation_current()?);
        assert_eq!(25.1, dpl.modulation_tec()?);
        assert_eq!(
            "smc 1500\r\nslth 300\r\ngmc?\r\nglth?\r\nrtec4t?\r\n",
            sent_after_identity(&handle)
        );
        assert!(laser.mld().is_err());
        Ok(())
    }
}
