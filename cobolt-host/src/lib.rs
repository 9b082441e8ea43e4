//! host library for the serial protocol to Cobolt lasers

use serialport::SerialPort;

mod config;
mod discovery;
mod error;
pub mod hello;
mod laser;
mod modulation;
mod ports;
mod session;

#[cfg(test)]
mod mock;

pub use config::{LinkConfig, DEFAULT_TIMEOUT, HELLO_BAUD_RATE, LASER_BAUD_RATE};
pub use discovery::{
    find_laser, list_lasers, locate_laser, open_laser, probe_serial_number, scan_lasers,
    SerialLaser,
};
pub use error::{Error, Result};
pub use laser::{Laser, LaserInfo, LaserStatus};
pub use modulation::{Dpl06, Mld06, ModulationState};
pub use ports::{list_ports, select_port, PortDescriptor};
pub use session::Session;

pub fn connect(port_name: &str, config: &LinkConfig) -> Result<Box<dyn SerialPort>> {
    let port = serialport::new(port_name, config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .flow_control(serialport::FlowControl::None)
        .stop_bits(serialport::StopBits::One)
        .parity(serialport::Parity::None)
        .timeout(config.timeout)
        .open()?;
    tracing::debug!(port = port_name, baud = config.baud_rate, "opened port");
    Ok(port)
}
