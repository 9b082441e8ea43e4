//! Finding Cobolt lasers among the serial ports of the system

use std::io::{Read, Write};
use std::time::Duration;

use cobolt_proto::Command;
use serialport::SerialPort;
use tracing::{debug, info, warn};

use crate::{connect, list_ports, Error, Laser, LinkConfig, PortDescriptor, Result, Session};

pub type SerialLaser = Laser<Box<dyn SerialPort>>;

/// Opens a port and identifies the laser on it.
pub fn open_laser(port_name: &str, config: &LinkConfig) -> Result<SerialLaser> {
    let port = connect(port_name, config)?;
    Laser::connect(port_name, port, config.timeout)
}

/// Returns every serial port that answers like a Cobolt laser.
pub fn list_lasers(config: &LinkConfig) -> Result<Vec<SerialLaser>> {
    scan_lasers(&list_ports()?, config, connect)
}

/// Opens the serial laser with the given serial number.
pub fn find_laser(serial_number: &str, config: &LinkConfig) -> Result<SerialLaser> {
    locate_laser(serial_number, &list_ports()?, config, connect)
}

/// Identifies the device behind each of `ports` and keeps the lasers.
///
/// Ports that fail to open, do not answer like a Cobolt laser or report a
/// `Syntax` error as serial number are skipped.
pub fn scan_lasers<P, F>(
    ports: &[PortDescriptor],
    config: &LinkConfig,
    mut open: F,
) -> Result<Vec<Laser<P>>>
where
    P: Read + Write,
    F: FnMut(&str, &LinkConfig) -> Result<P>,
{
    let mut lasers = Vec::new();
    for port in ports {
        let name = port.port.as_str();
        let laser = open(name, config).and_then(|io| Laser::connect(name, io, config.timeout));
        match laser {
            Ok(laser) if laser.serial_number().map_or(false, is_laser_serial) => {
                info!(port = name, laser = %laser, "found laser");
                lasers.push(laser);
            }
            Ok(laser) => debug!(port = name, laser = %laser, "skipping device"),
            Err(err) => warn!(port = name, %err, "probe failed"),
        }
    }
    Ok(lasers)
}

/// Probes the serial number behind each of `ports` and opens the first match.
///
/// The probing port is closed before the matching one is opened again for
/// the laser.
pub fn locate_laser<P, F>(
    serial_number: &str,
    ports: &[PortDescriptor],
    config: &LinkConfig,
    mut open: F,
) -> Result<Laser<P>>
where
    P: Read + Write,
    F: FnMut(&str, &LinkConfig) -> Result<P>,
{
    for port in ports {
        let name = port.port.as_str();
        let found = open(name, config).and_then(|io| probe_serial_number(io, config.timeout));
        match found {
            Ok(found) if found == serial_number => {
                info!(port = name, serial_number, "found laser");
                let io = open(name, config)?;
                return Laser::connect(name, io, config.timeout);
            }
            Ok(found) => debug!(port = name, %found, "serial number mismatch"),
            Err(err) => debug!(port = name, %err, "probe failed"),
        }
    }
    Err(Error::NoLaserFound(serial_number.to_string()))
}

/// Asks a device for its serial number and closes the port again.
pub fn probe_serial_number<P: Read + Write>(port: P, timeout: Duration) -> Result<String> {
    let mut session = Session::new(port, timeout);
    session.query(&Command::SerialNumber)
}

fn is_laser_serial(serial_number: &str) -> bool {
    !serial_number.is_empty() && !serial_number.starts_with("Syntax")
}
