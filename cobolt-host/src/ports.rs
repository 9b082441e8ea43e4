use std::fmt;

use serde::Serialize;
use serialport::{SerialPortInfo, SerialPortType};

use crate::{Error, Result};

const NOT_AVAILABLE: &str = "n/a";

/// One serial port found on the system.
#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
pub struct PortDescriptor {
    pub port: String,
    pub description: String,
    pub hardware_id: String,
}

impl From<SerialPortInfo> for PortDescriptor {
    fn from(info: SerialPortInfo) -> Self {
        let (description, hardware_id) = describe(&info.port_type);
        Self {
            port: info.port_name,
            description,
            hardware_id,
        }
    }
}

impl fmt::Display for PortDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.port, self.description, self.hardware_id
        )
    }
}

fn describe(port_type: &SerialPortType) -> (String, String) {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let description = usb
                .product
                .clone()
                .or_else(|| usb.manufacturer.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            let mut hardware_id = format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid);
            if let Some(serial_number) = &usb.serial_number {
                hardware_id.push_str(" SER=");
                hardware_id.push_str(serial_number);
            }
            (description, hardware_id)
        }
        SerialPortType::PciPort => (NOT_AVAILABLE.to_string(), "PCI".to_string()),
        SerialPortType::BluetoothPort => (NOT_AVAILABLE.to_string(), "BLUETOOTH".to_string()),
        SerialPortType::Unknown => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    }
}

/// Enumerates the serial ports of the system in the order the OS reports them.
pub fn list_ports() -> Result<Vec<PortDescriptor>> {
    let ports: Vec<PortDescriptor> = serialport::available_ports()?
        .into_iter()
        .map(PortDescriptor::from)
        .collect();
    tracing::debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports)
}

pub fn select_port(ports: &[PortDescriptor], index: usize) -> Result<&PortDescriptor> {
    ports.get(index).ok_or(Error::PortOutOfRange {
        index,
        count: ports.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn descriptor(port: &str) -> PortDescriptor {
        PortDescriptor {
            port: port.to_string(),
            description: NOT_AVAILABLE.to_string(),
            hardware_id: NOT_AVAILABLE.to_string(),
        }
    }

    #[test]
    fn test_select_port_bounds() {
        let ports = vec![descriptor("/dev/ttyUSB0"), descriptor("/dev/ttyUSB1")];
        assert_eq!("/dev/ttyUSB1", select_port(&ports, 1).unwrap().port);
        assert!(matches!(
            select_port(&ports, 2),
            Err(Error::PortOutOfRange { index: 2, count: 2 })
        ));
        assert!(matches!(
            select_port(&[], 0),
            Err(Error::PortOutOfRange { index: 0, count: 0 })
        ));
    }

    #[test]
    fn test_out_of_range_message() {
        let err = select_port(&[], 7).unwrap_err();
        assert_eq!("Port ID out of range", err.to_string());
    }

    #[test]
    fn test_describe_usb_port() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyACM0".to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x25dc,
                pid: 0x0006,
                serial_number: Some("A1B2".to_string()),
                manufacturer: Some("Cobolt AB".to_string()),
                product: None,
            }),
        };
        let port = PortDescriptor::from(info);
        assert_eq!("Cobolt AB", port.description);
        assert_eq!("USB VID:PID=25DC:0006 SER=A1B2", port.hardware_id);
        assert_eq!(
            "(/dev/ttyACM0, Cobolt AB, USB VID:PID=25DC:0006 SER=A1B2)",
            port.to_string()
        );
    }

    #[test]
    fn test_describe_other_ports() {
        let (description, hardware_id) = describe(&SerialPortType::PciPort);
        assert_eq!(("n/a", "PCI"), (description.as_str(), hardware_id.as_str()));
        let (_, hardware_id) = describe(&SerialPortType::Unknown);
        assert_eq!("n/a", hardware_id);
    }
}
