//! Interactive serial number exchange
//!
//! Lists the ports, asks for one, opens it and asks the device behind it for
//! its serial number with `gsn?`.

use std::io::{self, BufRead, Read, Write};
use std::time::Duration;

use cobolt_proto::Command;

use crate::{select_port, Error, LinkConfig, PortDescriptor, Result, Session};

pub const PROMPT: &str = "Please select serial port!";

pub fn print_ports<W: Write>(out: &mut W, ports: &[PortDescriptor]) -> io::Result<()> {
    for (index, port) in ports.iter().enumerate() {
        writeln!(out, "{} : {}", index, port)?;
    }
    Ok(())
}

/// Reads one port index from the first token of the next input line.
pub fn read_port_index<R: BufRead>(input: &mut R) -> Result<usize> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let token = line.split_whitespace().next().unwrap_or("");
    token
        .parse()
        .map_err(|_| Error::InvalidSelection(token.to_string()))
}

/// Writes `gsn?` and reads one line back.
///
/// Takes the port by value so it is closed when the exchange ends, whatever
/// the outcome.
pub fn exchange<P: Read + Write>(port: P, timeout: Duration) -> Result<String> {
    let mut session = Session::new(port, timeout);
    session.send(&Command::GetSerialNumber)?;
    session.read_line()
}

/// Runs the whole exchange against the given ports.
///
/// Nothing is opened unless the selected index names one of `ports`.
pub fn run<R, W, P, F>(
    input: &mut R,
    out: &mut W,
    ports: &[PortDescriptor],
    config: &LinkConfig,
    open: F,
) -> Result<String>
where
    R: BufRead,
    W: Write,
    P: Read + Write,
    F: FnOnce(&str, &LinkConfig) -> Result<P>,
{
    writeln!(out, "{}", PROMPT)?;
    print_ports(out, ports)?;
    out.flush()?;

    let index = read_port_index(input)?;
    let selected = select_port(ports, index)?;
    tracing::debug!(port = selected.port.as_str(), "selected port");

    let port = open(&selected.port, config)?;
    writeln!(out, "Is the serial port open? Yes.")?;

    let serial_number = exchange(port, config.timeout)?;
    writeln!(out, "Serial number was: {}", serial_number)?;
    Ok(serial_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPort;
    use std::cell::Cell;
    use std::io::Cursor;

    fn ports() -> Vec<PortDescriptor> {
        vec![
            PortDescriptor {
                port: "/dev/ttyS0".to_string(),
                description: "n/a".to_string(),
                hardware_id: "PCI".to_string(),
            },
            PortDescriptor {
                port: "/dev/ttyUSB0".to_string(),
                description: "Cobolt laser".to_string(),
                hardware_id: "USB VID:PID=25DC:0006".to_string(),
            },
        ]
    }

    fn config() -> LinkConfig {
        LinkConfig::hello().with_timeout(Some(Duration::from_millis(20)))
    }

    #[test]
    fn test_read_port_index() -> Result<()> {
        assert_eq!(1, read_port_index(&mut Cursor::new("1\n"))?);
        assert_eq!(12, read_port_index(&mut Cursor::new("  12  \r\n"))?);
        assert!(matches!(
            read_port_index(&mut Cursor::new("-1\n")),
            Err(Error::InvalidSelection(_))
        ));
        assert!(matches!(
            read_port_index(&mut Cursor::new("")),
            Err(Error::InvalidSelection(_))
        ));
        Ok(())
    }

    #[test]
    fn test_exchange_sends_gsn() -> Result<()> {
        let (port, handle) = MockPort::new(b"12345\r\n");
        assert_eq!("12345", exchange(port, Duration::from_millis(20))?);
        assert_eq!(b"gsn?\r\n".to_vec(), handle.sent());
        assert!(handle.is_dropped());
        Ok(())
    }

    #[test]
    fn test_exchange_closes_port_on_error() {
        let (port, handle) = MockPort::new(b"");
        let result = exchange(port.failing_writes(), Duration::from_millis(20));
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(handle.is_dropped());
    }

    #[test]
    fn test_run() -> Result<()> {
        let (port, handle) = MockPort::new(b"12345\r\n");
        let mut out = Vec::new();
        let opened = Cell::new(None);
        let serial_number = run(
            &mut Cursor::new("1\n"),
            &mut out,
            &ports(),
            &config(),
            |name, config| {
                opened.set(Some((name.to_string(), config.baud_rate)));
                Ok(port)
            },
        )?;

        assert_eq!("12345", serial_number);
        assert_eq!(Some(("/dev/ttyUSB0".to_string(), 112_500)), opened.take());
        assert_eq!(b"gsn?\r\n".to_vec(), handle.sent());
        assert!(handle.is_dropped());
        assert_eq!(
            "Please select serial port!\n\
             0 : (/dev/ttyS0, n/a, PCI)\n\
             1 : (/dev/ttyUSB0, Cobolt laser, USB VID:PID=25DC:0006)\n\
             Is the serial port open? Yes.\n\
             Serial number was: 12345\n",
            String::from_utf8_lossy(&out)
        );
        Ok(())
    }

    #[test]
    fn test_run_rejects_out_of_range_index() {
        let mut out = Vec::new();
        let opened = Cell::new(false);
        let result = run(
            &mut Cursor::new("2\n"),
            &mut out,
            &ports(),
            &config(),
            |_, _| {
                opened.set(true);
                Ok(MockPort::new(b"").0)
            },
        );

        let err = result.unwrap_err();
        assert!(matches!(err, Error::PortOutOfRange { index: 2, count: 2 }));
        assert_eq!("Port ID out of range", err.to_string());
        assert!(!opened.get());
    }

    #[test]
    fn test_run_without_ports() {
        let mut out = Vec::new();
        let result = run(
            &mut Cursor::new("0\n"),
            &mut out,
            &[],
            &config(),
            |_, _| Ok(MockPort::new(b"").0),
        );
        assert!(matches!(result, Err(Error::PortOutOfRange { index: 0, count: 0 })));
        assert_eq!(
            "Please select serial port!\n",
            String::from_utf8_lossy(&out)
        );
    }
}
