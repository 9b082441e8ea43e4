use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use cobolt_proto::{self as cp, Command, ParseResult};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Request/response exchange over one open port.
///
/// Every command is answered by one line. Reads are bounded by `timeout` per
/// line, not per byte.
pub struct Session<P> {
    port: P,
    timeout: Duration,
}

impl<P: Read + Write> Session<P> {
    pub fn new(port: P, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    pub fn send(&mut self, cmd: &Command<'_>) -> Result<()> {
        let buf = cp::wrap_cmd(cmd)?;
        self.port.write_all(&buf)?;
        self.port.flush()?;
        debug!(command = %cmd, "sent");
        Ok(())
    }

    /// Reads until a line terminator arrives or the timeout elapses.
    ///
    /// On timeout whatever arrived so far is returned, possibly nothing.
    pub fn read_line(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.timeout;
        let mut line_buf = Vec::<u8>::new();
        loop {
            let mut buffer: [u8; 1] = [0; 1];
            match self.port.read(&mut buffer) {
                Ok(1) => {
                    line_buf.push(buffer[0]);
                    match cp::parse(&line_buf) {
                        ParseResult::Found(reply) => {
                            debug!(reply = reply.as_str(), "received");
                            return Ok(reply.as_str().to_string());
                        }
                        ParseResult::DataInvalid => {
                            warn!(bytes = ?line_buf, "reply is not valid UTF-8");
                            return Ok(lossy_line(&line_buf));
                        }
                        ParseResult::Need if line_buf.len() >= cp::LINE_BUF_SIZE => {
                            warn!(len = line_buf.len(), "reply line too long");
                            return Ok(lossy_line(&line_buf));
                        }
                        ParseResult::Need => (),
                    }
                }
                Ok(_) => (),
                Err(ref e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => return Err(e.into()),
            }
            if Instant::now() >= deadline {
                break;
            }
        }
        let line = lossy_line(&line_buf);
        debug!(partial = line.as_str(), "timed out waiting for line");
        Ok(line)
    }

    /// Sends a command and waits for its reply line.
    pub fn query(&mut self, cmd: &Command<'_>) -> Result<String> {
        self.send(cmd)?;
        let line = self.read_line()?;
        if line.is_empty() {
            return Err(Error::NoResponse(cmd.to_string()));
        }
        Ok(line)
    }
}

fn lossy_line(line_buf: &[u8]) -> String {
    String::from_utf8_lossy(line_buf)
        .trim_end_matches(&['\r', '\n'][..])
        .to_string()
}
