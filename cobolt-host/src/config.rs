use std::time::Duration;

use serde::Serialize;

/// Baud rate used by the serial number exchange.
pub const HELLO_BAUD_RATE: u32 = 112_500;
/// Baud rate Cobolt lasers ship with.
pub const LASER_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Serial link settings. The framing is always 8N1 without flow control.
#[derive(Serialize, Debug, Clone, Copy, Eq, PartialEq)]
pub struct LinkConfig {
    pub baud_rate: u32,
    /// Bound for every blocking read and for a whole reply line
    pub timeout: Duration,
}

impl LinkConfig {
    pub fn hello() -> Self {
        Self {
            baud_rate: HELLO_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn laser() -> Self {
        Self {
            baud_rate: LASER_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: Option<u32>) -> Self {
        if let Some(baud_rate) = baud_rate {
            self.baud_rate = baud_rate;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Some(timeout) = timeout {
            self.timeout = timeout;
        }
        self
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::laser()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(112_500, LinkConfig::hello().baud_rate);
        assert_eq!(Duration::from_millis(1000), LinkConfig::hello().timeout);
        assert_eq!(LinkConfig::laser(), LinkConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = LinkConfig::hello()
            .with_baud_rate(Some(9600))
            .with_timeout(None);
        assert_eq!(9600, config.baud_rate);
        assert_eq!(DEFAULT_TIMEOUT, config.timeout);
    }
}
