//! In-memory serial port for tests

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

/// Replays canned bytes and records what was written.
///
/// Reads time out once the canned bytes are exhausted, like a real port.
pub(crate) struct MockPort {
    rx: VecDeque<u8>,
    tx: Rc<RefCell<Vec<u8>>>,
    dropped: Rc<Cell<bool>>,
    fail_writes: bool,
}

/// Test side view of a [`MockPort`] that survives the port being moved or dropped.
pub(crate) struct MockHandle {
    tx: Rc<RefCell<Vec<u8>>>,
    dropped: Rc<Cell<bool>>,
}

impl MockPort {
    pub(crate) fn new(rx: &[u8]) -> (Self, MockHandle) {
        let tx = Rc::new(RefCell::new(Vec::new()));
        let dropped = Rc::new(Cell::new(false));
        let port = Self {
            rx: rx.iter().copied().collect(),
            tx: tx.clone(),
            dropped: dropped.clone(),
            fail_writes: false,
        };
        (port, MockHandle { tx, dropped })
    }

    pub(crate) fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl MockHandle {
    pub(crate) fn sent(&self) -> Vec<u8> {
        self.tx.borrow().clone()
    }

    pub(crate) fn sent_text(&self) -> String {
        String::from_utf8_lossy(&self.tx.borrow()).to_string()
    }

    pub(crate) fn is_dropped(&self) -> bool {
        self.dropped.get()
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.rx.is_empty() {
            return Err(io::ErrorKind::TimedOut.into());
        }
        let mut count = 0;
        while count < buf.len() {
            match self.rx.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        self.tx.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MockPort {
    fn drop(&mut self) {
        self.dropped.set(true);
    }
}
