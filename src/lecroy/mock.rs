//! Scripted in-memory transport for testing without an instrument
//!
//! Replies are queued up front and handed out in order. Every written line and
//! every timeout change is recorded for later verification. An empty reply
//! queue behaves like a silent instrument and yields a timeout.

use log::debug;
use std::collections::VecDeque;
use std::time::Duration;

use super::transport::Transport;
use crate::error::ScopeError;

pub struct MockTransport {
    lines: VecDeque<Result<Vec<u8>, ScopeError>>,
    raw_blocks: VecDeque<Result<Vec<u8>, ScopeError>>,
    written: Vec<Vec<u8>>,
    timeout: Duration,
    timeout_history: Vec<Duration>,
    fail_next_write: bool,
    /// Successful timeout changes left before one fails.
    set_timeout_failure_in: Option<usize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            lines: VecDeque::new(),
            raw_blocks: VecDeque::new(),
            written: Vec::new(),
            timeout,
            timeout_history: Vec::new(),
            fail_next_write: false,
            set_timeout_failure_in: None,
        }
    }

    /// Queue a reply line (without terminator).
    pub fn push_line(&mut self, line: impl Into<Vec<u8>>) -> &mut Self {
        self.lines.push_back(Ok(line.into()));
        self
    }

    /// Queue a failure for the next line read.
    pub fn push_line_error(&mut self, error: ScopeError) -> &mut Self {
        self.lines.push_back(Err(error));
        self
    }

    /// Queue a binary block for the next raw read.
    pub fn push_raw(&mut self, block: impl Into<Vec<u8>>) -> &mut Self {
        self.raw_blocks.push_back(Ok(block.into()));
        self
    }

    pub fn push_raw_error(&mut self, error: ScopeError) -> &mut Self {
        self.raw_blocks.push_back(Err(error));
        self
    }

    /// Make the next write fail with a broken-pipe error.
    pub fn fail_next_write(&mut self) {
        self.fail_next_write = true;
    }

    /// Make the next timeout change fail.
    pub fn fail_next_set_timeout(&mut self) {
        self.fail_set_timeout_after(0);
    }

    /// Let `successes` timeout changes through, then fail the one after.
    pub fn fail_set_timeout_after(&mut self, successes: usize) {
        self.set_timeout_failure_in = Some(successes);
    }

    /// Every line written so far, lossily decoded.
    pub fn written(&self) -> Vec<String> {
        self.written
            .iter()
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    pub fn clear_written(&mut self) {
        self.written.clear();
    }

    /// Every timeout installed through [`Transport::set_timeout`], in order.
    pub fn timeout_history(&self) -> &[Duration] {
        &self.timeout_history
    }

    pub fn pending_lines(&self) -> usize {
        self.lines.len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<(), ScopeError> {
        if std::mem::take(&mut self.fail_next_write) {
            return Err(ScopeError::io(
                std::io::Error::from(std::io::ErrorKind::BrokenPipe),
                "Mock write failure",
            ));
        }
        debug!("mock <- {}", String::from_utf8_lossy(data));
        self.written.push(data.to_vec());
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ScopeError> {
        self.lines
            .pop_front()
            .unwrap_or(Err(ScopeError::Timeout(self.timeout)))
    }

    fn read_raw(&mut self) -> Result<Vec<u8>, ScopeError> {
        self.raw_blocks
            .pop_front()
            .unwrap_or(Err(ScopeError::Timeout(self.timeout)))
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
        match self.set_timeout_failure_in {
            Some(0) => {
                self.set_timeout_failure_in = None;
                return Err(ScopeError::io(
                    std::io::Error::from(std::io::ErrorKind::Other),
                    "Mock timeout failure",
                ));
            }
            Some(n) => self.set_timeout_failure_in = Some(n - 1),
            None => {}
        }
        self.timeout_history.push(timeout);
        self.timeout = timeout;
        Ok(())
    }
}
