use std::time::Duration;

use crate::error::ScopeError;

/// Byte-level capability the session needs from an instrument link.
///
/// Implementations deliver one complete reply per read call and report an
/// elapsed read timeout as [`ScopeError::Timeout`] rather than a generic IO
/// failure.
pub trait Transport {
    /// Send one complete command line. No reply is read.
    fn write(&mut self, data: &[u8]) -> Result<(), ScopeError>;

    /// Block until one reply line is available, without its line terminator.
    fn read_line(&mut self) -> Result<Vec<u8>, ScopeError>;

    /// Block until one complete binary block is available.
    fn read_raw(&mut self) -> Result<Vec<u8>, ScopeError>;

    /// Current read timeout.
    fn timeout(&self) -> Duration;

    /// Replace the read timeout.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<(), ScopeError> {
        (**self).write(data)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ScopeError> {
        (**self).read_line()
    }

    fn read_raw(&mut self) -> Result<Vec<u8>, ScopeError> {
        (**self).read_raw()
    }

    fn timeout(&self) -> Duration {
        (**self).timeout()
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
        (**self).set_timeout(timeout)
    }
}
