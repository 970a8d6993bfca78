use log::{debug, warn};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use super::codec::{Codec, CommandLine};
use super::transport::Transport;
use crate::error::ScopeError;
use crate::types::ScalarValue;

/// Standard "operation complete" query.
pub const OPC_QUERY: &str = "*OPC?";
/// Replies accepted for [`OPC_QUERY`].
pub const OPC_ACKNOWLEDGEMENTS: [&str; 2] = ["1", "*OPC 1"];

/// Hardcopy setup sent before a screen dump.
pub const SCREENSHOT_SETUP: &str =
    "HCSU DEV, PNG, FORMAT, PORTRAIT, BCKG, WHITE, DEST, REMOTE, PORT, NET, AREA, GRIDAREAONLY";
/// Screen dump command.
pub const SCREENSHOT_DUMP: &str = "SCDP";
/// Suffix appended to a source name to request its waveform block.
pub const WAVEFORM_SUFFIX: &str = ":WF?";

/// Extended read timeout held for the lifetime of the guard.
///
/// The timeout found on the transport when the guard is created is the
/// baseline. [`TimeoutGuard::restore`] puts it back and reports failure;
/// dropping the guard without restoring puts it back on a best-effort basis.
pub struct TimeoutGuard<'a, T: Transport> {
    transport: &'a mut T,
    baseline: Duration,
    extended: bool,
}

impl<'a, T: Transport> TimeoutGuard<'a, T> {
    /// Install `baseline + extension` on the transport. `None` leaves the
    /// timeout untouched.
    pub fn extend(transport: &'a mut T, extension: Option<Duration>) -> Result<Self, ScopeError> {
        let baseline = transport.timeout();

        let Some(extra) = extension else {
            return Ok(Self {
                transport,
                baseline,
                extended: false,
            });
        };

        let effective = baseline.checked_add(extra).ok_or_else(|| {
            ScopeError::InvalidValue(format!("Timeout extension {extra:?} overflows"))
        })?;
        debug!("Extending read timeout {baseline:?} -> {effective:?}");
        transport.set_timeout(effective)?;

        Ok(Self {
            transport,
            baseline,
            extended: true,
        })
    }

    pub fn baseline(&self) -> Duration {
        self.baseline
    }

    /// Reinstall the baseline timeout, surfacing any failure.
    pub fn restore(mut self) -> Result<(), ScopeError> {
        if !std::mem::take(&mut self.extended) {
            return Ok(());
        }
        debug!("Restoring read timeout {:?}", self.baseline);
        self.transport.set_timeout(self.baseline)
    }
}

impl<T: Transport> Deref for TimeoutGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.transport
    }
}

impl<T: Transport> DerefMut for TimeoutGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.transport
    }
}

impl<T: Transport> Drop for TimeoutGuard<'_, T> {
    fn drop(&mut self) {
        if !self.extended {
            return;
        }
        debug!("Restoring read timeout {:?}", self.baseline);
        if let Err(e) = self.transport.set_timeout(self.baseline) {
            warn!("Failed to restore read timeout {:?}: {e}", self.baseline);
        }
    }
}

fn decode_reply(bytes: Vec<u8>) -> Result<String, ScopeError> {
    String::from_utf8(bytes)
        .map_err(|e| ScopeError::Protocol(format!("Reply is not valid UTF-8: {e}")))
}

/// One instrument session speaking VBS over a [`Transport`].
///
/// Every call is a blocking write, followed by one read when the command
/// returns something. Calls must not overlap; the session does no locking.
pub struct Session<T: Transport> {
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Baseline read timeout.
    pub fn timeout(&self) -> Duration {
        self.transport.timeout()
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), ScopeError> {
        self.transport.set_timeout(timeout)
    }

    fn send(&mut self, line: &CommandLine) -> Result<(), ScopeError> {
        debug!("-> {}", line.as_str());
        self.transport.write(line.as_str().as_bytes())
    }

    /// Execute a VBS statement. No reply is read.
    pub fn action(&mut self, statement: &str) -> Result<(), ScopeError> {
        self.send(&Codec::build_action(statement))
    }

    /// Read the value at `path`.
    pub fn read(&mut self, path: &str) -> Result<String, ScopeError> {
        self.send(&Codec::build_query(path))?;
        let reply = decode_reply(self.transport.read_line()?)?;
        debug!("<- {reply}");
        Ok(Codec::unpack_response(&reply).to_string())
    }

    /// Assign `value` to `path`. No reply is read.
    pub fn set(&mut self, path: &str, value: impl Into<ScalarValue>) -> Result<(), ScopeError> {
        let line = Codec::build_assignment(path, &value.into())?;
        self.send(&line)
    }

    /// Call the remote method at `path` and return its result.
    ///
    /// With `extra_timeout`, the read timeout is raised by that amount for this
    /// call only and restored before returning, whether the call succeeds or not.
    /// A reply followed by a failed restore is reported as that failure.
    pub fn method(
        &mut self,
        path: &str,
        args: &[ScalarValue],
        extra_timeout: Option<Duration>,
    ) -> Result<String, ScopeError> {
        let line = Codec::build_method_call(path, args)?;

        let mut link = TimeoutGuard::extend(&mut self.transport, extra_timeout)?;
        debug!("-> {}", line.as_str());
        link.write(line.as_str().as_bytes())?;
        let reply = decode_reply(link.read_line()?)?;
        link.restore()?;

        debug!("<- {reply}");
        Ok(Codec::unpack_response(&reply).to_string())
    }

    /// Send a line verbatim, bypassing VBS wrapping.
    pub fn write_raw(&mut self, line: &str) -> Result<(), ScopeError> {
        debug!("-> {line}");
        self.transport.write(line.as_bytes())
    }

    /// Send a line verbatim and return the reply line as received.
    pub fn query_raw(&mut self, line: &str) -> Result<String, ScopeError> {
        self.write_raw(line)?;
        let reply = decode_reply(self.transport.read_line()?)?;
        debug!("<- {reply}");
        Ok(reply)
    }

    /// Confirm the instrument has finished all pending operations.
    ///
    /// Any reply other than `1` or `*OPC 1` is a protocol violation.
    pub fn check_operation_complete(&mut self) -> Result<(), ScopeError> {
        let reply = self.query_raw(OPC_QUERY)?;
        if OPC_ACKNOWLEDGEMENTS.contains(&reply.as_str()) {
            Ok(())
        } else {
            Err(ScopeError::ProtocolViolation {
                expected: OPC_ACKNOWLEDGEMENTS.join(" or "),
                actual: reply,
            })
        }
    }

    /// Dump the screen as PNG.
    pub fn capture_screenshot(&mut self) -> Result<Vec<u8>, ScopeError> {
        self.write_raw(SCREENSHOT_SETUP)?;
        self.write_raw(SCREENSHOT_DUMP)?;
        let image = self.transport.read_raw()?;
        debug!("<- screenshot ({} bytes)", image.len());
        Ok(image)
    }

    /// Fetch the raw waveform block of `source`.
    ///
    /// The source is not validated here.
    pub fn capture_waveform(&mut self, source: &str) -> Result<Vec<u8>, ScopeError> {
        self.write_raw(&format!("{source}{WAVEFORM_SUFFIX}"))?;
        let block = self.transport.read_raw()?;
        debug!("<- {source} waveform ({} bytes)", block.len());
        Ok(block)
    }
}
