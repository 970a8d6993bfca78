use std::time::Duration;

use super::LecroyScope;
use crate::error::ScopeError;
use crate::lecroy::transport::Transport;

const HORIZONTAL_SCALE: &str = "app.Acquisition.Horizontal.horscale";

impl<T: Transport> LecroyScope<T> {
    /// Arm and wait for one acquisition.
    ///
    /// The instrument waits up to `timeout` for a trigger; with `force` it
    /// forces one when none arrives. The read timeout is extended by the same
    /// amount for this call.
    ///
    /// # Returns
    /// `true` when an acquisition completed
    pub fn acquire(&mut self, timeout: Duration, force: bool) -> Result<bool, ScopeError> {
        let reply = self.session.method(
            "app.Acquisition.acquire",
            &[timeout.as_secs_f64().into(), force.into()],
            Some(timeout),
        )?;
        Ok(reply == "1")
    }

    /// Wait up to `timeout` for the instrument to become idle.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> Result<bool, ScopeError> {
        let reply = self.session.method(
            "app.WaitUntilIdle",
            &[timeout.as_secs_f64().into()],
            Some(timeout),
        )?;
        Ok(reply == "1")
    }

    /// Horizontal scale in seconds per division.
    pub fn horizontal_scale(&mut self) -> Result<f64, ScopeError> {
        let reply = self.session.read(HORIZONTAL_SCALE)?;
        reply.trim().parse().map_err(|_| {
            ScopeError::InvalidValue(format!("Horizontal scale is not a number: {reply}"))
        })
    }

    pub fn set_horizontal_scale(&mut self, seconds_per_div: f64) -> Result<(), ScopeError> {
        self.session.set(HORIZONTAL_SCALE, seconds_per_div)
    }
}
