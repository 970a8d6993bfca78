use log::{debug, info};
use std::time::Duration;

use super::session::Session;
use super::transport::Transport;
use super::vicp::{ConnectionConfig, DEFAULT_PORT, VicpTransport};
use crate::error::ScopeError;
use crate::types::ResourceKind;

pub mod acquisition;
pub mod capture;
pub mod measure;
pub mod trigger;

/// VBS path listing every acquisition resource, comma separated.
const RESOURCE_LIST_PATH: &str = "app.ExecsNameAll";

/// Builder for constructing [`LecroyScope`] instances connected over VICP.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use rusty_lecroy::LecroyScope;
///
/// let scope = LecroyScope::builder()
///     .address("192.168.1.50")
///     .read_timeout(Duration::from_secs(20))
///     .build()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Default)]
pub struct LecroyScopeBuilder {
    address: Option<String>,
    port: Option<u16>,
    config: ConnectionConfig,
}

impl LecroyScopeBuilder {
    pub fn address(mut self, addr: &str) -> Self {
        self.address = Some(addr.to_string());
        self
    }

    /// Override the VICP port (1861 by default)
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the full connection configuration
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the baseline read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Connect and discover the instrument's channels and parameters.
    pub fn build(self) -> Result<LecroyScope, ScopeError> {
        let address = self
            .address
            .ok_or_else(|| ScopeError::InvalidCommand("Address must be specified".to_string()))?;
        let port = self.port.unwrap_or(DEFAULT_PORT);

        let transport = VicpTransport::connect(&address, port, &self.config)?;
        LecroyScope::with_transport(transport)
    }
}

/// Typed control of a LeCroy oscilloscope.
///
/// Instrument settings are exposed as explicit getter/setter pairs on top of
/// the VBS [`Session`]. Setters that take a source or parameter name validate
/// it against the resources discovered at connection time before sending
/// anything.
///
/// # Examples
///
/// ```no_run
/// use rusty_lecroy::{LecroyScope, TriggerMode};
///
/// let mut scope = LecroyScope::new("192.168.1.50")?;
/// scope.set_trigger_mode(TriggerMode::Single)?;
/// if scope.acquire(std::time::Duration::from_secs(1), false)? {
///     let waveform = scope.waveform_raw("C1")?;
///     println!("{} bytes", waveform.len());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct LecroyScope<T: Transport = VicpTransport> {
    session: Session<T>,
    available_channels: Vec<String>,
    available_parameters: Vec<String>,
}

impl LecroyScope<VicpTransport> {
    /// Connect on the default VICP port with default timeouts.
    pub fn new(addr: &str) -> Result<Self, ScopeError> {
        Self::builder().address(addr).build()
    }

    pub fn builder() -> LecroyScopeBuilder {
        LecroyScopeBuilder::default()
    }
}

impl<T: Transport> LecroyScope<T> {
    /// Wrap an already open transport and discover the available resources.
    pub fn with_transport(transport: T) -> Result<Self, ScopeError> {
        let mut scope = Self {
            session: Session::new(transport),
            available_channels: Vec::new(),
            available_parameters: Vec::new(),
        };
        scope.refresh_resources()?;
        Ok(scope)
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Direct access to the VBS primitives for paths without a typed accessor.
    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    pub fn into_session(self) -> Session<T> {
        self.session
    }

    /// Re-read the list of channels and parameters from the instrument.
    pub fn refresh_resources(&mut self) -> Result<(), ScopeError> {
        let listing = self.session.read(RESOURCE_LIST_PATH)?;

        self.available_channels.clear();
        self.available_parameters.clear();
        for resource in listing.split(',').map(str::trim) {
            match ResourceKind::classify(resource) {
                Some(ResourceKind::Channel) => self.available_channels.push(resource.to_string()),
                Some(ResourceKind::Parameter) => {
                    self.available_parameters.push(resource.to_string())
                }
                None => debug!("Ignoring resource {resource:?}"),
            }
        }

        info!(
            "Available channels: [{}], parameters: [{}]",
            self.available_channels.join(", "),
            self.available_parameters.join(", ")
        );
        Ok(())
    }

    pub fn available_channels(&self) -> &[String] {
        &self.available_channels
    }

    pub fn available_parameters(&self) -> &[String] {
        &self.available_parameters
    }

    pub fn has_channel(&self, channel: &str) -> bool {
        let wanted = channel.to_uppercase();
        self.available_channels.iter().any(|c| *c == wanted)
    }

    pub fn check_channel(&self, channel: &str) -> Result<(), ScopeError> {
        if self.has_channel(channel) {
            Ok(())
        } else {
            Err(ScopeError::ResourceUnavailable {
                kind: ResourceKind::Channel,
                name: channel.to_string(),
            })
        }
    }

    pub fn check_parameter(&self, parameter: &str) -> Result<(), ScopeError> {
        let wanted = parameter.to_uppercase();
        if self.available_parameters.iter().any(|p| *p == wanted) {
            Ok(())
        } else {
            Err(ScopeError::ResourceUnavailable {
                kind: ResourceKind::Parameter,
                name: parameter.to_string(),
            })
        }
    }

    /// Validate an acquisition source. Only analog channels are supported.
    pub fn check_source(&self, source: &str) -> Result<(), ScopeError> {
        self.check_channel(source)
    }

    /// Block until the instrument reports all pending operations complete.
    pub fn operation_complete(&mut self) -> Result<(), ScopeError> {
        self.session.check_operation_complete()
    }
}

#[cfg(test)]
pub(crate) fn mock_scope() -> LecroyScope<crate::lecroy::mock::MockTransport> {
    let mut transport = crate::lecroy::mock::MockTransport::with_timeout(Duration::from_secs(2));
    transport.push_line("VBS C1,C2,C3,C4,P1,P2,F1,M1");
    let mut scope = LecroyScope::with_transport(transport).unwrap();
    scope.session_mut().transport_mut().clear_written();
    scope
}
