pub mod config;
pub mod error;
pub mod lecroy;
pub mod types;

pub use crate::config::{AppConfig, load_config, load_config_or_default};
pub use error::ScopeError;
pub use lecroy::{
    Codec, CommandLine, ConnectionConfig, LecroyScope, LecroyScopeBuilder, MockTransport,
    Session, TimeoutGuard, Transport, VicpTransport,
};
pub use types::{ResourceKind, ScalarValue, Statistics, TriggerMode, TriggerType};
