use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScopeError;

/// A scalar argument or assignment value in the instrument's VBS dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Integer(value.into())
    }
}

impl From<u32> for ScalarValue {
    fn from(value: u32) -> Self {
        ScalarValue::Integer(value.into())
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Real(value)
    }
}

impl From<f32> for ScalarValue {
    fn from(value: f32) -> Self {
        ScalarValue::Real(value.into())
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

/// Kind of acquisition resource reported by `app.ExecsNameAll`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Channel,
    Parameter,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Channel => write!(f, "Channel"),
            ResourceKind::Parameter => write!(f, "Parameter"),
        }
    }
}

impl ResourceKind {
    /// Classify a resource name: `C<digit>...` is a channel, `P<digit>...` a parameter.
    pub fn classify(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let kind = match chars.next()? {
            'C' => ResourceKind::Channel,
            'P' => ResourceKind::Parameter,
            _ => return None,
        };
        match chars.next() {
            Some(c) if c.is_ascii_digit() => Some(kind),
            _ => None,
        }
    }
}

/// Acquisition trigger mode (`app.Acquisition.TriggerMode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    Stopped,
    Single,
    Normal,
    Auto,
}

impl TriggerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerMode::Stopped => "Stopped",
            TriggerMode::Single => "Single",
            TriggerMode::Normal => "Normal",
            TriggerMode::Auto => "Auto",
        }
    }
}

impl FromStr for TriggerMode {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Stopped" => Ok(TriggerMode::Stopped),
            "Single" => Ok(TriggerMode::Single),
            "Normal" => Ok(TriggerMode::Normal),
            "Auto" => Ok(TriggerMode::Auto),
            other => Err(ScopeError::InvalidValue(format!(
                "Unknown trigger mode: {other}"
            ))),
        }
    }
}

/// Trigger type (`app.Acquisition.Trigger.Type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerType {
    Edge,
    Width,
    Qualified,
    Window,
    Internal,
    Tv,
    Pattern,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Edge => "EDGE",
            TriggerType::Width => "WIDTH",
            TriggerType::Qualified => "QUALIFIED",
            TriggerType::Window => "WINDOW",
            TriggerType::Internal => "INTERNAL",
            TriggerType::Tv => "TV",
            TriggerType::Pattern => "PATTERN",
        }
    }
}

impl FromStr for TriggerType {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EDGE" => Ok(TriggerType::Edge),
            "WIDTH" => Ok(TriggerType::Width),
            "QUALIFIED" => Ok(TriggerType::Qualified),
            "WINDOW" => Ok(TriggerType::Window),
            "INTERNAL" => Ok(TriggerType::Internal),
            "TV" => Ok(TriggerType::Tv),
            "PATTERN" => Ok(TriggerType::Pattern),
            other => Err(ScopeError::InvalidValue(format!(
                "Unknown trigger type: {other}"
            ))),
        }
    }
}

/// Sweep statistics of one measurement parameter, as reported by the instrument.
///
/// Values are kept as the instrument's text so that unit suffixes and
/// "no data" markers survive untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub last: String,
    pub max: String,
    pub mean: String,
    pub min: String,
    pub num: String,
    pub sdev: String,
    pub status: String,
}
