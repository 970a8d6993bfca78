use super::LecroyScope;
use crate::error::ScopeError;
use crate::lecroy::transport::Transport;
use crate::types::{ScalarValue, TriggerMode, TriggerType};

const TRIGGER_MODE: &str = "app.Acquisition.TriggerMode";
const TRIGGER_SOURCE: &str = "app.Acquisition.Trigger.Source";
const TRIGGER_TYPE: &str = "app.Acquisition.Trigger.Type";

/// Trigger sources that are not acquisition channels.
const EXTERNAL_SOURCES: [&str; 2] = ["EXT", "LINE"];

impl<T: Transport> LecroyScope<T> {
    pub fn trigger_mode(&mut self) -> Result<TriggerMode, ScopeError> {
        self.session.read(TRIGGER_MODE)?.parse()
    }

    pub fn set_trigger_mode(&mut self, mode: TriggerMode) -> Result<(), ScopeError> {
        self.session.set(TRIGGER_MODE, mode.as_str())
    }

    pub fn trigger_type(&mut self) -> Result<TriggerType, ScopeError> {
        self.session.read(TRIGGER_TYPE)?.parse()
    }

    pub fn set_trigger_type(&mut self, trigger_type: TriggerType) -> Result<(), ScopeError> {
        self.session.set(TRIGGER_TYPE, trigger_type.as_str())
    }

    pub fn trigger_source(&mut self) -> Result<String, ScopeError> {
        self.session.read(TRIGGER_SOURCE)
    }

    /// Set the trigger source to `EXT`, `LINE` or an available channel.
    ///
    /// The name is sent upper-case.
    pub fn set_trigger_source(&mut self, source: &str) -> Result<(), ScopeError> {
        let source = source.to_uppercase();
        if !EXTERNAL_SOURCES.contains(&source.as_str()) {
            self.check_source(&source)?;
        }
        self.session.set(TRIGGER_SOURCE, source)
    }

    /// Trigger level of the current trigger source, as reported by the instrument.
    pub fn trigger_level(&mut self) -> Result<String, ScopeError> {
        let source = self.trigger_source()?;
        self.session.read(&level_path(&source))
    }

    /// Set the trigger level of the current trigger source.
    ///
    /// Only `EXT` and channel sources have a settable level.
    pub fn set_trigger_level(&mut self, level: impl Into<ScalarValue>) -> Result<(), ScopeError> {
        let source = self.trigger_source()?;
        if !source.eq_ignore_ascii_case("EXT") && !self.has_channel(&source) {
            return Err(ScopeError::Unsupported(format!(
                "Setting the trigger level is not supported for trigger source {source}"
            )));
        }
        self.session.set(&level_path(&source), level)
    }
}

fn level_path(source: &str) -> String {
    format!("app.Acquisition.Trigger.{source}.Level")
}

#[cfg(test)]
mod tests {
    use crate::error::ScopeError;
    use crate::lecroy::client::mock_scope;
    use crate::types::{TriggerMode, TriggerType};

    #[test]
    fn test_trigger_mode_round_trip() {
        let mut scope = mock_scope();
        scope.session_mut().transport_mut().push_line("VBS Normal");

        assert_eq!(scope.trigger_mode().unwrap(), TriggerMode::Normal);
        scope.set_trigger_mode(TriggerMode::Single).unwrap();

        assert_eq!(
            scope.session().transport().written(),
            vec![
                "VBS? 'return = app.Acquisition.TriggerMode'",
                "VBS 'app.Acquisition.TriggerMode = \"Single\"'",
            ]
        );
    }

    #[test]
    fn test_unknown_trigger_mode_reply() {
        let mut scope = mock_scope();
        scope.session_mut().transport_mut().push_line("VBS Roll");
        assert!(matches!(scope.trigger_mode(), Err(ScopeError::InvalidValue(_))));
    }

    #[test]
    fn test_trigger_type() {
        let mut scope = mock_scope();
        scope.session_mut().transport_mut().push_line("VBS EDGE");
        assert_eq!(scope.trigger_type().unwrap(), TriggerType::Edge);

        scope.set_trigger_type(TriggerType::Window).unwrap();
        assert_eq!(
            scope.session().transport().written().last().unwrap(),
            "VBS 'app.Acquisition.Trigger.Type = \"WINDOW\"'"
        );
    }

    #[test]
    fn test_set_trigger_source_validates() {
        let mut scope = mock_scope();
        scope.set_trigger_source("c2").unwrap();
        scope.set_trigger_source("line").unwrap();
        let result = scope.set_trigger_source("C7");

        assert!(matches!(result, Err(ScopeError::ResourceUnavailable { .. })));
        assert_eq!(
            scope.session().transport().written(),
            vec![
                "VBS 'app.Acquisition.Trigger.Source = \"C2\"'",
                "VBS 'app.Acquisition.Trigger.Source = \"LINE\"'",
            ]
        );
    }

    #[test]
    fn test_trigger_level_follows_source() {
        let mut scope = mock_scope();
        let transport = scope.session_mut().transport_mut();
        transport.push_line("VBS C3").push_line("VBS 0.25");

        assert_eq!(scope.trigger_level().unwrap(), "0.25");
        assert_eq!(
            scope.session().transport().written()[1],
            "VBS? 'return = app.Acquisition.Trigger.C3.Level'"
        );
    }

    #[test]
    fn test_set_trigger_level() {
        let mut scope = mock_scope();
        scope.session_mut().transport_mut().push_line("VBS EXT");
        scope.set_trigger_level(-0.5).unwrap();
        assert_eq!(
            scope.session().transport().written().last().unwrap(),
            "VBS 'app.Acquisition.Trigger.EXT.Level = -0.5'"
        );
    }

    #[test]
    fn test_set_trigger_level_unsupported_for_line() {
        let mut scope = mock_scope();
        scope.session_mut().transport_mut().push_line("VBS LINE");
        let result = scope.set_trigger_level(1.0);
        assert!(matches!(result, Err(ScopeError::Unsupported(_))));
        assert_eq!(scope.session().transport().written().len(), 1);
    }
}
