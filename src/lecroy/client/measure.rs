use super::LecroyScope;
use crate::error::ScopeError;
use crate::lecroy::transport::Transport;
use crate::types::Statistics;

impl<T: Transport> LecroyScope<T> {
    /// Reset the sweep statistics of all measurement parameters.
    pub fn clear_statistics(&mut self) -> Result<(), ScopeError> {
        self.session.action("app.Measure.ClearSweeps")
    }

    /// Read the sweep statistics of measurement `parameter` (e.g. `P1`).
    pub fn statistics(&mut self, parameter: &str) -> Result<Statistics, ScopeError> {
        self.check_parameter(parameter)?;

        let mut value = |field: &str| {
            self.session
                .read(&format!("app.Measure.{parameter}.{field}.Result.Value"))
        };

        let last = value("last")?;
        let max = value("max")?;
        let mean = value("mean")?;
        let min = value("min")?;
        let num = value("num")?;
        let sdev = value("sdev")?;
        let status = self
            .session
            .read(&format!("app.Measure.{parameter}.Out.Result.Status"))?;

        Ok(Statistics {
            last,
            max,
            mean,
            min,
            num,
            sdev,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ScopeError;
    use crate::lecroy::client::mock_scope;

    #[test]
    fn test_clear_statistics() {
        let mut scope = mock_scope();
        scope.clear_statistics().unwrap();
        assert_eq!(
            scope.session().transport().written(),
            vec!["VBS 'app.Measure.ClearSweeps'"]
        );
    }

    #[test]
    fn test_statistics_reads_every_field() {
        let mut scope = mock_scope();
        let transport = scope.session_mut().transport_mut();
        for reply in ["1.5", "2.0", "1.2", "0.4", "17", "0.3", "Valid"] {
            transport.push_line(format!("VBS {reply}"));
        }

        let stats = scope.statistics("p1").unwrap();

        assert_eq!(stats.last, "1.5");
        assert_eq!(stats.max, "2.0");
        assert_eq!(stats.mean, "1.2");
        assert_eq!(stats.min, "0.4");
        assert_eq!(stats.num, "17");
        assert_eq!(stats.sdev, "0.3");
        assert_eq!(stats.status, "Valid");

        let written = scope.session().transport().written();
        assert_eq!(written.len(), 7);
        assert_eq!(written[0], "VBS? 'return = app.Measure.p1.last.Result.Value'");
        assert_eq!(written[6], "VBS? 'return = app.Measure.p1.Out.Result.Status'");
    }

    #[test]
    fn test_statistics_unknown_parameter() {
        let mut scope = mock_scope();
        let result = scope.statistics("P9");
        assert!(matches!(result, Err(ScopeError::ResourceUnavailable { .. })));
        assert!(scope.session().transport().written().is_empty());
    }
}
