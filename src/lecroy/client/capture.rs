use log::info;
use std::fs;
use std::path::Path;

use super::LecroyScope;
use crate::error::ScopeError;
use crate::lecroy::transport::Transport;

impl<T: Transport> LecroyScope<T> {
    /// Capture the screen (grid area only) as PNG bytes.
    pub fn screenshot(&mut self) -> Result<Vec<u8>, ScopeError> {
        self.session.capture_screenshot()
    }

    pub fn save_screenshot(&mut self, path: impl AsRef<Path>) -> Result<(), ScopeError> {
        let path = path.as_ref();
        let image = self.screenshot()?;
        write_file(path, &image)?;
        info!("Saved screenshot ({} bytes) to {}", image.len(), path.display());
        Ok(())
    }

    /// Fetch the undecoded waveform block of an available source.
    pub fn waveform_raw(&mut self, source: &str) -> Result<Vec<u8>, ScopeError> {
        self.check_source(source)?;
        self.session.capture_waveform(source)
    }

    pub fn save_waveform(
        &mut self,
        source: &str,
        path: impl AsRef<Path>,
    ) -> Result<(), ScopeError> {
        let path = path.as_ref();
        let block = self.waveform_raw(source)?;
        write_file(path, &block)?;
        info!(
            "Saved {source} waveform ({} bytes) to {}",
            block.len(),
            path.display()
        );
        Ok(())
    }

    /// Save waveforms to the instrument's own storage using its SaveRecall setup.
    pub fn save_waveform_on_scope(&mut self) -> Result<(), ScopeError> {
        self.session.action("app.SaveRecall.Waveform.SaveFile")
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), ScopeError> {
    fs::write(path, data).map_err(|e| ScopeError::io(e, format!("Writing {}", path.display())))
}

#[cfg(test)]
mod tests {
    use crate::error::ScopeError;
    use crate::lecroy::client::mock_scope;

    #[test]
    fn test_save_screenshot_writes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.png");
        let mut scope = mock_scope();
        scope
            .session_mut()
            .transport_mut()
            .push_raw(b"\x89PNG\r\n\x1a\nbody".to_vec());

        scope.save_screenshot(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG\r\n\x1a\nbody");
        assert_eq!(scope.session().transport().written()[1], "SCDP");
    }

    #[test]
    fn test_waveform_checks_source_first() {
        let mut scope = mock_scope();
        scope.session_mut().transport_mut().push_raw(vec![1, 2, 3]);

        assert!(matches!(
            scope.waveform_raw("C8"),
            Err(ScopeError::ResourceUnavailable { .. })
        ));
        assert!(scope.session().transport().written().is_empty());

        assert_eq!(scope.waveform_raw("C1").unwrap(), vec![1, 2, 3]);
        assert_eq!(scope.session().transport().written(), vec!["C1:WF?"]);
    }

    #[test]
    fn test_save_waveform() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c2.trc");
        let mut scope = mock_scope();
        scope.session_mut().transport_mut().push_raw(vec![0u8; 4096]);

        scope.save_waveform("C2", &path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap().len(), 4096);
    }

    #[test]
    fn test_save_waveform_bad_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("c2.trc");
        let mut scope = mock_scope();
        scope.session_mut().transport_mut().push_raw(vec![0u8; 8]);

        assert!(matches!(
            scope.save_waveform("C2", &path),
            Err(ScopeError::Io { .. })
        ));
    }

    #[test]
    fn test_save_waveform_on_scope() {
        let mut scope = mock_scope();
        scope.save_waveform_on_scope().unwrap();
        assert_eq!(
            scope.session().transport().written(),
            vec!["VBS 'app.SaveRecall.Waveform.SaveFile'"]
        );
    }
}
