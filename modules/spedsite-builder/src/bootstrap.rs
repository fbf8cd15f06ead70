use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub const STYLES_DIR: &str = "styles";

/// Prepares the output tree once before any district is generated.
pub struct SiteBootstrapper {
    output_root: PathBuf,
    stylesheets: Vec<PathBuf>,
}

impl SiteBootstrapper {
    pub fn new(output_root: impl Into<PathBuf>, stylesheets: Vec<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            stylesheets,
        }
    }

    /// Remove any previous tree, recreate `styles/`, copy stylesheets.
    ///
    /// Only failing to create the output directories is an error; stale
    /// output and missing stylesheets are logged and skipped.
    pub async fn prepare(&self) -> Result<()> {
        self.remove_previous_output().await;

        let styles_dir = self.output_root.join(STYLES_DIR);
        tokio::fs::create_dir_all(&styles_dir)
            .await
            .with_context(|| format!("creating {}", styles_dir.display()))?;

        let mut copied = 0usize;
        for source in &self.stylesheets {
            let Some(file_name) = source.file_name() else {
                warn!(path = %source.display(), "Stylesheet path has no file name");
                continue;
            };
            let target = styles_dir.join(file_name);
            match tokio::fs::copy(source, &target).await {
                Ok(_) => copied += 1,
                Err(e) => warn!(
                    path = %source.display(),
                    error = %e,
                    "Failed to copy stylesheet, continuing without it"
                ),
            }
        }

        info!(
            output = %self.output_root.display(),
            stylesheets = copied,
            "Output directory prepared"
        );
        Ok(())
    }

    async fn remove_previous_output(&self) {
        if !is_removable(&self.output_root) {
            warn!(
                output = %self.output_root.display(),
                "Refusing to clear output root, existing files will be overwritten"
            );
            return;
        }
        match tokio::fs::remove_dir_all(&self.output_root).await {
            Ok(()) => info!(output = %self.output_root.display(), "Removed previous output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                output = %self.output_root.display(),
                error = %e,
                "Could not remove previous output, stale files may remain"
            ),
        }
    }
}

/// A root that names a real subdirectory, not `/`, `.` or a parent.
fn is_removable(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::Normal(_)))
        && !path.components().any(|c| matches!(c, Component::ParentDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangerous_roots_are_not_removable() {
        assert!(!is_removable(Path::new("/")));
        assert!(!is_removable(Path::new(".")));
        assert!(!is_removable(Path::new("")));
        assert!(!is_removable(Path::new("../site")));
        assert!(is_removable(Path::new("output")));
        assert!(is_removable(Path::new("/tmp/site/output")));
    }

    #[tokio::test]
    async fn prepare_clears_stale_files_and_copies_styles() {
        let tmp = tempfile::tempdir().unwrap();
        let css = tmp.path().join("global.css");
        std::fs::write(&css, "body{}").unwrap();

        let output = tmp.path().join("output");
        std::fs::create_dir_all(output.join("old-district")).unwrap();
        std::fs::write(output.join("old-district/index.html"), "stale").unwrap();

        let bootstrapper = SiteBootstrapper::new(&output, vec![css]);
        bootstrapper.prepare().await.unwrap();

        assert!(!output.join("old-district").exists());
        assert_eq!(
            std::fs::read_to_string(output.join("styles/global.css")).unwrap(),
            "body{}"
        );
    }

    #[tokio::test]
    async fn missing_stylesheet_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("output");
        let bootstrapper =
            SiteBootstrapper::new(&output, vec![tmp.path().join("styles/missing.css")]);
        bootstrapper.prepare().await.unwrap();
        assert!(output.join("styles").is_dir());
    }

    #[tokio::test]
    async fn prepare_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("output");
        let bootstrapper = SiteBootstrapper::new(&output, Vec::new());
        bootstrapper.prepare().await.unwrap();
        bootstrapper.prepare().await.unwrap();
        assert!(output.join("styles").is_dir());
    }
}
