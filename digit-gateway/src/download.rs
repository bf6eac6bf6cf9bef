//! Where local saves end up.

use std::path::{Path, PathBuf};

use digit_renderer::ExportedImage;

use crate::error::{GatewayError, GatewayResult};

/// An encoded drawing ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested file name.
    pub file_name: String,
    /// The encoded image.
    pub image: ExportedImage,
}

/// A host-specific sink for downloads.
pub trait DownloadTarget {
    /// Deliver `download` to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot complete the delivery.
    fn deliver(&self, download: &Download) -> GatewayResult<()>;
}

/// Writes downloads as files into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    /// Deliver into `dir`, which must already exist.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where a download named `file_name` is written.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Download`] if the name is not a bare file name.
    pub fn path_for(&self, file_name: &str) -> GatewayResult<PathBuf> {
        let bare = Path::new(file_name)
            .file_name()
            .is_some_and(|name| name == file_name);
        if !bare {
            return Err(GatewayError::Download(format!(
                "'{file_name}' is not a plain file name"
            )));
        }
        Ok(self.dir.join(file_name))
    }
}

impl DownloadTarget for DirectoryDownloads {
    fn deliver(&self, download: &Download) -> GatewayResult<()> {
        let path = self.path_for(&download.file_name)?;
        std::fs::write(&path, download.image.bytes())?;
        tracing::info!(path = %path.display(), size = download.image.bytes().len(), "Drawing saved");
        Ok(())
    }
}
