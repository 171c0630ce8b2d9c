//! Archive extraction.

use std::fs::File;
use std::path::Path;

use anyhow::Result;
use flate2::read::GzDecoder;
use tar::Archive;

use crate::util::errors::ContribsError;

/// Unpacks an archive into a directory.
pub trait Extractor {
    /// Unpack `archive` into `dest`, keeping the archive's own top-level
    /// directory.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Extracts gzip-compressed tarballs.
#[derive(Debug, Default)]
pub struct TarballExtractor;

impl TarballExtractor {
    pub fn new() -> Self {
        TarballExtractor
    }
}

impl Extractor for TarballExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        tracing::debug!("Extracting {} into {}", archive.display(), dest.display());

        let extract_error = |reason: String| ContribsError::Extract {
            archive: archive.to_path_buf(),
            reason,
        };

        let file = File::open(archive).map_err(|e| extract_error(e.to_string()))?;
        std::fs::create_dir_all(dest).map_err(|e| extract_error(e.to_string()))?;

        // unpack_in refuses entries that would land outside `dest`
        let mut tarball = Archive::new(GzDecoder::new(file));
        tarball.set_preserve_permissions(true);
        for entry in tarball.entries().map_err(|e| extract_error(e.to_string()))? {
            let mut entry = entry.map_err(|e| extract_error(e.to_string()))?;
            let unpacked = entry
                .unpack_in(dest)
                .map_err(|e| extract_error(e.to_string()))?;
            if !unpacked {
                let path = entry
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                tracing::debug!("Skipped archive entry outside destination: {}", path);
            }
        }

        Ok(())
    }
}
