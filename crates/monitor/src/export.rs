//! PNG export of the rendered heatmap.

use std::path::{Path, PathBuf};

use resonance_core::error::CoreError;
use resonance_core::raster::Bitmap;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] CoreError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Encode `bitmap` and replace the file at `path`. The PNG is written to
/// a sibling temporary file first and renamed into place, so readers
/// never see a partial image. Returns the number of bytes written.
pub async fn export_png(bitmap: &Bitmap, path: &Path) -> Result<usize, ExportError> {
    let bytes = bitmap.encode_png()?;
    let staging = staging_path(path);

    tokio::fs::write(&staging, &bytes)
        .await
        .map_err(|source| ExportError::Io {
            path: staging.clone(),
            source,
        })?;
    if let Err(source) = tokio::fs::rename(&staging, path).await {
        // Ignore the removal error, the rename failure is what gets reported.
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(ExportError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(bytes.len())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
