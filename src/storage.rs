// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for photo files

use crate::backends::camera::Bitmap;
use crate::constants::{APP_DIR_NAME, PHOTO_FILE_PREFIX};
use crate::pipelines::photo::PhotoEncoder;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File-write collaborator used by the session controller
pub trait ImageWriter: Send + Sync {
    /// Persist an encoded image
    fn write_bytes(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Encode a preview bitmap as JPEG and persist it
    fn write_bitmap(&self, path: &Path, bitmap: &Bitmap) -> io::Result<()> {
        let encoded = PhotoEncoder::new()
            .encode_bitmap(bitmap)
            .map_err(io::Error::other)?;
        self.write_bytes(path, &encoded.data)
    }
}

/// Writes images to the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageWriter;

impl ImageWriter for FsImageWriter {
    fn write_bytes(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)?;
        info!(path = %path.display(), size = data.len(), "Photo written");
        Ok(())
    }
}

/// Default directory for photos (`~/Pictures/procamera`)
pub fn default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// `<dir>/photo_<timestamp>.jpg`
pub fn timestamped_photo_path(dir: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
    let path = dir.join(format!("{}_{}.jpg", PHOTO_FILE_PREFIX, timestamp));
    debug!(path = %path.display(), "Generated photo path");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_path_shape() {
        let path = timestamped_photo_path(Path::new("/tmp/photos"));
        assert_eq!(path.parent(), Some(Path::new("/tmp/photos")));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("photo_"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_default_photo_dir_is_namespaced() {
        assert!(default_photo_dir().ends_with(APP_DIR_NAME));
    }

    #[test]
    fn test_fs_writer_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("shot.jpg");
        FsImageWriter.write_bytes(&path, &[1, 2, 3]).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_fs_writer_encodes_bitmaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.jpg");
        let bitmap = Bitmap {
            width: 8,
            height: 8,
            rgba: vec![90; 8 * 8 * 4],
        };
        FsImageWriter.write_bitmap(&path, &bitmap).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
