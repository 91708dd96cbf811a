use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::editor::EncodedImage;

const FALLBACK_BASENAME: &str = "image";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("export file name is empty")]
    MissingFileName,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Which result an export carries; decides the file-name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// In-place brush result.
    Processed,
    /// Side-by-side rectangle result.
    Cropped,
}

impl ExportKind {
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Processed => "_processed.png",
            Self::Cropped => "_cropped.png",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub kind: ExportKind,
    pub image: EncodedImage,
}

/// `<basename><suffix>`, where basename is the original name without its
/// extension, or `image` when nothing is left.
pub fn export_file_name(original_name: Option<&str>, kind: ExportKind) -> String {
    let base = original_name
        .map(|name| match name.rfind('.') {
            Some(index) => &name[..index],
            None => name,
        })
        .map(str::trim)
        .filter(|base| !base.is_empty())
        .unwrap_or(FALLBACK_BASENAME);
    format!("{base}{}", kind.suffix())
}

pub trait ExportStorage {
    fn save_export(&self, artifact: &ExportArtifact) -> StorageResult<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct StorageService {
    export_dir: PathBuf,
}

impl StorageService {
    pub const fn with_export_dir(export_dir: PathBuf) -> Self {
        Self { export_dir }
    }

    pub fn with_default_paths() -> StorageResult<Self> {
        Ok(Self::with_export_dir(std::env::current_dir()?))
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn target_path(&self, file_name: &str) -> StorageResult<PathBuf> {
        let file_name = Path::new(file_name)
            .file_name()
            .ok_or(StorageError::MissingFileName)?;
        Ok(self.export_dir.join(file_name))
    }
}

impl ExportStorage for StorageService {
    fn save_export(&self, artifact: &ExportArtifact) -> StorageResult<PathBuf> {
        let target = self.target_path(&artifact.file_name)?;
        save_overwrite(artifact.image.bytes(), &target)?;
        tracing::info!(path = %target.display(), "export written");
        Ok(target)
    }
}

fn save_overwrite(bytes: &[u8], destination: &Path) -> StorageResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(destination, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::model::test_images::png;

    #[test]
    fn export_name_strips_extension_and_appends_suffix() {
        assert_eq!(
            export_file_name(Some("holiday.photo.jpg"), ExportKind::Processed),
            "holiday.photo_processed.png"
        );
        assert_eq!(
            export_file_name(Some("scan.png"), ExportKind::Cropped),
            "scan_cropped.png"
        );
    }

    #[test]
    fn export_name_falls_back_to_image() {
        assert_eq!(
            export_file_name(None, ExportKind::Processed),
            "image_processed.png"
        );
        assert_eq!(
            export_file_name(Some(".png"), ExportKind::Processed),
            "image_processed.png"
        );
        assert_eq!(
            export_file_name(Some("README"), ExportKind::Cropped),
            "README_cropped.png"
        );
    }

    #[test]
    fn target_path_refuses_directory_escapes() {
        let service = StorageService::with_export_dir(PathBuf::from("/tmp/exports"));
        assert_eq!(
            service.target_path("../etc/out.png").unwrap(),
            PathBuf::from("/tmp/exports/out.png")
        );
        assert!(matches!(
            service.target_path(".."),
            Err(StorageError::MissingFileName)
        ));
    }

    #[test]
    fn save_export_overwrites_existing_file() {
        let dir = std::env::temp_dir().join("retouch-storage-test");
        let service = StorageService::with_export_dir(dir.clone());
        let artifact = ExportArtifact {
            file_name: "shot_processed.png".to_string(),
            kind: ExportKind::Processed,
            image: png(3, 3, 7),
        };
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("shot_processed.png"), b"stale").unwrap();

        let path = service.save_export(&artifact).expect("export should save");
        assert_eq!(std::fs::read(&path).unwrap(), artifact.image.bytes());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn save_export_truncates_a_longer_previous_file() {
        let dir = std::env::temp_dir()
            .join(format!("retouch-storage-truncate-{}", std::process::id()));
        let service = StorageService::with_export_dir(dir.clone());
        let artifact = ExportArtifact {
            file_name: "scan_cropped.png".to_string(),
            kind: ExportKind::Cropped,
            image: png(1, 1, 3),
        };
        std::fs::create_dir_all(&dir).unwrap();
        let previous = vec![0xAB_u8; artifact.image.bytes().len() * 4];
        std::fs::write(dir.join("scan_cropped.png"), &previous).unwrap();

        let path = service.save_export(&artifact).expect("export should save");
        assert_eq!(std::fs::read(&path).unwrap(), artifact.image.bytes());
        let _ = std::fs::remove_dir_all(dir);
    }
}
