//! File-input collaborator: uploaded or pasted files and their acceptance
//! rules.

use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;

use crate::editor::{EncodedImage, OriginalFile};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("{name} is not an image ({media_type})")]
    NotAnImage { name: String, media_type: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot determine the image type of {path}")]
    UnknownFormat { path: PathBuf },
    #[error("failed to read image {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

pub type InputResult<T> = std::result::Result<T, InputError>;

/// A raw file handed over by the upload control or a paste event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, deriving its media type from the extension.
    pub fn from_path(path: &Path) -> InputResult<Self> {
        let format = ImageFormat::from_path(path).map_err(|_| InputError::UnknownFormat {
            path: path.to_path_buf(),
        })?;
        let bytes = std::fs::read(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(name, format.to_mime_type(), bytes))
    }

    pub fn is_image(&self) -> bool {
        is_image_media_type(&self.media_type)
    }
}

pub fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("image/")
}

/// Validates the media type and reads the natural size of the bitmap.
pub fn accept_file(file: SourceFile) -> InputResult<(EncodedImage, OriginalFile)> {
    if !file.is_image() {
        return Err(InputError::NotAnImage {
            name: file.name,
            media_type: file.media_type,
        });
    }
    let original = OriginalFile {
        name: file.name.clone(),
        media_type: file.media_type.clone(),
    };
    let image = EncodedImage::from_bytes(file.bytes, file.media_type).map_err(|source| {
        InputError::Decode {
            name: file.name,
            source,
        }
    })?;
    Ok((image, original))
}

/// The first image item of a paste wins; everything after it is ignored.
pub fn first_pasted_image(items: impl IntoIterator<Item = SourceFile>) -> Option<SourceFile> {
    items.into_iter().find(SourceFile::is_image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::model::test_images::png_bytes;
    use crate::geometry::ImageSize;

    #[test]
    fn media_type_check_is_prefix_based() {
        assert!(is_image_media_type("image/png"));
        assert!(is_image_media_type("Image/JPEG"));
        assert!(!is_image_media_type("text/plain"));
        assert!(!is_image_media_type(""));
    }

    #[test]
    fn accept_file_reads_natural_size() {
        let file = SourceFile::new("shot.png", "image/png", png_bytes(400, 300, 0));
        let (image, original) = accept_file(file).expect("png should be accepted");
        assert_eq!(image.size(), ImageSize::new(400, 300));
        assert_eq!(original.name, "shot.png");
    }

    #[test]
    fn accept_file_rejects_non_images_and_garbage() {
        let err = accept_file(SourceFile::new("notes.txt", "text/plain", b"hi".to_vec()))
            .expect_err("text should be refused");
        assert!(matches!(err, InputError::NotAnImage { .. }));

        let err = accept_file(SourceFile::new("broken.png", "image/png", vec![0; 8]))
            .expect_err("garbage should be refused");
        assert!(matches!(err, InputError::Decode { .. }));
    }

    #[test]
    fn first_image_item_of_paste_wins() {
        let items = vec![
            SourceFile::new("a.txt", "text/plain", Vec::new()),
            SourceFile::new("b.png", "image/png", Vec::new()),
            SourceFile::new("c.png", "image/png", Vec::new()),
        ];
        let picked = first_pasted_image(items).expect("an image item exists");
        assert_eq!(picked.name, "b.png");
        assert!(first_pasted_image(Vec::new()).is_none());
    }

    #[test]
    fn from_path_derives_media_type_from_extension() {
        let path = std::env::temp_dir().join("retouch-input-from-path-test.png");
        std::fs::write(&path, png_bytes(3, 2, 0)).unwrap();
        let file = SourceFile::from_path(&path).expect("file should load");
        assert_eq!(file.media_type, "image/png");
        assert_eq!(file.name, "retouch-input-from-path-test.png");
        let _ = std::fs::remove_file(path);

        assert!(matches!(
            SourceFile::from_path(Path::new("/tmp/no-extension")),
            Err(InputError::UnknownFormat { .. })
        ));
    }
}
