use std::path::{Path, PathBuf};

use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{constants::IMAGE_UPLOAD_DIR, errors::AppError};

/// Accepted file extensions and the sniffed content type each one must carry
const ALLOWED_IMAGE_TYPES: [(&str, &str); 3] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
];

/// Relative storage path `exercise-images/<exercise>/<uuid>.<extension>`
pub fn exercise_image_upload_path(exercise_base_id: i64, uuid: &Uuid, extension: &str) -> String {
    format!("{}/{}/{}.{}", IMAGE_UPLOAD_DIR, exercise_base_id, uuid, extension)
}

/// Sniffs the content and only lets PNG and JPEG through
pub fn detect_image_type(bytes: &[u8]) -> Result<&'static str, AppError> {
    let kind = infer::get(bytes)
        .ok_or_else(|| AppError::UnsupportedMediaType("Unrecognized file content".into()))?;

    ALLOWED_IMAGE_TYPES
        .iter()
        .map(|(_, mime)| *mime)
        .find(|mime| *mime == kind.mime_type())
        .ok_or_else(|| {
            AppError::UnsupportedMediaType(format!(
                "Only PNG and JPEG formats are supported, got {}",
                kind.mime_type()
            ))
        })
}

/// Checks the uploaded file name against its content. Returns the
/// lowercased extension to store the file under.
pub fn validate_image_file(file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| AppError::UnsupportedMediaType("Image file name needs an extension".into()))?;

    let expected_mime = ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .ok_or_else(|| {
            AppError::UnsupportedMediaType(format!("File extension '{}' is not allowed", extension))
        })?;

    let detected = detect_image_type(bytes)?;
    if detected != expected_mime {
        return Err(AppError::UnsupportedMediaType(format!(
            "File extension '{}' does not match content type {}",
            extension, detected
        )));
    }

    Ok(extension)
}

/// Writes uploads below the media root
#[derive(Clone, Debug)]
pub struct LocalImageStorage {
    root: PathBuf,
}

impl LocalImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalImageStorage { root: root.into() }
    }

    pub fn full_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Writes a new file. An existing file at the same path is never
    /// replaced and yields `Conflict`.
    pub async fn store(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
        let target = self.full_path(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    AppError::Conflict(format!("An image is already stored at {}", relative))
                }
                _ => AppError::from(e),
            })?;
        file.write_all(bytes).await?;
        file.flush().await?;

        debug!("Stored {} bytes at {}", bytes.len(), target.display());
        Ok(target)
    }

    /// Best effort, used to roll back an upload whose record was not saved
    pub async fn discard(&self, relative: &str) {
        let target = self.full_path(relative);
        if let Err(e) = fs::remove_file(&target).await {
            warn!("Could not remove {}: {}", target.display(), e);
        }
    }
}
