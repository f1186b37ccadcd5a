use std::{fmt, str::FromStr};

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{constants::DEFAULT_LICENSE_ID, errors::AppError};

/// Art style of an exercise image, persisted as a one character code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageStyle {
    LineArt,
    #[serde(rename = "3d")]
    ThreeD,
    LowPoly,
    #[default]
    Photo,
    Other,
}

impl ImageStyle {
    pub fn code(&self) -> &'static str {
        match self {
            ImageStyle::LineArt => "1",
            ImageStyle::ThreeD => "2",
            ImageStyle::LowPoly => "3",
            ImageStyle::Photo => "4",
            ImageStyle::Other => "5",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(ImageStyle::LineArt),
            "2" => Some(ImageStyle::ThreeD),
            "3" => Some(ImageStyle::LowPoly),
            "4" => Some(ImageStyle::Photo),
            "5" => Some(ImageStyle::Other),
            _ => None,
        }
    }
}

impl FromStr for ImageStyle {
    type Err = AppError;

    /// Accepts either the stored code or the kebab-case name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if let Some(style) = ImageStyle::from_code(value) {
            return Ok(style);
        }

        match value.to_lowercase().as_str() {
            "line-art" | "line" => Ok(ImageStyle::LineArt),
            "3d" => Ok(ImageStyle::ThreeD),
            "low-poly" => Ok(ImageStyle::LowPoly),
            "photo" => Ok(ImageStyle::Photo),
            "other" => Ok(ImageStyle::Other),
            _ => Err(AppError::InvalidInput(format!("Unknown image style: {}", s))),
        }
    }
}

/// Moderation state of a submitted image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl SubmissionStatus {
    pub fn code(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "1",
            SubmissionStatus::Accepted => "2",
            SubmissionStatus::Declined => "3",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(SubmissionStatus::Pending),
            "2" => Some(SubmissionStatus::Accepted),
            "3" => Some(SubmissionStatus::Declined),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }

    /// Moderation only ever moves a submission out of `Pending`.
    pub fn transition_to(self, next: SubmissionStatus) -> Result<SubmissionStatus, AppError> {
        if self.is_terminal() || !next.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Cannot move an image from {} to {}",
                self, next
            )));
        }
        Ok(next)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Accepted => "accepted",
            SubmissionStatus::Declined => "declined",
        };
        write!(f, "{s}")
    }
}

/// Row shape of the `exercise_images` table
#[derive(Debug, sqlx::FromRow)]
pub struct ExerciseImageRow {
    pub id: i64,
    pub uuid: Uuid,
    pub exercise_base_id: i64,
    pub image: String,
    pub is_main: bool,
    pub style: String,
    pub status: String,
    pub license_id: i32,
    pub license_author: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseImage {
    /// Assigned by the store on first save
    pub id: Option<i64>,
    pub uuid: Uuid,
    pub exercise_base_id: i64,
    /// Storage path of the uploaded file, relative to the media root
    pub image: String,
    pub is_main: bool,
    pub style: ImageStyle,
    pub status: SubmissionStatus,
    pub license_id: i32,
    pub license_author: Option<String>,
}

impl ExerciseImage {
    pub fn new(exercise_base_id: i64, uuid: Uuid, image: String) -> Self {
        ExerciseImage {
            id: None,
            uuid,
            exercise_base_id,
            image,
            is_main: false,
            style: ImageStyle::default(),
            status: SubmissionStatus::default(),
            license_id: DEFAULT_LICENSE_ID,
            license_author: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == SubmissionStatus::Accepted
    }

    pub fn has_license_author(&self) -> bool {
        self.license_author
            .as_deref()
            .is_some_and(|author| !author.trim().is_empty())
    }

    /// Images are never owned by an individual user, so edit rights
    /// always come from permissions.
    pub fn owner_object(&self) -> Option<Uuid> {
        None
    }

    /// File name shown to moderators
    pub fn display_name(&self) -> &str {
        self.image.rsplit('/').next().unwrap_or(&self.image)
    }
}

impl TryFrom<ExerciseImageRow> for ExerciseImage {
    type Error = AppError;

    fn try_from(row: ExerciseImageRow) -> Result<Self, Self::Error> {
        let style = ImageStyle::from_code(&row.style).ok_or_else(|| {
            AppError::InternalError(format!("Unknown style code '{}' on image {}", row.style, row.id))
        })?;
        let status = SubmissionStatus::from_code(&row.status).ok_or_else(|| {
            AppError::InternalError(format!("Unknown status code '{}' on image {}", row.status, row.id))
        })?;

        Ok(ExerciseImage {
            id: Some(row.id),
            uuid: row.uuid,
            exercise_base_id: row.exercise_base_id,
            image: row.image,
            is_main: row.is_main,
            style,
            status,
            license_id: row.license_id,
            license_author: row.license_author,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ExerciseImageResponse {
    pub id: i64,
    pub uuid: Uuid,
    pub exercise_base: i64,
    pub image: String,
    pub is_main: bool,
    pub style: ImageStyle,
    pub status: SubmissionStatus,
    pub license: i32,
    pub license_author: Option<String>,
}

impl From<ExerciseImage> for ExerciseImageResponse {
    fn from(image: ExerciseImage) -> Self {
        ExerciseImageResponse {
            id: image.id.unwrap_or_default(),
            uuid: image.uuid,
            exercise_base: image.exercise_base_id,
            image: image.image,
            is_main: image.is_main,
            style: image.style,
            status: image.status,
            license: image.license_id,
            license_author: image.license_author,
        }
    }
}

/// Multipart body of an image upload
#[derive(Debug, MultipartForm)]
pub struct ExerciseImageUpload {
    #[multipart(rename = "image", limit = "5 MiB")]
    pub image: TempFile,

    pub exercise_base: Text<i64>,

    pub uuid: Option<Text<Uuid>>,

    pub is_main: Option<Text<bool>>,

    pub style: Option<Text<String>>,

    pub license_author: Option<Text<String>>,
}

impl ExerciseImageUpload {
    /// Reads the spooled file and resolves the optional text fields
    pub async fn into_form(self) -> Result<ImageUploadForm, AppError> {
        let style = match self.style.map(Text::into_inner) {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => ImageStyle::default(),
        };
        let license_author = self
            .license_author
            .map(Text::into_inner)
            .map(|author| author.trim().to_string())
            .filter(|author| !author.is_empty());

        let file_data = tokio::fs::read(self.image.file.path()).await?;

        Ok(ImageUploadForm {
            exercise_base_id: self.exercise_base.into_inner(),
            uuid: self.uuid.map(Text::into_inner),
            is_main: self.is_main.is_some_and(|flag| flag.into_inner()),
            style,
            license_author,
            file_name: self.image.file_name.unwrap_or_default(),
            file_data,
        })
    }
}

/// Upload fields once the file has been read, before it is stored
#[derive(Debug, Validate)]
pub struct ImageUploadForm {
    #[validate(range(min = 1, message = "Exercise is required"))]
    pub exercise_base_id: i64,

    pub uuid: Option<Uuid>,

    pub is_main: bool,

    pub style: ImageStyle,

    #[validate(length(max = 60, message = "Must be at most 60 characters"))]
    pub license_author: Option<String>,

    #[validate(length(min = 1, max = 255, message = "File name is required"))]
    pub file_name: String,

    pub file_data: Vec<u8>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateExerciseImageRequest {
    pub is_main: Option<bool>,

    pub style: Option<ImageStyle>,

    #[validate(length(max = 60, message = "Must be at most 60 characters"))]
    pub license_author: Option<String>,
}

impl UpdateExerciseImageRequest {
    pub fn apply_to(&self, image: &mut ExerciseImage) {
        if let Some(is_main) = self.is_main {
            image.is_main = is_main;
        }
        if let Some(style) = self.style {
            image.style = style;
        }
        if let Some(author) = &self.license_author {
            image.license_author = Some(author.clone());
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageListQuery {
    pub exercise_base: i64,
}

/// Outcome of a main-image repair pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MainImageRepair {
    pub promoted: Option<i64>,
    pub demoted: Vec<i64>,
}

impl MainImageRepair {
    pub fn is_noop(&self) -> bool {
        self.promoted.is_none() && self.demoted.is_empty()
    }
}
