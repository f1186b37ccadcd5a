use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::fragment_cache::FragmentInvalidator,
    entities::{
        exercise_image::{
            ExerciseImage, ImageUploadForm, MainImageRepair, SubmissionStatus,
            UpdateExerciseImageRequest,
        },
        submission::{ImageEvent, Submitter},
    },
    errors::AppError,
    events::EventPublisher,
    repositories::exercise_image::ExerciseImageRepository,
    storage::image_storage::{exercise_image_upload_path, validate_image_file, LocalImageStorage},
    utils::host::host_without_port,
};

pub struct ExerciseImageHandler<R, I, E>
where
    R: ExerciseImageRepository,
    I: FragmentInvalidator,
    E: EventPublisher,
{
    pub image_repo: R,
    pub invalidator: I,
    pub events: E,
    /// Attribution used for trusted uploads when the request carries no host
    pub site_domain: String,
}

impl<R, I, E> ExerciseImageHandler<R, I, E>
where
    R: ExerciseImageRepository,
    I: FragmentInvalidator,
    E: EventPublisher,
{
    pub fn new(image_repo: R, invalidator: I, events: E, site_domain: String) -> Self {
        ExerciseImageHandler {
            image_repo,
            invalidator,
            events,
            site_domain,
        }
    }

    /// Persists a new or existing image while keeping a single main image
    /// per exercise.
    pub async fn save(&self, mut image: ExerciseImage) -> Result<ExerciseImage, AppError> {
        let exercise_base_id = image.exercise_base_id;

        if image.is_main {
            let cleared = self.image_repo.clear_main_flags(exercise_base_id).await?;
            debug!("Cleared main flag on {} images of exercise {}", cleared, exercise_base_id);
            image.is_main = true;
        } else if !self.has_accepted_main(exercise_base_id).await? {
            image.is_main = true;
        }

        self.invalidator.invalidate_fragments_for(exercise_base_id).await;

        match image.id {
            None => {
                let id = self.image_repo.insert_image(&image).await?;
                image.id = Some(id);
                info!("Created exercise image {} ({}) for exercise {}", id, image.uuid, exercise_base_id);
            }
            Some(id) => {
                self.image_repo.update_image(&image).await?;
                debug!("Updated exercise image {}", id);
            }
        }

        let repair = self.ensure_single_main(exercise_base_id).await?;
        apply_repair(&mut image, &repair);

        Ok(image)
    }

    /// Deletes the image and promotes a replacement main image if needed.
    pub async fn delete(&self, image: &ExerciseImage) -> Result<MainImageRepair, AppError> {
        let id = image
            .id
            .ok_or_else(|| AppError::NotFound("Exercise image has not been saved".into()))?;

        self.image_repo.delete_image(id).await?;
        info!("Deleted exercise image {} of exercise {}", id, image.exercise_base_id);

        self.invalidator.invalidate_fragments_for(image.exercise_base_id).await;

        if !image.is_accepted() {
            return Ok(MainImageRepair::default());
        }
        self.ensure_single_main(image.exercise_base_id).await
    }

    /// Idempotent repair: with accepted images present exactly one of them
    /// is main afterwards. The first image in default ordering wins.
    pub async fn ensure_single_main(&self, exercise_base_id: i64) -> Result<MainImageRepair, AppError> {
        let accepted = self.image_repo
            .list_images(exercise_base_id, Some(SubmissionStatus::Accepted))
            .await?;

        let mut repair = MainImageRepair::default();
        if accepted.is_empty() {
            return Ok(repair);
        }

        let mut mains = accepted.iter().filter(|img| img.is_main).filter_map(|img| img.id);

        match mains.next() {
            Some(_keep) => {
                for extra in mains {
                    self.image_repo.set_main_flag(extra, false).await?;
                    repair.demoted.push(extra);
                }
            }
            None => {
                if let Some(first) = accepted.iter().find_map(|img| img.id) {
                    self.image_repo.set_main_flag(first, true).await?;
                    repair.promoted = Some(first);
                }
            }
        }

        if !repair.is_noop() {
            info!(
                "Repaired main image of exercise {}: promoted {:?}, demoted {:?}",
                exercise_base_id, repair.promoted, repair.demoted
            );
        }

        Ok(repair)
    }

    /// Resolves status and attribution of a freshly submitted image.
    /// Untrusted submissions yield an event for the admins.
    pub fn set_author(
        &self,
        image: &mut ExerciseImage,
        submitter: &Submitter,
        host: &str,
    ) -> Option<ImageEvent> {
        if submitter.is_trusted() {
            image.status = SubmissionStatus::Accepted;
            if !image.has_license_author() {
                let host = host_without_port(host);
                let author = if host.is_empty() { self.site_domain.as_str() } else { host };
                image.license_author = Some(author.to_string());
            }
            return None;
        }

        if !image.has_license_author() {
            image.license_author = Some(submitter.username.clone());
        }

        Some(ImageEvent::UntrustedSubmission {
            username: submitter.username.clone(),
            image_name: image.display_name().to_string(),
            exercise_base_id: image.exercise_base_id,
        })
    }

    /// Creation path shared by web and API uploads
    pub async fn submit_image(
        &self,
        mut image: ExerciseImage,
        submitter: &Submitter,
        host: &str,
    ) -> Result<ExerciseImage, AppError> {
        let event = self.set_author(&mut image, submitter, host);

        let saved = self.save(image).await?;

        if let Some(event) = event {
            self.events.publish(event);
        }

        Ok(saved)
    }

    /// Stores the uploaded file and submits its record. A rejected record
    /// removes the file again; files of other images are never touched.
    pub async fn upload_image(
        &self,
        storage: &LocalImageStorage,
        form: ImageUploadForm,
        submitter: &Submitter,
        host: &str,
    ) -> Result<ExerciseImage, AppError> {
        form.validate()?;
        let extension = validate_image_file(&form.file_name, &form.file_data)?;

        let uuid = form.uuid.unwrap_or_else(Uuid::new_v4);
        if self.image_repo.get_image_by_uuid(&uuid).await?.is_some() {
            return Err(AppError::Conflict(format!("An image with uuid {} already exists", uuid)));
        }

        let path = exercise_image_upload_path(form.exercise_base_id, &uuid, &extension);
        storage.store(&path, &form.file_data).await?;

        let mut image = ExerciseImage::new(form.exercise_base_id, uuid, path.clone());
        image.is_main = form.is_main;
        image.style = form.style;
        image.license_author = form.license_author;

        match self.submit_image(image, submitter, host).await {
            Ok(saved) => Ok(saved),
            Err(e) => {
                storage.discard(&path).await;
                Err(e)
            }
        }
    }

    pub async fn get_image(&self, id: i64) -> Result<ExerciseImage, AppError> {
        self.image_repo
            .get_image_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exercise image not found".to_string()))
    }

    /// Publicly visible images of an exercise in default ordering
    pub async fn list_images(&self, exercise_base_id: i64) -> Result<Vec<ExerciseImage>, AppError> {
        self.image_repo
            .list_images(exercise_base_id, Some(SubmissionStatus::Accepted))
            .await
    }

    pub fn can_edit(&self, image: &ExerciseImage, submitter: &Submitter) -> bool {
        match image.owner_object() {
            Some(owner) if owner.to_string() == submitter.user_id => true,
            _ => submitter.is_trusted(),
        }
    }

    pub async fn update_image(
        &self,
        id: i64,
        request: &UpdateExerciseImageRequest,
        submitter: &Submitter,
    ) -> Result<ExerciseImage, AppError> {
        request.validate()?;

        let mut image = self.get_image(id).await?;
        if !self.can_edit(&image, submitter) {
            return Err(AppError::ForbiddenAccess);
        }

        request.apply_to(&mut image);
        self.save(image).await
    }

    pub async fn delete_image(&self, id: i64, submitter: &Submitter) -> Result<MainImageRepair, AppError> {
        let image = self.get_image(id).await?;
        if !self.can_edit(&image, submitter) {
            return Err(AppError::ForbiddenAccess);
        }

        self.delete(&image).await
    }

    /// Accepts or declines a pending submission
    pub async fn moderate(
        &self,
        id: i64,
        decision: SubmissionStatus,
        submitter: &Submitter,
    ) -> Result<ExerciseImage, AppError> {
        if !submitter.is_trusted() {
            return Err(AppError::ForbiddenAccess);
        }

        let mut image = self.get_image(id).await?;
        image.status = image.status.transition_to(decision)?;

        self.image_repo.update_status(id, image.status).await?;
        info!("Image {} moved to {} by {}", id, image.status, submitter.username);

        self.invalidator.invalidate_fragments_for(image.exercise_base_id).await;

        let repair = self.ensure_single_main(image.exercise_base_id).await?;
        apply_repair(&mut image, &repair);

        Ok(image)
    }

    async fn has_accepted_main(&self, exercise_base_id: i64) -> Result<bool, AppError> {
        let accepted = self.image_repo
            .count_images(exercise_base_id, Some(SubmissionStatus::Accepted), None)
            .await?;
        if accepted == 0 {
            return Ok(false);
        }

        let accepted_main = self.image_repo
            .count_images(exercise_base_id, Some(SubmissionStatus::Accepted), Some(true))
            .await?;

        Ok(accepted_main > 0)
    }
}

fn apply_repair(image: &mut ExerciseImage, repair: &MainImageRepair) {
    if image.id.is_some() && repair.promoted == image.id {
        image.is_main = true;
    }
    if image.id.is_some_and(|id| repair.demoted.contains(&id)) {
        image.is_main = false;
    }
}
