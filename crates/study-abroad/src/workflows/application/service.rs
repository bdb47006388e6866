use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::completion::{is_complete, review_complete};
use super::documents::{
    validate_upload, FileStorage, StorageError, UploadCandidate, UploadRejection,
};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, Document, DocumentId, DocumentType, ProgramId,
    StepNumber, StepRecord, UserId,
};
use super::payload::{PersonalDocuments, StepData};
use super::profile::{ProfileStore, ProfileSync};
use super::progress::{refresh, ProgressSnapshot, COUNTED_STEPS};
use super::registry::StepRegistry;
use super::repository::{ApplicationRepository, RepositoryError};
use super::views::StepView;

/// Service owning the application aggregate: drafts, step saves, navigation,
/// document slots and submission.
pub struct ApplicationService<R, P, S> {
    repository: Arc<R>,
    profiles: ProfileSync<P>,
    storage: Arc<S>,
    registry: &'static StepRegistry,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn next_document_id() -> DocumentId {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DocumentId(format!("doc-{id:06}"))
}

fn resolve_step(step: u32) -> Result<StepNumber, ApplicationServiceError> {
    u8::try_from(step)
        .ok()
        .and_then(StepNumber::new)
        .ok_or(ApplicationServiceError::StepNotFound(step))
}

impl<R, P, S> ApplicationService<R, P, S>
where
    R: ApplicationRepository + 'static,
    P: ProfileStore + 'static,
    S: FileStorage + 'static,
{
    pub fn new(repository: Arc<R>, profiles: Arc<P>, storage: Arc<S>) -> Self {
        Self {
            repository,
            profiles: ProfileSync::new(profiles),
            storage,
            registry: StepRegistry::shared(),
        }
    }

    pub fn registry(&self) -> &StepRegistry {
        self.registry
    }

    /// Return the user's draft for the program, creating it on first visit.
    pub fn resume_or_create(
        &self,
        user_id: &UserId,
        program_id: &ProgramId,
    ) -> Result<Application, ApplicationServiceError> {
        if let Some(existing) = self.repository.find_draft(user_id, program_id)? {
            debug!(application = %existing.id, "resuming draft application");
            return Ok(existing);
        }

        let draft = Application::new_draft(
            next_application_id(),
            user_id.clone(),
            program_id.clone(),
            Utc::now(),
        );
        let stored = self.repository.insert_draft(draft)?;
        info!(
            application = %stored.id,
            user = %user_id,
            program = %program_id,
            "draft application ready"
        );
        Ok(stored)
    }

    /// Store a step payload, refresh completion and progress, then mirror the
    /// step into the profile on a best-effort basis. A documents payload only
    /// marks the step as saved; its slots are kept as uploaded.
    pub fn save_step(
        &self,
        application_id: &ApplicationId,
        step: u32,
        data: StepData,
    ) -> Result<StepRecord, ApplicationServiceError> {
        let step = resolve_step(step)?;
        let mut application = self.load_draft(application_id)?;

        let found = data.step_number();
        if found != step {
            return Err(ApplicationServiceError::StepDataMismatch {
                expected: step,
                found,
            });
        }

        let now = Utc::now();
        let record = application.step_mut(step);
        record.step_data = match data.normalized() {
            // Slots only change through upload_document and remove_document.
            StepData::PersonalDocuments(_) => StepData::PersonalDocuments(
                record.step_data.documents().cloned().unwrap_or_default(),
            ),
            other => other,
        };
        record.saved_at = Some(now);

        let progress = reevaluate(&mut application, now);
        application.updated_at = now;
        self.repository.update(application.clone())?;

        debug!(
            application = %application.id,
            %step,
            completed = application.step(step).is_completed,
            progress = progress.percentage,
            "step saved"
        );

        self.profiles
            .sync(&application.user_id, &application.step(step).step_data);

        Ok(application.step(step).clone())
    }

    /// Load a step for display. Steps never saved are pre-filled from the
    /// profile when it mirrors them; nothing is persisted by loading.
    pub fn load_step(
        &self,
        application_id: &ApplicationId,
        step: u32,
    ) -> Result<StepView, ApplicationServiceError> {
        let step = resolve_step(step)?;
        let application = self.get(application_id)?;
        let mut record = application.step(step).clone();

        let mut prefilled = false;
        if application.is_draft() && !record.has_saved_data() {
            if let Some(data) = self.profiles.prefill(&application.user_id, step) {
                record.step_data = data;
                prefilled = true;
            }
        }

        Ok(StepView {
            application_id: application.id,
            definition: self.registry.get(step).cloned(),
            record,
            prefilled,
        })
    }

    pub fn advance(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        self.move_cursor(application_id, StepNumber::next)
    }

    pub fn retreat(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        self.move_cursor(application_id, StepNumber::previous)
    }

    /// Validate, store and attach a document to its slot. Nothing is committed
    /// to the application unless storage succeeds.
    pub fn upload_document(
        &self,
        application_id: &ApplicationId,
        document_type: DocumentType,
        file_name: &str,
        contents: &[u8],
    ) -> Result<Document, ApplicationServiceError> {
        let application = self.load_draft(application_id)?;
        let candidate = UploadCandidate::new(file_name, contents.len() as u64);
        let upload = validate_upload(&candidate, &document_type)?;
        let stored = self.storage.store(&application.id, &upload, contents)?;

        // Storage can be slow; apply the slot change to the latest saved state.
        let mut application = match self.load_draft(application_id) {
            Ok(application) => application,
            Err(err) => {
                self.discard_file(&stored.file_path);
                return Err(err);
            }
        };
        let now = Utc::now();
        let document = upload.into_document(next_document_id(), stored, now);

        let replaced = with_documents(&mut application, now, |documents| {
            documents.replace(document.clone())
        });
        // A same-name replacement was overwritten in place and still backs the slot.
        let overwritten = replaced
            .as_ref()
            .is_some_and(|previous| previous.file_path == document.file_path);
        reevaluate(&mut application, now);
        application.updated_at = now;
        if let Err(err) = self.repository.update(application) {
            if !overwritten {
                self.discard_file(&document.file_path);
            }
            return Err(err.into());
        }
        if let (Some(previous), false) = (&replaced, overwritten) {
            self.discard_file(&previous.file_path);
        }

        info!(
            application = %application_id,
            document = %document.document_type,
            size = document.file_size,
            replaced = replaced.is_some(),
            "document uploaded"
        );
        Ok(document)
    }

    pub fn remove_document(
        &self,
        application_id: &ApplicationId,
        document_type: &DocumentType,
    ) -> Result<Option<Document>, ApplicationServiceError> {
        let mut application = self.load_draft(application_id)?;
        let now = Utc::now();

        let removed = with_documents(&mut application, now, |documents| {
            documents.remove(document_type)
        });
        if removed.is_none() {
            return Ok(None);
        }

        reevaluate(&mut application, now);
        application.updated_at = now;
        self.repository.update(application)?;

        if let Some(document) = &removed {
            self.discard_file(&document.file_path);
        }
        Ok(removed)
    }

    /// Transition `draft -> submitted` once steps 1 to 6 are complete.
    pub fn submit(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        let mut application = self.load_draft(application_id)?;
        let now = Utc::now();

        let progress = reevaluate(&mut application, now);
        if !progress.can_submit {
            let missing = StepNumber::input_steps()
                .filter(|step| !application.is_step_completed(*step))
                .collect();
            return Err(ApplicationServiceError::IncompleteApplication { missing });
        }

        application.status = ApplicationStatus::Submitted;
        application.submitted_at = Some(now);
        application.updated_at = now;
        self.repository.update(application.clone())?;

        info!(
            application = %application.id,
            program = %application.program_id,
            "application submitted"
        );
        Ok(application)
    }

    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        self.repository
            .fetch(application_id)?
            .ok_or_else(|| ApplicationServiceError::ApplicationNotFound(application_id.clone()))
    }

    pub fn applications_for(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        Ok(self.repository.for_user(user_id)?)
    }

    fn load_draft(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        let application = self.get(application_id)?;
        if !application.status.is_editable() {
            return Err(ApplicationServiceError::AlreadySubmitted(application.id));
        }
        Ok(application)
    }

    /// Files no application points at are deleted best-effort; a failure only
    /// leaves an orphan on disk.
    fn discard_file(&self, file_path: &str) {
        if let Err(err) = self.storage.remove(file_path) {
            warn!(file = file_path, error = %err, "stored document left behind");
        }
    }

    fn move_cursor(
        &self,
        application_id: &ApplicationId,
        movement: fn(StepNumber) -> StepNumber,
    ) -> Result<Application, ApplicationServiceError> {
        let mut application = self.get(application_id)?;
        let target = movement(application.current_step);
        if target == application.current_step {
            return Ok(application);
        }

        application.current_step = target;
        application.updated_at = Utc::now();
        self.repository.update(application.clone())?;
        Ok(application)
    }
}

/// Re-derive every completion flag, the review checkpoint and progress from
/// the stored step data.
fn reevaluate(application: &mut Application, now: DateTime<Utc>) -> ProgressSnapshot {
    for step in StepNumber::input_steps() {
        let complete = is_complete(&application.step(step).step_data);
        application.step_mut(step).mark_completion(complete, now);
    }
    let review = review_complete(&application.steps);
    application
        .step_mut(StepNumber::REVIEW)
        .mark_completion(review, now);
    refresh(application)
}

fn with_documents<T>(
    application: &mut Application,
    now: DateTime<Utc>,
    change: impl FnOnce(&mut PersonalDocuments) -> T,
) -> T {
    let record = application.step_mut(StepNumber::PERSONAL_DOCUMENTS);
    let mut documents = match std::mem::replace(&mut record.step_data, StepData::Review) {
        StepData::PersonalDocuments(documents) => documents,
        _ => PersonalDocuments::default(),
    };
    let outcome = change(&mut documents);
    record.step_data = StepData::PersonalDocuments(documents);
    record.saved_at = Some(now);
    outcome
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("step {0} does not exist")]
    StepNotFound(u32),
    #[error("payload for step {found} cannot be saved as step {expected}")]
    StepDataMismatch {
        expected: StepNumber,
        found: StepNumber,
    },
    #[error(transparent)]
    Validation(#[from] UploadRejection),
    #[error("application is incomplete: {} of {} steps remaining", .missing.len(), COUNTED_STEPS)]
    IncompleteApplication { missing: Vec<StepNumber> },
    #[error("application {0} has already been submitted")]
    AlreadySubmitted(ApplicationId),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApplicationServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApplicationServiceError::ApplicationNotFound(_)
                | ApplicationServiceError::StepNotFound(_)
                | ApplicationServiceError::Repository(RepositoryError::NotFound)
        )
    }
}
