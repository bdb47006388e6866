use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::application::documents::{
    FileStorage, StorageError, StoredFile, ValidatedUpload,
};
use crate::workflows::application::domain::{
    Application, ApplicationId, Document, DocumentId, DocumentStatus, DocumentType, ProgramId,
    UserId,
};
use crate::workflows::application::payload::{
    AcademicInfo, AgentSelection, AgentSelectionType, AgentSummary, MotivationLetter,
    PersonalDocuments, PersonalInfo, Reference, References, StepData,
};
use crate::workflows::application::profile::{
    ProfileStore, ProfileStoreError, ProfileUpdate, UserProfile,
};
use crate::workflows::application::repository::{ApplicationRepository, RepositoryError};
use crate::workflows::application::{application_router, ApplicationService};

pub(super) const ONE_MIB: usize = 1024 * 1024;

pub(super) fn user() -> UserId {
    UserId("student-42".to_string())
}

pub(super) fn program() -> ProgramId {
    ProgramId("lyon-msc-data-science".to_string())
}

pub(super) fn personal_info() -> PersonalInfo {
    PersonalInfo {
        first_name: Some("Amina".to_string()),
        last_name: Some("Benali".to_string()),
        email: Some("amina.benali@example.org".to_string()),
        phone: Some("+213 555 010 203".to_string()),
        date_of_birth: NaiveDate::from_ymd_opt(2001, 4, 17),
        nationality: Some("Algerian".to_string()),
        address: Some("12 Rue Didouche Mourad".to_string()),
        city: Some("Algiers".to_string()),
        country: Some("Algeria".to_string()),
        emergency_contact_name: None,
        emergency_contact_phone: None,
        emergency_contact_relationship: None,
    }
}

pub(super) fn agent_selection() -> AgentSelection {
    AgentSelection {
        selection_type: AgentSelectionType::ByCode,
        agent_code: Some("AG-7781".to_string()),
        selected_agent: Some(AgentSummary {
            id: "agent-7781".to_string(),
            name: "Karim Haddad".to_string(),
        }),
    }
}

pub(super) fn academic_info() -> AcademicInfo {
    AcademicInfo {
        highest_education: Some("Bachelor".to_string()),
        current_institution: Some("USTHB".to_string()),
        graduation_year: Some(2023),
        field_of_study: Some("Computer Science".to_string()),
        gpa: Some(15.2),
    }
}

pub(super) fn document(document_type: DocumentType, file_name: &str) -> Document {
    Document {
        id: DocumentId(format!("doc-{file_name}")),
        document_type,
        file_name: file_name.to_string(),
        file_path: format!("memory://{file_name}"),
        file_size: 2 * ONE_MIB as u64,
        content_type: "application/pdf".to_string(),
        status: DocumentStatus::Pending,
        uploaded_at: Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap(),
    }
}

pub(super) fn required_documents() -> PersonalDocuments {
    let mut documents = PersonalDocuments::default();
    documents.replace(document(DocumentType::Passport, "passport.pdf"));
    documents.replace(document(DocumentType::Photo, "photo.png"));
    documents
}

pub(super) fn motivation_letter() -> MotivationLetter {
    MotivationLetter::new("I want to study data science in Lyon because of its research labs.")
}

pub(super) fn reference(name: &str) -> Reference {
    Reference {
        name: name.to_string(),
        email: Some(format!("{}@example.org", name.to_ascii_lowercase())),
        phone: None,
        relationship: Some("Supervisor".to_string()),
        organization: Some("USTHB".to_string()),
    }
}

pub(super) fn references() -> References {
    References {
        academic: vec![reference("Meziane")],
        professional: vec![reference("Lounis")],
        personal: Vec::new(),
    }
}

/// Minimal valid payloads for steps 1 to 6, in order.
pub(super) fn complete_steps() -> Vec<(u32, StepData)> {
    vec![
        (1, StepData::PersonalInfo(personal_info())),
        (2, StepData::AgentSelection(agent_selection())),
        (3, StepData::AcademicInfo(academic_info())),
        (4, StepData::PersonalDocuments(required_documents())),
        (5, StepData::MotivationLetter(motivation_letter())),
        (6, StepData::References(references())),
    ]
}

/// Saves every input step and uploads the required documents, leaving the
/// draft ready to submit. Step 4 goes through uploads since saves never touch
/// the document slots.
pub(super) fn fill_application(service: &TestService, id: &ApplicationId) {
    for (step, data) in complete_steps() {
        service.save_step(id, step, data).expect("save step");
    }
    upload_required_documents(service, id);
}

pub(super) fn upload_required_documents(service: &TestService, id: &ApplicationId) {
    service
        .upload_document(id, DocumentType::Passport, "passport.pdf", &pdf_bytes(1024))
        .expect("passport upload");
    service
        .upload_document(id, DocumentType::Photo, "photo.jpg", &[0xFF, 0xD8, 0xFF])
        .expect("photo upload");
}

pub(super) type TestService = ApplicationService<MemoryRepository, MemoryProfiles, MemoryStorage>;

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryRepository>,
    Arc<MemoryProfiles>,
    Arc<MemoryStorage>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let profiles = Arc::new(MemoryProfiles::default());
    let storage = Arc::new(MemoryStorage::default());
    let service = ApplicationService::new(repository.clone(), profiles.clone(), storage.clone());
    (service, repository, profiles, storage)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert_draft(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if let Some(existing) = guard.values().find(|record| {
            record.is_draft() && record.belongs_to(&application.user_id, &application.program_id)
        }) {
            return Ok(existing.clone());
        }
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(application.id.clone(), application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_draft(
        &self,
        user_id: &UserId,
        program_id: &ProgramId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.is_draft() && record.belongs_to(user_id, program_id))
            .cloned())
    }

    fn for_user(&self, user_id: &UserId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut applications: Vec<_> = guard
            .values()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect();
        applications.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(applications)
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert_draft(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_draft(
        &self,
        _user_id: &UserId,
        _program_id: &ProgramId,
    ) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_user(&self, _user_id: &UserId) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Reads succeed but every write fails, as when the database turns read-only.
#[derive(Default)]
pub(super) struct ReadOnlyRepository {
    pub(super) inner: MemoryRepository,
}

impl ApplicationRepository for ReadOnlyRepository {
    fn insert_draft(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.insert_draft(application)
    }

    fn update(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database read-only".to_string()))
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn find_draft(
        &self,
        user_id: &UserId,
        program_id: &ProgramId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.find_draft(user_id, program_id)
    }

    fn for_user(&self, user_id: &UserId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.for_user(user_id)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryProfiles {
    profiles: Arc<Mutex<HashMap<UserId, UserProfile>>>,
    updates: Arc<AtomicUsize>,
}

impl MemoryProfiles {
    pub(super) fn seed(&self, user_id: &UserId, profile: UserProfile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(user_id.clone(), profile);
    }

    pub(super) fn profile(&self, user_id: &UserId) -> Option<UserProfile> {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(user_id)
            .cloned()
    }

    pub(super) fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

impl ProfileStore for MemoryProfiles {
    fn get(&self, user_id: &UserId) -> Result<Option<UserProfile>, ProfileStoreError> {
        Ok(self.profile(user_id))
    }

    fn update(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ProfileStoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let profile = guard.entry(user_id.clone()).or_default();
        profile.apply(update);
        Ok(profile.clone())
    }
}

/// Profile store whose every call fails, to exercise best-effort sync.
pub(super) struct BrokenProfiles;

impl ProfileStore for BrokenProfiles {
    fn get(&self, _user_id: &UserId) -> Result<Option<UserProfile>, ProfileStoreError> {
        Err(ProfileStoreError::Unavailable("profile service down".to_string()))
    }

    fn update(
        &self,
        _user_id: &UserId,
        _update: ProfileUpdate,
    ) -> Result<UserProfile, ProfileStoreError> {
        Err(ProfileStoreError::Unavailable("profile service down".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub(super) fn stored_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self
            .files
            .lock()
            .expect("storage mutex poisoned")
            .keys()
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

impl FileStorage for MemoryStorage {
    fn store(
        &self,
        application_id: &ApplicationId,
        upload: &ValidatedUpload,
        contents: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let file_path = format!(
            "memory://{}/{}/{}",
            application_id, upload.document_type, upload.file_name
        );
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .insert(file_path.clone(), contents.to_vec());
        Ok(StoredFile { file_path })
    }

    fn remove(&self, file_path: &str) -> Result<(), StorageError> {
        self.files
            .lock()
            .expect("storage mutex poisoned")
            .remove(file_path);
        Ok(())
    }
}

/// Storage that fails a configurable number of times before succeeding.
#[derive(Default)]
pub(super) struct FlakyStorage {
    remaining_failures: AtomicUsize,
    inner: MemoryStorage,
}

impl FlakyStorage {
    pub(super) fn failing(times: usize) -> Self {
        Self {
            remaining_failures: AtomicUsize::new(times),
            inner: MemoryStorage::default(),
        }
    }
}

impl FileStorage for FlakyStorage {
    fn store(
        &self,
        application_id: &ApplicationId,
        upload: &ValidatedUpload,
        contents: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::Unavailable("upload interrupted".to_string()));
        }
        self.inner.store(application_id, upload, contents)
    }

    fn remove(&self, file_path: &str) -> Result<(), StorageError> {
        self.inner.remove(file_path)
    }
}

pub(super) fn pdf_bytes(size: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.resize(size, b' ');
    bytes
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn application_router_with_service(service: TestService) -> axum::Router {
    application_router(Arc::new(service))
}
