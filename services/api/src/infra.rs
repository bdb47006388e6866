use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use study_abroad::workflows::application::{
    Application, ApplicationId, ApplicationRepository, FileStorage, ProfileStore,
    ProfileStoreError, ProfileUpdate, ProgramId, RepositoryError, StorageError, StoredFile,
    UserId, UserProfile, ValidatedUpload,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
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
        if guard.contains_key(&application.id) {
            guard.insert(application.id.clone(), application);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
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
        applications.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        Ok(applications)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileStore {
    profiles: Arc<Mutex<HashMap<UserId, UserProfile>>>,
}

impl ProfileStore for InMemoryProfileStore {
    fn get(&self, user_id: &UserId) -> Result<Option<UserProfile>, ProfileStoreError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.get(user_id).cloned())
    }

    fn update(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ProfileStoreError> {
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let profile = guard.entry(user_id.clone()).or_default();
        profile.apply(update);
        Ok(profile.clone())
    }
}

/// Writes documents under `<root>/<application>/<slot>/<file name>`.
#[derive(Debug, Clone)]
pub(crate) struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn prepare(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    fn target(&self, application_id: &ApplicationId, upload: &ValidatedUpload) -> PathBuf {
        // Only the final component of the client-supplied name is kept.
        let file_name = Path::new(&upload.file_name)
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| format!("upload.{}", upload.extension).into());
        self.root
            .join(sanitize_segment(&application_id.0))
            .join(sanitize_segment(upload.document_type.as_str()))
            .join(file_name)
    }
}

fn sanitize_segment(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

impl FileStorage for LocalFileStorage {
    fn store(
        &self,
        application_id: &ApplicationId,
        upload: &ValidatedUpload,
        contents: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let target = self.target(application_id, upload);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, contents)?;
        Ok(StoredFile {
            file_path: target.display().to_string(),
        })
    }

    fn remove(&self, file_path: &str) -> Result<(), StorageError> {
        let target = Path::new(file_path);
        if !target.starts_with(&self.root) {
            return Err(StorageError::Unavailable(format!(
                "{file_path} is outside the upload directory"
            )));
        }
        match fs::remove_file(target) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
