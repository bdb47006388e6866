use super::domain::{Application, ApplicationId, ProgramId, UserId};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    /// Store a new draft unless the user already holds a draft for the same
    /// program, in which case the existing draft is returned untouched. Must be
    /// atomic per `(user, program)` pair.
    fn insert_draft(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn find_draft(
        &self,
        user_id: &UserId,
        program_id: &ProgramId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn for_user(&self, user_id: &UserId) -> Result<Vec<Application>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
