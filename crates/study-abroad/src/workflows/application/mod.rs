//! Study-abroad application wizard.
//!
//! Seven fixed steps collect the application. Each save re-derives step
//! completion and overall progress from the stored data, mirrors personal,
//! academic and reference answers into the applicant's standing profile on a
//! best-effort basis, and submission is gated on steps 1 to 6 being complete.

pub mod completion;
pub mod documents;
pub mod domain;
pub mod payload;
pub mod profile;
pub mod progress;
pub mod registry;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use completion::{is_complete, review_complete, MINIMUM_REFERENCES};
pub use documents::{
    validate_upload, FileStorage, StorageError, StoredFile, UploadCandidate, UploadRejection,
    ValidatedUpload, ALLOWED_EXTENSIONS, MAX_DOCUMENT_BYTES,
};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, Document, DocumentId, DocumentStatus,
    DocumentType, InvalidStepNumber, ProgramId, StepNumber, StepRecord, UserId,
};
pub use payload::{
    AcademicInfo, AgentSelection, AgentSelectionType, AgentSummary, MotivationLetter,
    PersonalDocuments, PersonalInfo, Reference, ReferenceKind, References, StepData,
};
pub use profile::{
    ProfileStore, ProfileStoreError, ProfileSync, ProfileUpdate, ReferencesUpdate, SyncOutcome,
    UserProfile,
};
pub use progress::{compute_progress, ProgressSnapshot, ProgressStatus, COUNTED_STEPS};
pub use registry::{Locale, LocalizedText, StepDefinition, StepRegistry};
pub use repository::{ApplicationRepository, RepositoryError};
pub use router::{application_router, CreateApplicationRequest};
pub use service::{ApplicationService, ApplicationServiceError};
pub use views::{ApplicationSummary, StepSummary, StepView};
