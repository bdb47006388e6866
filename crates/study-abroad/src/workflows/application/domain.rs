use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::payload::StepData;

/// Identifier wrapper for application drafts and submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Portal account owning the application and the standing profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a study program owned by the establishment catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(pub String);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Position of a step in the wizard, always within `1..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StepNumber(u8);

impl StepNumber {
    pub const FIRST: Self = Self(1);
    pub const PERSONAL_INFO: Self = Self(1);
    pub const AGENT_SELECTION: Self = Self(2);
    pub const ACADEMIC_INFO: Self = Self(3);
    pub const PERSONAL_DOCUMENTS: Self = Self(4);
    pub const MOTIVATION_LETTER: Self = Self(5);
    pub const REFERENCES: Self = Self(6);
    pub const REVIEW: Self = Self(7);
    pub const LAST: Self = Self(7);

    /// Number of steps in the wizard.
    pub const COUNT: usize = 7;

    pub const fn new(value: u8) -> Option<Self> {
        if value >= 1 && value <= Self::COUNT as u8 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position inside `Application::steps`.
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (1..=Self::COUNT as u8).map(Self)
    }

    /// Steps carrying user input; the review step is derived from these.
    pub fn input_steps() -> impl Iterator<Item = Self> {
        (1..Self::COUNT as u8).map(Self)
    }

    pub const fn is_review(self) -> bool {
        self.0 == Self::REVIEW.0
    }

    pub fn next(self) -> Self {
        Self((self.0 + 1).min(Self::LAST.0))
    }

    pub fn previous(self) -> Self {
        Self((self.0 - 1).max(Self::FIRST.0))
    }
}

impl TryFrom<u8> for StepNumber {
    type Error = InvalidStepNumber;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidStepNumber(value))
    }
}

impl From<StepNumber> for u8 {
    fn from(value: StepNumber) -> Self {
        value.0
    }
}

impl fmt::Display for StepNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("step number {0} is outside 1..=7")]
pub struct InvalidStepNumber(pub u8);

/// Lifecycle status of an application. Only `Draft -> Submitted` happens here;
/// the review outcomes are assigned by staff tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_editable(self) -> bool {
        matches!(self, ApplicationStatus::Draft)
    }
}

/// Persisted state of one wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_number: StepNumber,
    pub step_data: StepData,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// `None` until the applicant saves the step at least once.
    pub saved_at: Option<DateTime<Utc>>,
}

impl StepRecord {
    pub fn empty(step_number: StepNumber) -> Self {
        Self {
            step_number,
            step_data: StepData::empty(step_number),
            is_completed: false,
            completed_at: None,
            saved_at: None,
        }
    }

    pub fn has_saved_data(&self) -> bool {
        self.saved_at.is_some()
    }

    /// Flip the completion flag, keeping the original timestamp while the step stays complete.
    pub(crate) fn mark_completion(&mut self, completed: bool, now: DateTime<Utc>) {
        match (self.is_completed, completed) {
            (false, true) => self.completed_at = Some(now),
            (true, false) => self.completed_at = None,
            _ => {}
        }
        self.is_completed = completed;
    }
}

/// The application aggregate the wizard reads and mutates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub program_id: ProgramId,
    pub status: ApplicationStatus,
    pub current_step: StepNumber,
    pub steps: Vec<StepRecord>,
    pub progress_percentage: u8,
    pub can_submit: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn new_draft(
        id: ApplicationId,
        user_id: UserId,
        program_id: ProgramId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            program_id,
            status: ApplicationStatus::Draft,
            current_step: StepNumber::FIRST,
            steps: StepNumber::all().map(StepRecord::empty).collect(),
            progress_percentage: 0,
            can_submit: false,
            created_at: now,
            updated_at: now,
            submitted_at: None,
        }
    }

    pub fn step(&self, step: StepNumber) -> &StepRecord {
        &self.steps[step.index()]
    }

    pub(crate) fn step_mut(&mut self, step: StepNumber) -> &mut StepRecord {
        &mut self.steps[step.index()]
    }

    pub fn is_step_completed(&self, step: StepNumber) -> bool {
        self.step(step).is_completed
    }

    pub fn belongs_to(&self, user_id: &UserId, program_id: &ProgramId) -> bool {
        &self.user_id == user_id && &self.program_id == program_id
    }

    pub fn is_draft(&self) -> bool {
        self.status == ApplicationStatus::Draft
    }
}

/// Document slots. The closed set covers the personal documents step; `Other`
/// carries free-form slots used by ancillary document flows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
    Passport,
    Photo,
    Cv,
    FinancialProof,
    MedicalCertificate,
    Other(String),
}

impl DocumentType {
    /// Slots that must be filled before the personal documents step is complete.
    pub const REQUIRED: [DocumentType; 2] = [DocumentType::Passport, DocumentType::Photo];

    pub fn as_str(&self) -> &str {
        match self {
            DocumentType::Passport => "passport",
            DocumentType::Photo => "photo",
            DocumentType::Cv => "cv",
            DocumentType::FinancialProof => "financial_proof",
            DocumentType::MedicalCertificate => "medical_certificate",
            DocumentType::Other(name) => name,
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }
}

impl From<String> for DocumentType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "passport" => DocumentType::Passport,
            "photo" => DocumentType::Photo,
            "cv" => DocumentType::Cv,
            "financial_proof" | "financialproof" => DocumentType::FinancialProof,
            "medical_certificate" | "medicalcertificate" => DocumentType::MedicalCertificate,
            _ => DocumentType::Other(value),
        }
    }
}

impl From<&str> for DocumentType {
    fn from(value: &str) -> Self {
        DocumentType::from(value.to_string())
    }
}

impl From<DocumentType> for String {
    fn from(value: DocumentType) -> Self {
        match value {
            DocumentType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of an uploaded document. Transitions beyond `Pending` belong to reviewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::UnderReview => "under_review",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }
}

/// Metadata for a stored document occupying one slot of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub document_type: DocumentType,
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
    pub content_type: String,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
}
