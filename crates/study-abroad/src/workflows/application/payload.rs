use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Document, DocumentType, StepNumber};

/// Typed payload of a wizard step, tagged by the step it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "data", rename_all = "snake_case")]
pub enum StepData {
    PersonalInfo(PersonalInfo),
    AgentSelection(AgentSelection),
    AcademicInfo(AcademicInfo),
    PersonalDocuments(PersonalDocuments),
    MotivationLetter(MotivationLetter),
    References(References),
    Review,
}

impl StepData {
    /// Default payload stored for a step before the applicant saves anything.
    pub fn empty(step: StepNumber) -> Self {
        match step.get() {
            1 => StepData::PersonalInfo(PersonalInfo::default()),
            2 => StepData::AgentSelection(AgentSelection::default()),
            3 => StepData::AcademicInfo(AcademicInfo::default()),
            4 => StepData::PersonalDocuments(PersonalDocuments::default()),
            5 => StepData::MotivationLetter(MotivationLetter::default()),
            6 => StepData::References(References::default()),
            _ => StepData::Review,
        }
    }

    pub fn step_number(&self) -> StepNumber {
        match self {
            StepData::PersonalInfo(_) => StepNumber::PERSONAL_INFO,
            StepData::AgentSelection(_) => StepNumber::AGENT_SELECTION,
            StepData::AcademicInfo(_) => StepNumber::ACADEMIC_INFO,
            StepData::PersonalDocuments(_) => StepNumber::PERSONAL_DOCUMENTS,
            StepData::MotivationLetter(_) => StepNumber::MOTIVATION_LETTER,
            StepData::References(_) => StepNumber::REFERENCES,
            StepData::Review => StepNumber::REVIEW,
        }
    }

    /// Recompute fields derived from user input before the payload is stored.
    pub(crate) fn normalized(self) -> Self {
        match self {
            StepData::MotivationLetter(letter) => {
                StepData::MotivationLetter(MotivationLetter::new(letter.content))
            }
            other => other,
        }
    }

    pub fn documents(&self) -> Option<&PersonalDocuments> {
        match self {
            StepData::PersonalDocuments(documents) => Some(documents),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub emergency_contact_name: Option<String>,
    #[serde(default)]
    pub emergency_contact_phone: Option<String>,
    #[serde(default)]
    pub emergency_contact_relationship: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentSelectionType {
    #[default]
    Automatic,
    ByCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSelection {
    #[serde(default)]
    pub selection_type: AgentSelectionType,
    #[serde(default)]
    pub agent_code: Option<String>,
    #[serde(default)]
    pub selected_agent: Option<AgentSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademicInfo {
    #[serde(default)]
    pub highest_education: Option<String>,
    #[serde(default)]
    pub current_institution: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<u16>,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub gpa: Option<f32>,
}

/// Uploaded documents keyed by slot; one document per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDocuments {
    #[serde(default)]
    pub documents: BTreeMap<DocumentType, Document>,
}

impl PersonalDocuments {
    pub fn get(&self, document_type: &DocumentType) -> Option<&Document> {
        self.documents.get(document_type)
    }

    /// Store `document` in its slot, returning the document it replaced.
    pub fn replace(&mut self, document: Document) -> Option<Document> {
        self.documents
            .insert(document.document_type.clone(), document)
    }

    pub fn remove(&mut self, document_type: &DocumentType) -> Option<Document> {
        self.documents.remove(document_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotivationLetter {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub word_count: u32,
}

impl MotivationLetter {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let word_count = content.split_whitespace().count() as u32;
        Self {
            content,
            word_count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Academic,
    Professional,
    Personal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct References {
    #[serde(default)]
    pub academic: Vec<Reference>,
    #[serde(default)]
    pub professional: Vec<Reference>,
    #[serde(default)]
    pub personal: Vec<Reference>,
}

impl References {
    pub fn total(&self) -> usize {
        self.academic.len() + self.professional.len() + self.personal.len()
    }

    pub fn of_kind(&self, kind: ReferenceKind) -> &[Reference] {
        match kind {
            ReferenceKind::Academic => &self.academic,
            ReferenceKind::Professional => &self.professional,
            ReferenceKind::Personal => &self.personal,
        }
    }
}
