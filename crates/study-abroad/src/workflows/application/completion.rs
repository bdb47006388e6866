//! Per-step completeness rules. These gate submission, so every rule is exact.

use super::domain::{DocumentType, StepNumber, StepRecord};
use super::payload::{
    AcademicInfo, AgentSelection, MotivationLetter, PersonalDocuments, PersonalInfo, References,
    StepData,
};

/// References needed across all three categories.
pub const MINIMUM_REFERENCES: usize = 2;

/// Whether an input step's payload is complete. The review step has no data of
/// its own and always answers `false` here; use [`review_complete`] instead.
pub fn is_complete(data: &StepData) -> bool {
    match data {
        StepData::PersonalInfo(info) => personal_info_complete(info),
        StepData::AgentSelection(selection) => agent_selection_complete(selection),
        StepData::AcademicInfo(info) => academic_info_complete(info),
        StepData::PersonalDocuments(documents) => documents_complete(documents),
        StepData::MotivationLetter(letter) => motivation_letter_complete(letter),
        StepData::References(references) => references_complete(references),
        StepData::Review => false,
    }
}

/// The review step is a checkpoint over steps 1 to 6.
pub fn review_complete(steps: &[StepRecord]) -> bool {
    StepNumber::input_steps().all(|step| {
        steps
            .iter()
            .find(|record| record.step_number == step)
            .map(|record| record.is_completed)
            .unwrap_or(false)
    })
}

fn filled(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|text| !text.trim().is_empty())
        .unwrap_or(false)
}

fn personal_info_complete(info: &PersonalInfo) -> bool {
    [
        &info.first_name,
        &info.last_name,
        &info.email,
        &info.phone,
        &info.nationality,
        &info.address,
        &info.city,
        &info.country,
    ]
    .into_iter()
    .all(filled)
        && info.date_of_birth.is_some()
}

fn agent_selection_complete(selection: &AgentSelection) -> bool {
    selection.selected_agent.is_some()
}

fn academic_info_complete(info: &AcademicInfo) -> bool {
    filled(&info.highest_education)
        && filled(&info.current_institution)
        && info.graduation_year.is_some()
}

fn documents_complete(documents: &PersonalDocuments) -> bool {
    DocumentType::REQUIRED
        .iter()
        .all(|required| documents.get(required).is_some())
}

fn motivation_letter_complete(letter: &MotivationLetter) -> bool {
    !letter.content.trim().is_empty()
}

fn references_complete(references: &References) -> bool {
    references.total() >= MINIMUM_REFERENCES
}
