use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{StepNumber, UserId};
use super::payload::{AcademicInfo, PersonalInfo, Reference, References, StepData};

/// Standing profile shared across every application of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub personal: PersonalInfo,
    #[serde(default)]
    pub academic: AcademicInfo,
    #[serde(default)]
    pub references: References,
}

impl UserProfile {
    /// Shallow merge: only fields carried by `update` are overwritten.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(personal) = update.personal {
            merge_personal(&mut self.personal, personal);
        }
        if let Some(academic) = update.academic {
            merge_academic(&mut self.academic, academic);
        }
        if let Some(references) = update.references {
            if let Some(academic) = references.academic {
                self.references.academic = academic;
            }
            if let Some(professional) = references.professional {
                self.references.professional = professional;
            }
            if let Some(personal) = references.personal {
                self.references.personal = personal;
            }
        }
    }
}

/// Partial profile write produced from a saved step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub personal: Option<PersonalInfo>,
    pub academic: Option<AcademicInfo>,
    pub references: Option<ReferencesUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencesUpdate {
    pub academic: Option<Vec<Reference>>,
    pub professional: Option<Vec<Reference>>,
    pub personal: Option<Vec<Reference>>,
}

impl ProfileUpdate {
    /// Profile fields mirrored by a step, or `None` for steps that do not touch the profile.
    pub fn from_step(data: &StepData) -> Option<Self> {
        match data {
            StepData::PersonalInfo(info) => Some(Self {
                personal: Some(info.clone()),
                ..Self::default()
            }),
            StepData::AcademicInfo(info) => Some(Self {
                academic: Some(info.clone()),
                ..Self::default()
            }),
            StepData::References(references) => Some(Self {
                references: Some(ReferencesUpdate {
                    academic: non_empty(&references.academic),
                    professional: non_empty(&references.professional),
                    personal: non_empty(&references.personal),
                }),
                ..Self::default()
            }),
            StepData::AgentSelection(_)
            | StepData::PersonalDocuments(_)
            | StepData::MotivationLetter(_)
            | StepData::Review => None,
        }
    }
}

fn non_empty(references: &[Reference]) -> Option<Vec<Reference>> {
    if references.is_empty() {
        None
    } else {
        Some(references.to_vec())
    }
}

fn overwrite_text(target: &mut Option<String>, source: Option<String>) {
    if let Some(value) = source {
        if !value.trim().is_empty() {
            *target = Some(value);
        }
    }
}

fn overwrite<T>(target: &mut Option<T>, source: Option<T>) {
    if source.is_some() {
        *target = source;
    }
}

fn merge_personal(target: &mut PersonalInfo, source: PersonalInfo) {
    overwrite_text(&mut target.first_name, source.first_name);
    overwrite_text(&mut target.last_name, source.last_name);
    overwrite_text(&mut target.email, source.email);
    overwrite_text(&mut target.phone, source.phone);
    overwrite(&mut target.date_of_birth, source.date_of_birth);
    overwrite_text(&mut target.nationality, source.nationality);
    overwrite_text(&mut target.address, source.address);
    overwrite_text(&mut target.city, source.city);
    overwrite_text(&mut target.country, source.country);
    overwrite_text(
        &mut target.emergency_contact_name,
        source.emergency_contact_name,
    );
    overwrite_text(
        &mut target.emergency_contact_phone,
        source.emergency_contact_phone,
    );
    overwrite_text(
        &mut target.emergency_contact_relationship,
        source.emergency_contact_relationship,
    );
}

fn merge_academic(target: &mut AcademicInfo, source: AcademicInfo) {
    overwrite_text(&mut target.highest_education, source.highest_education);
    overwrite_text(&mut target.current_institution, source.current_institution);
    overwrite(&mut target.graduation_year, source.graduation_year);
    overwrite_text(&mut target.field_of_study, source.field_of_study);
    overwrite(&mut target.gpa, source.gpa);
}

/// Storage collaborator for standing user profiles.
pub trait ProfileStore: Send + Sync {
    fn get(&self, user_id: &UserId) -> Result<Option<UserProfile>, ProfileStoreError>;
    fn update(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ProfileStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
    #[error("profile rejected update: {0}")]
    Rejected(String),
}

/// What happened to a profile sync attempt. Failures are reported here and in
/// the logs, never to the caller of a step save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Skipped,
    Synced,
    Failed,
}

/// Mediates between saved steps and the standing profile.
pub struct ProfileSync<P> {
    store: Arc<P>,
}

impl<P> ProfileSync<P>
where
    P: ProfileStore + 'static,
{
    pub fn new(store: Arc<P>) -> Self {
        Self { store }
    }

    pub fn sync(&self, user_id: &UserId, data: &StepData) -> SyncOutcome {
        let Some(update) = ProfileUpdate::from_step(data) else {
            return SyncOutcome::Skipped;
        };

        match self.store.update(user_id, update) {
            Ok(_) => {
                debug!(user = %user_id, step = %data.step_number(), "profile synced from step");
                SyncOutcome::Synced
            }
            Err(err) => {
                warn!(
                    user = %user_id,
                    step = %data.step_number(),
                    error = %err,
                    "profile sync failed; step save kept"
                );
                SyncOutcome::Failed
            }
        }
    }

    /// Step payload drawn from the profile, for steps the profile mirrors.
    pub fn prefill(&self, user_id: &UserId, step: StepNumber) -> Option<StepData> {
        if !matches!(
            step,
            StepNumber::PERSONAL_INFO | StepNumber::ACADEMIC_INFO | StepNumber::REFERENCES
        ) {
            return None;
        }

        let profile = match self.store.get(user_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => return None,
            Err(err) => {
                warn!(user = %user_id, %step, error = %err, "profile unavailable for pre-fill");
                return None;
            }
        };

        let data = match step {
            StepNumber::PERSONAL_INFO if profile.personal != PersonalInfo::default() => {
                StepData::PersonalInfo(profile.personal)
            }
            StepNumber::ACADEMIC_INFO if profile.academic != AcademicInfo::default() => {
                StepData::AcademicInfo(profile.academic)
            }
            StepNumber::REFERENCES if profile.references.total() > 0 => {
                StepData::References(profile.references)
            }
            _ => return None,
        };

        Some(data)
    }
}
