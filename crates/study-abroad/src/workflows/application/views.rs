use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Application, ApplicationId, ProgramId, StepNumber, StepRecord, UserId};
use super::progress::{compute_progress, ProgressStatus};
use super::registry::{Locale, StepDefinition, StepRegistry};

/// Sanitized representation of an application for the wizard UI.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub program_id: ProgramId,
    pub status: &'static str,
    pub current_step: StepNumber,
    pub progress_percentage: u8,
    pub progress_status: ProgressStatus,
    pub can_submit: bool,
    pub steps: Vec<StepSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepSummary {
    pub step_number: StepNumber,
    pub title: String,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn summary(&self, registry: &StepRegistry, locale: Locale) -> ApplicationSummary {
        let progress = compute_progress(self);
        ApplicationSummary {
            application_id: self.id.clone(),
            user_id: self.user_id.clone(),
            program_id: self.program_id.clone(),
            status: self.status.label(),
            current_step: self.current_step,
            progress_percentage: self.progress_percentage,
            progress_status: progress.status,
            can_submit: self.can_submit,
            steps: self
                .steps
                .iter()
                .map(|record| StepSummary {
                    step_number: record.step_number,
                    title: registry.title_or_number(record.step_number, locale),
                    is_completed: record.is_completed,
                    completed_at: record.completed_at,
                })
                .collect(),
            submitted_at: self.submitted_at,
        }
    }
}

/// A step as loaded into the wizard, possibly pre-filled from the profile.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub application_id: ApplicationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<StepDefinition>,
    pub record: StepRecord,
    pub prefilled: bool,
}
