use serde::Serialize;

use super::domain::{Application, ApplicationStatus, StepNumber, StepRecord};

/// Steps that count toward progress. The review step is excluded because it
/// only mirrors the completion of the other six.
pub const COUNTED_STEPS: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    ReadyToSubmit,
    Submitted,
}

impl ProgressStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "Not Started",
            ProgressStatus::InProgress => "In Progress",
            ProgressStatus::ReadyToSubmit => "Ready to Submit",
            ProgressStatus::Submitted => "Submitted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub percentage: u8,
    pub completed_steps: u8,
    pub can_submit: bool,
    pub status: ProgressStatus,
}

pub fn compute_progress(application: &Application) -> ProgressSnapshot {
    let completed_steps = completed_input_steps(&application.steps);
    let can_submit = completed_steps == COUNTED_STEPS;

    let status = if application.status != ApplicationStatus::Draft {
        ProgressStatus::Submitted
    } else if can_submit {
        ProgressStatus::ReadyToSubmit
    } else if completed_steps == 0 && application.steps.iter().all(|step| !step.has_saved_data()) {
        ProgressStatus::NotStarted
    } else {
        ProgressStatus::InProgress
    };

    ProgressSnapshot {
        percentage: percentage(completed_steps),
        completed_steps,
        can_submit,
        status,
    }
}

/// `round(100 * completed / 6)` with halves rounding up.
pub fn percentage(completed_steps: u8) -> u8 {
    let completed = u32::from(completed_steps.min(COUNTED_STEPS));
    let total = u32::from(COUNTED_STEPS);
    ((100 * completed + total / 2) / total) as u8
}

fn completed_input_steps(steps: &[StepRecord]) -> u8 {
    steps
        .iter()
        .filter(|record| record.step_number != StepNumber::REVIEW && record.is_completed)
        .count() as u8
}

/// Write the derived fields back onto the aggregate.
pub(crate) fn refresh(application: &mut Application) -> ProgressSnapshot {
    let snapshot = compute_progress(application);
    application.progress_percentage = snapshot.percentage;
    application.can_submit = snapshot.can_submit;
    snapshot
}
