use super::common::*;
use crate::workflows::application::domain::StepNumber;
use crate::workflows::application::payload::{AcademicInfo, PersonalInfo, References, StepData};
use crate::workflows::application::profile::{
    ProfileSync, ProfileUpdate, SyncOutcome, UserProfile,
};
use crate::workflows::application::ApplicationService;
use std::sync::Arc;

#[test]
fn only_profile_steps_produce_updates() {
    for (step, data) in complete_steps() {
        let update = ProfileUpdate::from_step(&data);
        assert_eq!(
            update.is_some(),
            matches!(step, 1 | 3 | 6),
            "step {step} profile mirroring"
        );
    }
    assert!(ProfileUpdate::from_step(&StepData::Review).is_none());
}

#[test]
fn merge_keeps_fields_absent_from_update() {
    let mut profile = UserProfile {
        personal: PersonalInfo {
            emergency_contact_name: Some("Nadia Benali".to_string()),
            ..personal_info()
        },
        ..UserProfile::default()
    };

    profile.apply(ProfileUpdate {
        personal: Some(PersonalInfo {
            city: Some("Oran".to_string()),
            phone: Some("   ".to_string()),
            ..PersonalInfo::default()
        }),
        ..ProfileUpdate::default()
    });

    assert_eq!(profile.personal.city.as_deref(), Some("Oran"));
    assert_eq!(profile.personal.first_name.as_deref(), Some("Amina"));
    assert_eq!(
        profile.personal.phone.as_deref(),
        Some("+213 555 010 203"),
        "blank strings do not overwrite"
    );
    assert_eq!(
        profile.personal.emergency_contact_name.as_deref(),
        Some("Nadia Benali")
    );
}

#[test]
fn reference_categories_replace_only_when_present() {
    let mut profile = UserProfile {
        references: References {
            academic: vec![reference("Meziane")],
            professional: vec![reference("Lounis")],
            personal: vec![reference("Amrani")],
        },
        ..UserProfile::default()
    };

    let update = ProfileUpdate::from_step(&StepData::References(References {
        academic: vec![reference("Haddad"), reference("Saidi")],
        ..References::default()
    }))
    .expect("references mirror into profile");
    profile.apply(update);

    let academic: Vec<_> = profile
        .references
        .academic
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(academic, ["Haddad", "Saidi"]);
    assert_eq!(profile.references.professional[0].name, "Lounis");
    assert_eq!(profile.references.personal[0].name, "Amrani");
}

#[test]
fn sync_reports_each_outcome() {
    let healthy = ProfileSync::new(Arc::new(MemoryProfiles::default()));
    assert_eq!(
        healthy.sync(&user(), &StepData::MotivationLetter(motivation_letter())),
        SyncOutcome::Skipped
    );
    assert_eq!(
        healthy.sync(&user(), &StepData::AcademicInfo(academic_info())),
        SyncOutcome::Synced
    );

    let broken = ProfileSync::new(Arc::new(BrokenProfiles));
    assert_eq!(
        broken.sync(&user(), &StepData::AcademicInfo(academic_info())),
        SyncOutcome::Failed
    );
}

#[test]
fn saved_personal_step_updates_profile() {
    let (service, _, profiles, _) = build_service();
    let application = service
        .resume_or_create(&user(), &program())
        .expect("draft created");

    service
        .save_step(&application.id, 1, StepData::PersonalInfo(personal_info()))
        .expect("step saved");
    service
        .save_step(&application.id, 2, StepData::AgentSelection(agent_selection()))
        .expect("step saved");

    let profile = profiles.profile(&user()).expect("profile created");
    assert_eq!(profile.personal, personal_info());
    assert_eq!(profiles.update_count(), 1, "agent selection is not mirrored");
}

#[test]
fn broken_profile_store_does_not_fail_step_save() {
    let service = ApplicationService::new(
        Arc::new(MemoryRepository::default()),
        Arc::new(BrokenProfiles),
        Arc::new(MemoryStorage::default()),
    );
    let application = service
        .resume_or_create(&user(), &program())
        .expect("draft created");

    let record = service
        .save_step(&application.id, 1, StepData::PersonalInfo(personal_info()))
        .expect("save succeeds despite profile outage");
    assert!(record.is_completed);
    assert!(record.completed_at.is_some());

    let stored = service.get(&application.id).expect("application");
    assert_eq!(stored.progress_percentage, 17);

    let view = service.load_step(&application.id, 3).expect("load step");
    assert!(!view.prefilled, "unreadable profile means no pre-fill");
}

#[test]
fn unsaved_steps_prefill_from_profile() {
    let (service, _, profiles, _) = build_service();
    profiles.seed(
        &user(),
        UserProfile {
            personal: personal_info(),
            academic: academic_info(),
            references: References::default(),
        },
    );
    let application = service
        .resume_or_create(&user(), &program())
        .expect("draft created");

    let view = service.load_step(&application.id, 3).expect("load step");
    assert!(view.prefilled);
    assert_eq!(view.record.step_data, StepData::AcademicInfo(academic_info()));
    assert!(!view.record.is_completed, "pre-fill is not a save");

    let references = service.load_step(&application.id, 6).expect("load step");
    assert!(!references.prefilled, "empty profile section is not pre-filled");

    let motivation = service.load_step(&application.id, 5).expect("load step");
    assert!(!motivation.prefilled);

    let stored = service.get(&application.id).expect("application");
    assert!(!stored.step(StepNumber::ACADEMIC_INFO).has_saved_data());
}

#[test]
fn saved_steps_are_not_overwritten_by_prefill() {
    let (service, _, profiles, _) = build_service();
    let application = service
        .resume_or_create(&user(), &program())
        .expect("draft created");

    let partial = AcademicInfo {
        highest_education: Some("Master".to_string()),
        ..AcademicInfo::default()
    };
    service
        .save_step(&application.id, 3, StepData::AcademicInfo(partial.clone()))
        .expect("partial save");
    profiles.seed(
        &user(),
        UserProfile {
            academic: academic_info(),
            ..UserProfile::default()
        },
    );

    let view = service.load_step(&application.id, 3).expect("load step");
    assert!(!view.prefilled);
    assert_eq!(view.record.step_data, StepData::AcademicInfo(partial));
}
