use crate::infra::{InMemoryApplicationRepository, InMemoryProfileStore, LocalFileStorage};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use study_abroad::error::AppError;
use study_abroad::workflows::application::{
    compute_progress, AcademicInfo, AgentSelection, AgentSelectionType, AgentSummary,
    ApplicationId, ApplicationService, ApplicationServiceError, DocumentType, Locale,
    MotivationLetter, PersonalInfo, ProgramId, Reference, ReferenceKind, References, StepData,
    StepNumber, StepRegistry, UserId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct StepsArgs {
    /// Print French titles and descriptions
    #[arg(long)]
    pub(crate) french: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Program the sample student applies to
    #[arg(long, default_value = "lyon-msc-data-science")]
    pub(crate) program: String,
    /// Sample student's date of birth (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date_of_birth: Option<NaiveDate>,
    /// Directory receiving the sample documents (defaults to a temp directory)
    #[arg(long)]
    pub(crate) upload_dir: Option<PathBuf>,
    /// Stop before uploading documents to show the blocked submission
    #[arg(long)]
    pub(crate) skip_documents: bool,
    /// Print French step titles
    #[arg(long)]
    pub(crate) french: bool,
    /// Emit the final summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

type DemoService =
    ApplicationService<InMemoryApplicationRepository, InMemoryProfileStore, LocalFileStorage>;

#[derive(Debug, Serialize)]
struct DemoReport {
    application_id: ApplicationId,
    status: &'static str,
    progress_percentage: u8,
    completed_steps: u8,
    documents_stored: usize,
    submitted: bool,
}

fn locale(french: bool) -> Locale {
    if french {
        Locale::Fr
    } else {
        Locale::En
    }
}

pub(crate) fn run_step_catalogue(args: StepsArgs) {
    let locale = locale(args.french);
    let registry = StepRegistry::shared();
    for definition in registry.definitions() {
        println!(
            "{}. {}\n   {}",
            definition.step_number,
            definition.title.get(locale),
            definition.description.get(locale)
        );
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        program,
        date_of_birth,
        upload_dir,
        skip_documents,
        french,
        json,
    } = args;
    let locale = locale(french);

    let upload_dir =
        upload_dir.unwrap_or_else(|| std::env::temp_dir().join("study-abroad-demo-uploads"));
    let storage = LocalFileStorage::new(upload_dir.clone());
    storage.prepare()?;

    let profiles = Arc::new(InMemoryProfileStore::default());
    let service = ApplicationService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        profiles,
        Arc::new(storage),
    );

    let student = UserId("demo-student".to_string());
    let program = ProgramId(program);
    let date_of_birth = date_of_birth.or_else(|| NaiveDate::from_ymd_opt(2001, 4, 17));

    println!("Study-abroad application demo");
    let draft = service.resume_or_create(&student, &program)?;
    println!(
        "Draft {} for program {} (documents stored in {})",
        draft.id,
        program,
        upload_dir.display()
    );

    for (step, data) in sample_steps(date_of_birth) {
        let record = service.save_step(&draft.id, step, data)?;
        let application = service.get(&draft.id)?;
        println!(
            "  {:<28} saved | complete: {:<5} | progress {:>3}%",
            service
                .registry()
                .title_or_number(record.step_number, locale),
            record.is_completed,
            application.progress_percentage
        );
        service.advance(&draft.id)?;
    }

    let mut documents_stored = 0;
    if skip_documents {
        println!("  Documents skipped");
    } else {
        for (document_type, file_name, contents) in sample_documents() {
            let document =
                service.upload_document(&draft.id, document_type, file_name, &contents)?;
            documents_stored += 1;
            println!(
                "  Uploaded {} ({} bytes, {}) -> {}",
                document.document_type,
                document.file_size,
                document.content_type,
                document.file_path
            );
        }
        let rejected = service.upload_document(
            &draft.id,
            DocumentType::Cv,
            "cv.exe",
            b"MZ",
        );
        if let Err(err) = rejected {
            println!("  Rejected cv.exe: {err}");
        }
    }

    let submitted = match service.submit(&draft.id) {
        Ok(application) => {
            println!("Submitted at {:?}", application.submitted_at);
            true
        }
        Err(ApplicationServiceError::IncompleteApplication { missing }) => {
            let titles: Vec<_> = missing
                .iter()
                .map(|step| service.registry().title_or_number(*step, locale))
                .collect();
            println!("Submission blocked; incomplete: {}", titles.join(", "));
            false
        }
        Err(err) => return Err(err.into()),
    };

    let application = service.get(&draft.id)?;
    let progress = compute_progress(&application);
    let report = DemoReport {
        application_id: application.id.clone(),
        status: application.status.label(),
        progress_percentage: progress.percentage,
        completed_steps: progress.completed_steps,
        documents_stored,
        submitted,
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Summary unavailable: {err}"),
        }
    } else {
        print_summary(&service, &application.id, locale, &report)?;
    }
    Ok(())
}

fn print_summary(
    service: &DemoService,
    application_id: &ApplicationId,
    locale: Locale,
    report: &DemoReport,
) -> Result<(), AppError> {
    let application = service.get(application_id)?;
    let summary = application.summary(service.registry(), locale);
    println!(
        "\n{} | {} | {}% ({} of 6 steps) | {}",
        summary.application_id,
        summary.status,
        summary.progress_percentage,
        report.completed_steps,
        summary.progress_status.label()
    );
    for step in &summary.steps {
        let mark = if step.is_completed { "x" } else { " " };
        println!("  [{mark}] {}", step.title);
    }

    if let StepData::References(references) =
        &application.step(StepNumber::REFERENCES).step_data
    {
        for kind in [
            ReferenceKind::Academic,
            ReferenceKind::Professional,
            ReferenceKind::Personal,
        ] {
            let names: Vec<_> = references
                .of_kind(kind)
                .iter()
                .map(|reference| reference.name.as_str())
                .collect();
            if !names.is_empty() {
                println!("  {kind:?} references: {}", names.join(", "));
            }
        }
    }
    Ok(())
}

fn sample_steps(date_of_birth: Option<NaiveDate>) -> Vec<(u32, StepData)> {
    vec![
        (
            1,
            StepData::PersonalInfo(PersonalInfo {
                first_name: Some("Amina".to_string()),
                last_name: Some("Benali".to_string()),
                email: Some("amina.benali@example.org".to_string()),
                phone: Some("+213 555 010 203".to_string()),
                date_of_birth,
                nationality: Some("Algerian".to_string()),
                address: Some("12 Rue Didouche Mourad".to_string()),
                city: Some("Algiers".to_string()),
                country: Some("Algeria".to_string()),
                ..PersonalInfo::default()
            }),
        ),
        (
            2,
            StepData::AgentSelection(AgentSelection {
                selection_type: AgentSelectionType::Automatic,
                agent_code: None,
                selected_agent: Some(AgentSummary {
                    id: "agent-0001".to_string(),
                    name: "Portal Advisor".to_string(),
                }),
            }),
        ),
        (
            3,
            StepData::AcademicInfo(AcademicInfo {
                highest_education: Some("Bachelor".to_string()),
                current_institution: Some("USTHB".to_string()),
                graduation_year: Some(2023),
                field_of_study: Some("Computer Science".to_string()),
                gpa: Some(15.2),
            }),
        ),
        (
            5,
            StepData::MotivationLetter(MotivationLetter::new(
                "I want to join the program to work on applied machine learning for public health.",
            )),
        ),
        (
            6,
            StepData::References(References {
                academic: vec![Reference {
                    name: "Pr. Meziane".to_string(),
                    email: Some("meziane@example.org".to_string()),
                    relationship: Some("Thesis supervisor".to_string()),
                    ..Reference::default()
                }],
                professional: vec![Reference {
                    name: "Lounis Amrani".to_string(),
                    organization: Some("Sonatrach Digital".to_string()),
                    ..Reference::default()
                }],
                personal: Vec::new(),
            }),
        ),
    ]
}

fn sample_documents() -> Vec<(DocumentType, &'static str, Vec<u8>)> {
    let mut passport = b"%PDF-1.7\n".to_vec();
    passport.resize(256 * 1024, b' ');
    vec![
        (DocumentType::Passport, "passport.pdf", passport),
        (DocumentType::Photo, "photo.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0]),
    ]
}
