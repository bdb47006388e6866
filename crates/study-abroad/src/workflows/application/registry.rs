use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::domain::StepNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    En,
    Fr,
}

/// Text shipped in both portal languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalizedText {
    pub en: &'static str,
    pub fr: &'static str,
}

impl LocalizedText {
    pub const fn get(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.en,
            Locale::Fr => self.fr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDefinition {
    pub step_number: StepNumber,
    pub title: LocalizedText,
    pub description: LocalizedText,
}

/// Read-only catalogue of the wizard steps.
#[derive(Debug)]
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
}

impl StepRegistry {
    pub fn standard() -> Self {
        Self {
            steps: standard_step_definitions(),
        }
    }

    /// Process-wide registry, built on first use.
    pub fn shared() -> &'static StepRegistry {
        static REGISTRY: OnceLock<StepRegistry> = OnceLock::new();
        REGISTRY.get_or_init(StepRegistry::standard)
    }

    pub fn get(&self, step: StepNumber) -> Option<&StepDefinition> {
        self.steps
            .iter()
            .find(|definition| definition.step_number == step)
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Title for display, falling back to the bare step number when the definition is missing.
    pub fn title_or_number(&self, step: StepNumber, locale: Locale) -> String {
        match self.get(step) {
            Some(definition) => definition.title.get(locale).to_string(),
            None => match locale {
                Locale::En => format!("Step {step}"),
                Locale::Fr => format!("Étape {step}"),
            },
        }
    }
}

fn standard_step_definitions() -> Vec<StepDefinition> {
    vec![
        StepDefinition {
            step_number: StepNumber::PERSONAL_INFO,
            title: LocalizedText {
                en: "Personal Information",
                fr: "Informations personnelles",
            },
            description: LocalizedText {
                en: "Identity, contact details and an optional emergency contact.",
                fr: "Identité, coordonnées et contact d'urgence facultatif.",
            },
        },
        StepDefinition {
            step_number: StepNumber::AGENT_SELECTION,
            title: LocalizedText {
                en: "Agent Selection",
                fr: "Choix de l'agent",
            },
            description: LocalizedText {
                en: "Let the portal assign an advisor or enter the code of the agent you work with.",
                fr: "Laissez le portail attribuer un conseiller ou saisissez le code de votre agent.",
            },
        },
        StepDefinition {
            step_number: StepNumber::ACADEMIC_INFO,
            title: LocalizedText {
                en: "Academic Background",
                fr: "Parcours académique",
            },
            description: LocalizedText {
                en: "Highest degree, current institution and graduation year.",
                fr: "Diplôme le plus élevé, établissement actuel et année d'obtention.",
            },
        },
        StepDefinition {
            step_number: StepNumber::PERSONAL_DOCUMENTS,
            title: LocalizedText {
                en: "Personal Documents",
                fr: "Documents personnels",
            },
            description: LocalizedText {
                en: "Passport and photo are required; CV, financial proof and medical certificate are optional.",
                fr: "Passeport et photo obligatoires ; CV, justificatif financier et certificat médical facultatifs.",
            },
        },
        StepDefinition {
            step_number: StepNumber::MOTIVATION_LETTER,
            title: LocalizedText {
                en: "Motivation Letter",
                fr: "Lettre de motivation",
            },
            description: LocalizedText {
                en: "Explain why this program fits your goals.",
                fr: "Expliquez pourquoi ce programme correspond à vos objectifs.",
            },
        },
        StepDefinition {
            step_number: StepNumber::REFERENCES,
            title: LocalizedText {
                en: "References",
                fr: "Références",
            },
            description: LocalizedText {
                en: "At least two academic, professional or personal references.",
                fr: "Au moins deux références académiques, professionnelles ou personnelles.",
            },
        },
        StepDefinition {
            step_number: StepNumber::REVIEW,
            title: LocalizedText {
                en: "Review & Submission",
                fr: "Vérification et envoi",
            },
            description: LocalizedText {
                en: "Check every section, then submit the application.",
                fr: "Vérifiez chaque section puis envoyez la candidature.",
            },
        },
    ]
}
