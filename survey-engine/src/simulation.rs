//! Synthetic deliveries and answers
//!
//! Generated data goes through the same persistence paths as real
//! submissions: recipients are upserted by email, deliveries are created with
//! owner checks and answers are stored with `submit_answers`.

use crate::answers::{create_delivery, submit_answers, AnswerInput};
use crate::db::questions::{self, StoredQuestion};
use crate::db::recipients::{self, Contact};
use crate::db::surveys;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashSet;
use survey_common::db::QuestionKind;
use survey_common::{Error, Result};
use tracing::{info, warn};

/// Upper bound on recipients generated per survey in one call
pub const MAX_RECIPIENTS_PER_SURVEY: usize = 500;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elena", "Fabián", "Gloria", "Hugo", "Inés", "Javier",
];
const LAST_NAMES: &[&str] = &[
    "Rojas", "Vargas", "Soto", "Muñoz", "Castro", "Silva", "Reyes", "Flores", "Torres", "Díaz",
];

/// Source of answers for free-text questions
pub trait FreeTextSource: Send + Sync {
    fn answer(&self, question_text: &str, rng: &mut dyn RngCore) -> String;
}

/// Short templated answers
#[derive(Debug, Clone, Default)]
pub struct TemplateText;

const TEMPLATES: &[&str] = &[
    "Todo bien, sin comentarios.",
    "El servicio fue rápido y claro.",
    "Podría mejorar la comunicación.",
    "Muy satisfecho con la atención.",
    "Hubo demoras en la entrega.",
    "Recomendaría el producto.",
];

impl FreeTextSource for TemplateText {
    fn answer(&self, _question_text: &str, rng: &mut dyn RngCore) -> String {
        TEMPLATES
            .choose(rng)
            .map(|t| t.to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub survey_id: String,
    pub deliveries_created: usize,
    pub responses_created: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub survey_id: String,
    pub recipients: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutcome {
    pub survey_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SimulationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationBatchReport {
    pub processed_count: usize,
    pub results: Vec<SimulationOutcome>,
}

/// Build a generator, seeded for reproducible runs
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generate `count` recipients for a survey and answer it once per recipient
pub async fn simulate_survey(
    pool: &SqlitePool,
    owner_id: &str,
    survey_id: &str,
    count: usize,
    rng: &mut StdRng,
    text_source: &dyn FreeTextSource,
) -> Result<SimulationReport> {
    if count == 0 || count > MAX_RECIPIENTS_PER_SURVEY {
        return Err(Error::InvalidInput(format!(
            "Recipient count must be between 1 and {}",
            MAX_RECIPIENTS_PER_SURVEY
        )));
    }

    let mut conn = pool.acquire().await?;
    if surveys::find_survey_for_owner(&mut conn, owner_id, survey_id)
        .await?
        .is_none()
    {
        return Err(Error::Forbidden(format!("Survey {} not accessible", survey_id)));
    }
    let structure = questions::load_questions_with_options(&mut conn, survey_id).await?;
    if structure.is_empty() {
        return Err(Error::InvalidInput(format!("Survey {} has no questions", survey_id)));
    }
    let (mut phones, mut emails) = recipients::taken_contacts(&mut conn, owner_id).await?;
    drop(conn);

    let mut report = SimulationReport {
        survey_id: survey_id.to_string(),
        deliveries_created: 0,
        responses_created: 0,
    };

    for _ in 0..count {
        let contact = synthesize_contact(rng, &mut phones, &mut emails);

        let mut conn = pool.acquire().await?;
        let recipient = recipients::upsert_recipient_by_email(&mut conn, owner_id, &contact).await?;
        drop(conn);

        let delivery = create_delivery(pool, owner_id, survey_id, &recipient.id).await?;
        report.deliveries_created += 1;

        let answers = synthesize_answers(&structure, rng, text_source);
        if answers.is_empty() {
            continue;
        }
        let receipt = submit_answers(pool, owner_id, &delivery.id, &answers).await?;
        report.responses_created += receipt.responses_created;
    }

    info!(
        survey_id = %survey_id,
        deliveries = report.deliveries_created,
        responses = report.responses_created,
        "Simulation complete"
    );

    Ok(report)
}

/// Run several simulations; a failing survey does not stop the others
pub async fn simulate_batch(
    pool: &SqlitePool,
    owner_id: &str,
    requests: &[SimulationRequest],
    rng: &mut StdRng,
    text_source: &dyn FreeTextSource,
) -> SimulationBatchReport {
    let mut results = Vec::with_capacity(requests.len());

    for request in requests {
        let outcome = match simulate_survey(
            pool,
            owner_id,
            &request.survey_id,
            request.recipients,
            rng,
            text_source,
        )
        .await
        {
            Ok(report) => SimulationOutcome {
                survey_id: request.survey_id.clone(),
                status: "success",
                report: Some(report),
                error: None,
            },
            Err(e) => {
                warn!(survey_id = %request.survey_id, "Simulation failed: {}", e);
                SimulationOutcome {
                    survey_id: request.survey_id.clone(),
                    status: "failed",
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(outcome);
    }

    SimulationBatchReport {
        processed_count: requests.len(),
        results,
    }
}

/// A contact whose phone and email are not in the taken sets; both sets are
/// updated with the new values
fn synthesize_contact<R: Rng + ?Sized>(
    rng: &mut R,
    phones: &mut HashSet<String>,
    emails: &mut HashSet<String>,
) -> Contact {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ana");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Rojas");

    let phone = loop {
        let candidate = format!("+569{:08}", rng.gen_range(0..100_000_000u32));
        if phones.insert(candidate.clone()) {
            break candidate;
        }
    };

    let email = loop {
        let candidate = format!(
            "{}.{}.{:06}@example.com",
            ascii_slug(first),
            ascii_slug(last),
            rng.gen_range(0..1_000_000u32)
        );
        if emails.insert(candidate.clone()) {
            break candidate;
        }
    };

    Contact {
        name: format!("{} {}", first, last),
        phone,
        email,
    }
}

fn ascii_slug(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// One answer per question according to its kind
///
/// Multi-select picks 1 or 2 distinct options, single-select picks one.
/// Choice questions without options are skipped.
fn synthesize_answers(
    structure: &[StoredQuestion],
    rng: &mut StdRng,
    text_source: &dyn FreeTextSource,
) -> Vec<AnswerInput> {
    let mut answers = Vec::new();

    for stored in structure {
        let question_id = stored.question.id.as_str();
        match stored.kind {
            QuestionKind::MultiSelect => {
                let upper = stored.options.len().min(2);
                if upper == 0 {
                    continue;
                }
                let picks = rng.gen_range(1..=upper);
                for option in stored.options.choose_multiple(rng, picks) {
                    answers.push(AnswerInput::option(question_id, &option.id));
                }
            }
            QuestionKind::SingleSelect => {
                if let Some(option) = stored.options.choose(rng) {
                    answers.push(AnswerInput::option(question_id, &option.id));
                }
            }
            QuestionKind::FreeText => {
                let text = text_source.answer(&stored.question.text, rng);
                answers.push(AnswerInput::text(question_id, &text));
            }
        }
    }

    answers
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_common::db::{Question, QuestionOption};

    fn stored(id: &str, kind: QuestionKind, option_count: usize) -> StoredQuestion {
        StoredQuestion {
            question: Question {
                id: id.into(),
                text: format!("Question {}", id),
                mandatory: true,
                order: 1,
                survey_id: "s1".into(),
                question_type_id: "t".into(),
            },
            type_name: kind.as_str().into(),
            kind,
            options: (0..option_count)
                .map(|i| QuestionOption {
                    id: format!("{}-o{}", id, i),
                    text: format!("Option {}", i),
                    value: format!("v{}", i),
                    question_id: id.into(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_contacts_never_collide() {
        let mut rng = rng_from_seed(Some(7));
        let mut phones = HashSet::new();
        let mut emails = HashSet::new();

        for _ in 0..200 {
            synthesize_contact(&mut rng, &mut phones, &mut emails);
        }

        assert_eq!(phones.len(), 200);
        assert_eq!(emails.len(), 200);
    }

    #[test]
    fn test_contacts_skip_taken_values() {
        let mut rng = rng_from_seed(Some(1));
        let mut phones = HashSet::new();
        let mut emails = HashSet::new();
        let first = synthesize_contact(&mut rng, &mut phones, &mut emails);

        // Same seed replays the same candidates, which are now taken
        let mut replay = rng_from_seed(Some(1));
        let second = synthesize_contact(&mut replay, &mut phones, &mut emails);

        assert_ne!(first.phone, second.phone);
        assert_ne!(first.email, second.email);
        assert!(second.email.ends_with("@example.com"));
        assert!(second.email.is_ascii());
    }

    #[test]
    fn test_answers_follow_question_kind() {
        let structure = vec![
            stored("multi", QuestionKind::MultiSelect, 3),
            stored("single", QuestionKind::SingleSelect, 3),
            stored("text", QuestionKind::FreeText, 0),
        ];
        let mut rng = rng_from_seed(Some(42));

        for _ in 0..50 {
            let answers = synthesize_answers(&structure, &mut rng, &TemplateText);

            let multi: Vec<_> = answers.iter().filter(|a| a.question_id == "multi").collect();
            assert!((1..=2).contains(&multi.len()));
            let distinct: HashSet<_> = multi.iter().map(|a| a.option_id.clone()).collect();
            assert_eq!(distinct.len(), multi.len());

            let single: Vec<_> = answers.iter().filter(|a| a.question_id == "single").collect();
            assert_eq!(single.len(), 1);
            assert!(single[0].option_id.as_deref().unwrap().starts_with("single-o"));

            let text: Vec<_> = answers.iter().filter(|a| a.question_id == "text").collect();
            assert_eq!(text.len(), 1);
            assert!(text[0].option_id.is_none());
            assert!(!text[0].free_text.as_deref().unwrap().is_empty());
        }
    }

    #[test]
    fn test_choice_question_without_options_is_skipped() {
        let structure = vec![stored("empty", QuestionKind::SingleSelect, 0)];
        let mut rng = rng_from_seed(Some(3));

        assert!(synthesize_answers(&structure, &mut rng, &TemplateText).is_empty());
    }

    #[test]
    fn test_ascii_slug() {
        assert_eq!(ascii_slug("Muñoz"), "munoz");
        assert_eq!(ascii_slug("Fabián"), "fabian");
    }
}
