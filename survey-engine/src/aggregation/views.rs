//! Owner-scoped analytics views built on the aggregation pipeline

use super::{aggregate, AnsweredQuestion, DeliveryResponses, OptionInfo, QuestionInfo, RawResponse};
use crate::db::{analytics, deliveries, questions, surveys};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use survey_common::db::QuestionKind;
use survey_common::{Error, Result};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub campaign_name: String,
    pub channel_name: String,
    pub active: bool,
}

/// Structure and aggregated answers of one survey
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyDataset {
    pub survey: SurveyInfo,
    pub questions: Vec<QuestionInfo>,
    pub answers: Vec<AnsweredQuestion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetFilter {
    pub survey_id: Option<String>,
    pub delivery_id: Option<String>,
}

/// Datasets of every survey under one owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDataset {
    pub owner_id: String,
    pub surveys: Vec<SurveyDataset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub owner_id: String,
    pub total_surveys: i64,
    /// Responses to choice questions only
    pub total_responses: i64,
}

/// Load every survey of an owner with its structure and aggregated answers
///
/// Ids named in the filter must resolve under the owner, otherwise the call
/// fails with `Forbidden`.
pub async fn load_owner_dataset(
    pool: &SqlitePool,
    owner_id: &str,
    filter: &DatasetFilter,
) -> Result<Vec<SurveyDataset>> {
    let mut conn = pool.acquire().await?;

    let mut survey_id = filter.survey_id.clone();
    if let Some(id) = &survey_id {
        if surveys::find_survey_for_owner(&mut conn, owner_id, id).await?.is_none() {
            return Err(Error::Forbidden(format!("Survey {} not accessible", id)));
        }
    }
    if let Some(id) = &filter.delivery_id {
        let delivery = deliveries::find_delivery_for_owner(&mut conn, owner_id, id)
            .await?
            .ok_or_else(|| Error::Forbidden(format!("Delivery {} not accessible", id)))?;
        if let Some(sid) = &survey_id {
            if *sid != delivery.survey_id {
                return Err(Error::InvalidInput(format!(
                    "Delivery {} does not belong to survey {}",
                    id, sid
                )));
            }
        }
        survey_id = Some(delivery.survey_id);
    }

    let infos = analytics::list_owner_surveys(&mut conn, owner_id, survey_id.as_deref()).await?;

    let mut datasets = Vec::with_capacity(infos.len());
    for survey in infos {
        let stored = questions::load_questions_with_options(&mut conn, &survey.id).await?;

        let mut option_lookup: HashMap<String, OptionInfo> = HashMap::new();
        let question_infos: Vec<QuestionInfo> = stored
            .into_iter()
            .map(|sq| {
                let options = sq
                    .options
                    .into_iter()
                    .map(|o| {
                        let info = OptionInfo {
                            text: o.text,
                            value: o.value,
                        };
                        option_lookup.insert(o.id, info.clone());
                        info
                    })
                    .collect();
                QuestionInfo {
                    id: sq.question.id,
                    text: sq.question.text,
                    type_name: sq.type_name,
                    kind: sq.kind,
                    order: sq.question.order,
                    mandatory: sq.question.mandatory,
                    options,
                }
            })
            .collect();

        let rows = analytics::load_survey_responses(
            &mut conn,
            &survey.id,
            filter.delivery_id.as_deref(),
        )
        .await?;

        let answers = {
            let by_id: HashMap<&str, &QuestionInfo> =
                question_infos.iter().map(|q| (q.id.as_str(), q)).collect();

            let mut grouped: Vec<DeliveryResponses<'_>> = Vec::new();
            for row in rows {
                let Some(question) = by_id.get(row.question_id.as_str()).copied() else {
                    continue;
                };
                let response = RawResponse {
                    question,
                    selected: row
                        .option_id
                        .as_ref()
                        .and_then(|id| option_lookup.get(id))
                        .cloned(),
                    free_text: row.free_text,
                    received_at: row.received_at,
                };

                match grouped.last_mut() {
                    Some(current) if current.delivery_id == row.delivery_id => {
                        current.responses.push(response)
                    }
                    _ => grouped.push(DeliveryResponses {
                        delivery_id: row.delivery_id,
                        responses: vec![response],
                    }),
                }
            }

            aggregate(&grouped)
        };

        debug!(
            survey_id = %survey.id,
            questions = question_infos.len(),
            answers = answers.len(),
            "Loaded survey dataset"
        );

        datasets.push(SurveyDataset {
            survey,
            questions: question_infos,
            answers,
        });
    }

    Ok(datasets)
}

/// Drop free-text questions and answers
///
/// A survey left with neither questions nor answers is removed.
pub fn exclude_free_text(datasets: Vec<SurveyDataset>) -> Vec<SurveyDataset> {
    datasets
        .into_iter()
        .map(|mut dataset| {
            dataset.questions.retain(|q| q.kind != QuestionKind::FreeText);
            dataset.answers.retain(|a| a.kind != QuestionKind::FreeText);
            dataset
        })
        .filter(|dataset| !dataset.questions.is_empty() || !dataset.answers.is_empty())
        .collect()
}

/// Load the datasets of every owner, ordered by owner id
pub async fn load_all_datasets(pool: &SqlitePool) -> Result<Vec<OwnerDataset>> {
    let owners = {
        let mut conn = pool.acquire().await?;
        analytics::list_owners(&mut conn).await?
    };

    let mut all = Vec::with_capacity(owners.len());
    for owner_id in owners {
        let surveys = load_owner_dataset(pool, &owner_id, &DatasetFilter::default()).await?;
        all.push(OwnerDataset { owner_id, surveys });
    }

    debug!(owners = all.len(), "Loaded datasets of all owners");
    Ok(all)
}

/// Apply [`exclude_free_text`] per owner and drop owners left without surveys
pub fn prune_owner_datasets(owners: Vec<OwnerDataset>) -> Vec<OwnerDataset> {
    owners
        .into_iter()
        .map(|mut owner| {
            owner.surveys = exclude_free_text(owner.surveys);
            owner
        })
        .filter(|owner| !owner.surveys.is_empty())
        .collect()
}

/// Survey and response totals per owner
pub async fn owner_summaries(pool: &SqlitePool) -> Result<Vec<OwnerSummary>> {
    analytics::owner_summaries(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn question(id: &str, kind: QuestionKind) -> QuestionInfo {
        QuestionInfo {
            id: id.into(),
            text: id.into(),
            type_name: kind.as_str().into(),
            kind,
            order: 1,
            mandatory: false,
            options: Vec::new(),
        }
    }

    fn answer(question_id: &str, kind: QuestionKind) -> AnsweredQuestion {
        AnsweredQuestion {
            delivery_id: "d1".into(),
            question_id: question_id.into(),
            question_text: question_id.into(),
            type_name: kind.as_str().into(),
            kind,
            order: 1,
            mandatory: false,
            options: Vec::new(),
            display_value: None,
            selected_values: Vec::new(),
            free_text: None,
            received_at: Utc::now(),
        }
    }

    fn dataset(id: &str, questions: Vec<QuestionInfo>, answers: Vec<AnsweredQuestion>) -> SurveyDataset {
        SurveyDataset {
            survey: SurveyInfo {
                id: id.into(),
                name: id.into(),
                description: String::new(),
                campaign_name: "C".into(),
                channel_name: "Ocr".into(),
                active: true,
            },
            questions,
            answers,
        }
    }

    #[test]
    fn test_exclude_free_text_filters_structure_and_answers() {
        let datasets = vec![dataset(
            "s1",
            vec![
                question("q1", QuestionKind::MultiSelect),
                question("q2", QuestionKind::FreeText),
            ],
            vec![
                answer("q1", QuestionKind::MultiSelect),
                answer("q2", QuestionKind::FreeText),
            ],
        )];

        let filtered = exclude_free_text(datasets);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].questions.len(), 1);
        assert_eq!(filtered[0].questions[0].id, "q1");
        assert_eq!(filtered[0].answers.len(), 1);
        assert_eq!(filtered[0].answers[0].question_id, "q1");
    }

    #[test]
    fn test_exclude_free_text_prunes_empty_surveys() {
        let datasets = vec![
            dataset(
                "only-text",
                vec![question("q1", QuestionKind::FreeText)],
                vec![answer("q1", QuestionKind::FreeText)],
            ),
            dataset("choice", vec![question("q2", QuestionKind::SingleSelect)], Vec::new()),
        ];

        let filtered = exclude_free_text(datasets);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].survey.id, "choice");
    }

    #[test]
    fn test_prune_drops_owners_left_without_surveys() {
        let owners = vec![
            OwnerDataset {
                owner_id: "acme".into(),
                surveys: vec![dataset(
                    "choice",
                    vec![question("q1", QuestionKind::MultiSelect)],
                    Vec::new(),
                )],
            },
            OwnerDataset {
                owner_id: "notes".into(),
                surveys: vec![dataset(
                    "only-text",
                    vec![question("q2", QuestionKind::FreeText)],
                    vec![answer("q2", QuestionKind::FreeText)],
                )],
            },
            OwnerDataset {
                owner_id: "empty".into(),
                surveys: Vec::new(),
            },
        ];

        let pruned = prune_owner_datasets(owners);

        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].owner_id, "acme");
    }
}
