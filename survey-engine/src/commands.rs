//! Typed hierarchy creation commands
//!
//! Each command builds part of a campaign → survey → question tree for one
//! owner. Writes go through the same natural-key upserts as bulk ingestion,
//! inside one transaction per command.

use crate::db::campaigns;
use crate::db::catalog::load_catalog;
use crate::payload::{OptionPayload, QuestionPayload, SurveyPayload};
use crate::reconcile::{reconcile_survey, CampaignRef, SurveyCounts};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use survey_common::{Error, Result};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum HierarchyCommand {
    CreateCampaign {
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    CreateSurvey {
        campaign_name: String,
        survey: SurveyDraft,
        #[serde(default)]
        questions: Vec<QuestionDraft>,
    },
    CreateAll {
        campaign: String,
        survey: SurveyDraft,
        #[serde(default)]
        questions: Vec<QuestionDraft>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub channel: String,
}

fn default_active() -> bool {
    true
}

/// A question without a position; order comes from its place in the list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub text: String,
    pub type_name: String,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub options: Vec<OptionPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub campaign: CampaignRef,
    pub campaign_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey: Option<SurveyCounts>,
}

impl SurveyDraft {
    fn into_payload(self, questions: Vec<QuestionDraft>) -> SurveyPayload {
        SurveyPayload {
            name: self.name,
            description: self.description,
            active: self.active,
            channel: self.channel,
            questions: questions
                .into_iter()
                .enumerate()
                .map(|(i, q)| QuestionPayload {
                    text: q.text,
                    order: i as i64 + 1,
                    type_name: q.type_name,
                    mandatory: q.mandatory,
                    options: Some(q.options),
                })
                .collect(),
        }
    }
}

/// Run one command for `owner_id`
pub async fn execute(
    pool: &SqlitePool,
    owner_id: &str,
    command: HierarchyCommand,
) -> Result<CommandOutcome> {
    let catalog = load_catalog(pool).await?;
    let mut tx = pool.begin().await?;

    let outcome = match command {
        HierarchyCommand::CreateCampaign { name } => {
            let upserted = campaigns::upsert_campaign(&mut *tx, owner_id, &name).await?;
            CommandOutcome {
                campaign: CampaignRef {
                    id: upserted.id,
                    name,
                },
                campaign_created: upserted.created,
                survey: None,
            }
        }
        HierarchyCommand::CreateSurvey {
            campaign_name,
            survey,
            questions,
        } => {
            let campaign = campaigns::find_campaign_by_name(&mut *tx, owner_id, &campaign_name)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Campaign {} not found", campaign_name)))?;
            let payload = survey.into_payload(questions);
            let counts = reconcile_survey(&mut *tx, &campaign.id, &payload, &catalog).await?;
            CommandOutcome {
                campaign: CampaignRef {
                    id: campaign.id,
                    name: campaign.name,
                },
                campaign_created: false,
                survey: Some(counts),
            }
        }
        HierarchyCommand::CreateAll {
            campaign,
            survey,
            questions,
        } => {
            let upserted = campaigns::upsert_campaign(&mut *tx, owner_id, &campaign).await?;
            let payload = survey.into_payload(questions);
            let counts = reconcile_survey(&mut *tx, &upserted.id, &payload, &catalog).await?;
            CommandOutcome {
                campaign: CampaignRef {
                    id: upserted.id,
                    name: campaign,
                },
                campaign_created: upserted.created,
                survey: Some(counts),
            }
        }
    };

    tx.commit().await?;

    info!(
        owner_id = %owner_id,
        campaign_id = %outcome.campaign.id,
        survey_id = outcome.survey.as_ref().map(|s| s.id.as_str()).unwrap_or("-"),
        "Hierarchy command applied"
    );

    Ok(outcome)
}
