//! Reconciliation of an incoming survey hierarchy against persisted state
//!
//! Campaigns and surveys are upserted by natural key. Questions are matched by
//! position and never deleted, so responses pointing at them stay valid.
//! Options are fully reconciled by value: the persisted set always converges
//! to the incoming set.

pub mod diff;

use crate::catalog::Catalog;
use crate::db::questions;
use crate::db::campaigns;
use crate::db::surveys::{self, SurveyFields};
use crate::payload::{CampaignPayload, OptionPayload, SurveyPayload};
use diff::diff_by_key;
use serde::Serialize;
use sqlx::SqliteConnection;
use survey_common::db::{Question, QuestionOption};
use survey_common::{ids, Error, Result};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignRef {
    pub id: String,
    pub name: String,
}

/// Per-survey write counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyCounts {
    pub id: String,
    pub name: String,
    pub created: bool,
    pub questions_created: usize,
    pub questions_updated: usize,
    pub options_created: usize,
    pub options_updated: usize,
    pub options_deleted: usize,
}

impl SurveyCounts {
    fn new(id: String, name: String, created: bool) -> Self {
        Self {
            id,
            name,
            created,
            questions_created: 0,
            questions_updated: 0,
            options_created: 0,
            options_updated: 0,
            options_deleted: 0,
        }
    }

    fn add_options(&mut self, options: OptionCounts) {
        self.options_created += options.created;
        self.options_updated += options.updated;
        self.options_deleted += options.deleted;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OptionCounts {
    created: usize,
    updated: usize,
    deleted: usize,
}

/// Result of reconciling one campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOutcome {
    pub campaign: CampaignRef,
    pub campaign_created: bool,
    pub surveys: Vec<SurveyCounts>,
}

/// Reconcile a campaign and everything under it for `owner_id`
pub async fn reconcile_unit(
    conn: &mut SqliteConnection,
    owner_id: &str,
    campaign: &CampaignPayload,
    catalog: &Catalog,
) -> Result<UnitOutcome> {
    let upserted = campaigns::upsert_campaign(conn, owner_id, &campaign.name).await?;
    debug!(
        owner_id = %owner_id,
        campaign_id = %upserted.id,
        created = upserted.created,
        "Resolved campaign"
    );

    let mut surveys = Vec::with_capacity(campaign.surveys.len());
    for survey in &campaign.surveys {
        surveys.push(reconcile_survey(conn, &upserted.id, survey, catalog).await?);
    }

    Ok(UnitOutcome {
        campaign: CampaignRef {
            id: upserted.id,
            name: campaign.name.clone(),
        },
        campaign_created: upserted.created,
        surveys,
    })
}

/// Reconcile one survey and its questions under `campaign_id`
pub async fn reconcile_survey(
    conn: &mut SqliteConnection,
    campaign_id: &str,
    survey: &SurveyPayload,
    catalog: &Catalog,
) -> Result<SurveyCounts> {
    let channel = catalog
        .channel(&survey.channel)
        .ok_or_else(|| Error::InvalidInput(format!("Unknown channel: {}", survey.channel)))?;

    let upserted = surveys::upsert_survey(
        conn,
        campaign_id,
        &SurveyFields {
            name: &survey.name,
            description: &survey.description,
            active: survey.active,
            channel_id: &channel.id,
        },
    )
    .await?;

    let mut counts = SurveyCounts::new(upserted.id.clone(), survey.name.clone(), upserted.created);

    // One fetch for the whole survey
    let existing = questions::load_questions_with_options(conn, &upserted.id).await?;
    let diff = diff_by_key(
        &existing,
        &survey.questions,
        |stored| stored.question.order,
        |incoming| incoming.order,
    );

    for incoming in diff.to_create {
        let question = Question {
            id: ids::generate(),
            text: incoming.text.clone(),
            mandatory: incoming.mandatory,
            order: incoming.order,
            survey_id: upserted.id.clone(),
            question_type_id: resolve_type_id(catalog, &incoming.type_name)?,
        };
        questions::insert_question(conn, &question).await?;
        counts.questions_created += 1;
        debug!(question_id = %question.id, order = question.order, "Created question");

        let options = reconcile_options(conn, &question.id, &[], incoming.options()).await?;
        counts.add_options(options);
    }

    for (stored, incoming) in diff.to_update {
        let type_id = resolve_type_id(catalog, &incoming.type_name)?;
        questions::update_question(
            conn,
            &stored.question.id,
            &incoming.text,
            incoming.mandatory,
            &type_id,
        )
        .await?;
        counts.questions_updated += 1;

        let options =
            reconcile_options(conn, &stored.question.id, &stored.options, incoming.options())
                .await?;
        counts.add_options(options);
    }

    debug!(
        survey_id = %counts.id,
        questions_created = counts.questions_created,
        questions_updated = counts.questions_updated,
        options_created = counts.options_created,
        options_updated = counts.options_updated,
        options_deleted = counts.options_deleted,
        "Reconciled survey"
    );

    Ok(counts)
}

async fn reconcile_options(
    conn: &mut SqliteConnection,
    question_id: &str,
    existing: &[QuestionOption],
    incoming: &[OptionPayload],
) -> Result<OptionCounts> {
    let diff = diff_by_key(
        existing,
        incoming,
        |stored| stored.value.as_str(),
        |option| option.value.as_str(),
    );
    let mut counts = OptionCounts::default();

    let stale: Vec<&str> = diff.to_delete.iter().map(|o| o.id.as_str()).collect();
    counts.deleted = questions::delete_options(conn, &stale).await? as usize;

    for (stored, option) in diff.to_update {
        if stored.text != option.text {
            questions::update_option_text(conn, &stored.id, &option.text).await?;
        }
        counts.updated += 1;
    }

    for option in diff.to_create {
        questions::insert_option(
            conn,
            &QuestionOption {
                id: ids::generate(),
                text: option.text.clone(),
                value: option.value.clone(),
                question_id: question_id.to_string(),
            },
        )
        .await?;
        counts.created += 1;
    }

    Ok(counts)
}

fn resolve_type_id(catalog: &Catalog, type_name: &str) -> Result<String> {
    catalog
        .question_type(type_name)
        .map(|t| t.id.clone())
        .ok_or_else(|| Error::InvalidInput(format!("Unknown question type: {}", type_name)))
}
