//! Bulk ingestion
//!
//! Units are processed strictly in submission order. Each unit is validated,
//! then reconciled; a failing unit is reported and never affects the others.

use crate::catalog::Catalog;
use crate::config::{IngestionPolicy, UnitWriteMode};
use crate::db::catalog::load_catalog;
use crate::payload::IngestionUnit;
use crate::reconcile::{reconcile_unit, CampaignRef, SurveyCounts, UnitOutcome};
use crate::validator::{validate_unit, ValidationError};
use serde::Serialize;
use sqlx::SqlitePool;
use survey_common::{Error, Result};
use thiserror::Error;
use tracing::{error, info, warn};

/// Why a unit failed
#[derive(Debug, Error)]
pub enum UnitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitReport {
    pub unit_id: String,
    pub unit_name: String,
    pub status: UnitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<CampaignRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surveys: Option<Vec<SurveyCounts>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when none of the unit's writes persist. False only in immediate
    /// mode after a store failure, where writes committed before the failing
    /// statement may remain; it does not assert that any did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolled_back: Option<bool>,
}

impl UnitReport {
    fn success(unit: &IngestionUnit, outcome: UnitOutcome) -> Self {
        Self {
            unit_id: unit.company.id.clone(),
            unit_name: unit.company.name.clone(),
            status: UnitStatus::Success,
            campaign: Some(outcome.campaign),
            surveys: Some(outcome.surveys),
            error: None,
            rolled_back: None,
        }
    }

    fn failure(unit: &IngestionUnit, err: &UnitError, rolled_back: bool) -> Self {
        Self {
            unit_id: unit.company.id.clone(),
            unit_name: unit.company.name.clone(),
            status: UnitStatus::Failed,
            campaign: None,
            surveys: None,
            error: Some(err.to_string()),
            rolled_back: Some(rolled_back),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub ok: bool,
    /// Units attempted, successful or not
    pub processed_count: usize,
    pub detail: Vec<UnitReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.detail
            .iter()
            .filter(|d| d.status == UnitStatus::Success)
            .count()
    }
}

/// Ingest a batch of units
///
/// Only a systemic failure (reference data missing, database unreachable
/// before the first unit) returns `Err`; per-unit failures land in the report.
pub async fn ingest(
    pool: &SqlitePool,
    policy: &IngestionPolicy,
    units: &[IngestionUnit],
) -> Result<BatchReport> {
    policy.check()?;
    let catalog = load_catalog(pool).await?;

    if catalog.channel(&policy.channel).is_none() {
        return Err(Error::Config(format!(
            "Channel \"{}\" does not exist in the database",
            policy.channel
        )));
    }
    if !catalog.has_question_types() {
        return Err(Error::Config("Question type catalog is empty".to_string()));
    }

    info!(units = units.len(), mode = ?policy.unit_write_mode, "Starting ingestion batch");

    let mut detail = Vec::with_capacity(units.len());
    for unit in units {
        let report = match process_unit(pool, policy, &catalog, unit).await {
            Ok(outcome) => {
                info!(
                    unit = %unit.company.id,
                    campaign_id = %outcome.campaign.id,
                    surveys = outcome.surveys.len(),
                    "Unit ingested"
                );
                UnitReport::success(unit, outcome)
            }
            Err(err) => {
                let rolled_back = match &err {
                    UnitError::Validation(_) => true,
                    UnitError::Store(_) => policy.unit_write_mode == UnitWriteMode::Transactional,
                };
                match &err {
                    UnitError::Validation(_) => warn!(unit = %unit.company.id, "Unit rejected: {}", err),
                    UnitError::Store(_) => error!(
                        unit = %unit.company.id,
                        rolled_back,
                        "Unit failed: {}",
                        err
                    ),
                }
                UnitReport::failure(unit, &err, rolled_back)
            }
        };
        detail.push(report);
    }

    let report = BatchReport {
        ok: true,
        processed_count: units.len(),
        detail,
    };
    info!(
        processed = report.processed_count,
        succeeded = report.succeeded(),
        "Ingestion batch complete"
    );

    Ok(report)
}

async fn process_unit(
    pool: &SqlitePool,
    policy: &IngestionPolicy,
    catalog: &Catalog,
    unit: &IngestionUnit,
) -> std::result::Result<UnitOutcome, UnitError> {
    validate_unit(unit, policy, catalog)?;

    let outcome = match policy.unit_write_mode {
        UnitWriteMode::Transactional => {
            let mut tx = pool.begin().await.map_err(Error::from)?;
            let outcome = reconcile_unit(&mut *tx, unit.owner_id(), &unit.campaign, catalog).await?;
            tx.commit().await.map_err(Error::from)?;
            outcome
        }
        UnitWriteMode::Immediate => {
            let mut conn = pool.acquire().await.map_err(Error::from)?;
            reconcile_unit(&mut *conn, unit.owner_id(), &unit.campaign, catalog).await?
        }
    };

    Ok(outcome)
}
