//! Wire shapes of a bulk ingestion submission

use serde::{Deserialize, Serialize};

/// One top-level item of a batch: a company and the campaign it submits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionUnit {
    pub company: Company,
    pub campaign: CampaignPayload,
}

impl IngestionUnit {
    /// The company id doubles as the owner of everything the unit creates
    pub fn owner_id(&self) -> &str {
        &self.company.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignPayload {
    pub name: String,
    #[serde(default)]
    pub surveys: Vec<SurveyPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub channel: String,
    #[serde(default)]
    pub questions: Vec<QuestionPayload>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    pub text: String,
    pub order: i64,
    pub type_name: String,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionPayload>>,
}

impl QuestionPayload {
    pub fn options(&self) -> &[OptionPayload] {
        self.options.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPayload {
    pub text: String,
    pub value: String,
}
