//! Database models
//!
//! Every entity carries an opaque string id. Ownership flows down from the
//! campaign (and recipient) `owner_id`; nested entities reach it through
//! their parent chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Answer shape of a question type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Several options may be selected
    MultiSelect,
    /// Exactly one option is selected
    SingleSelect,
    /// Literal text, no options
    FreeText,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultiSelect => "multi_select",
            QuestionKind::SingleSelect => "single_select",
            QuestionKind::FreeText => "free_text",
        }
    }

    /// Choice questions carry an option catalog
    pub fn is_choice(&self) -> bool {
        !matches!(self, QuestionKind::FreeText)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multi_select" => Ok(QuestionKind::MultiSelect),
            "single_select" => Ok(QuestionKind::SingleSelect),
            "free_text" => Ok(QuestionKind::FreeText),
            other => Err(crate::Error::Config(format!("Unknown question kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionType {
    pub id: String,
    pub name: String,
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    pub id: String,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub campaign_id: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub mandatory: bool,
    /// Position within the survey, starting at 1; stable identity of the question
    pub order: i64,
    pub survey_id: String,
    pub question_type_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    /// Unique within the owning question
    pub value: String,
    pub question_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: String,
    pub survey_id: String,
    pub recipient_id: String,
    pub sent_at: DateTime<Utc>,
    /// Write-once completion marker
    pub responded_at: Option<DateTime<Utc>>,
}

impl Delivery {
    pub fn is_completed(&self) -> bool {
        self.responded_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub delivery_id: String,
    pub question_id: String,
    pub option_id: Option<String>,
    pub free_text: Option<String>,
    pub received_at: DateTime<Utc>,
}
