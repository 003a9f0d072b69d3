//! Response aggregation
//!
//! Collapses raw response rows into one answer per (delivery, question).
//! Rows are grouped by `(delivery_id, order, question_id)`, selected options
//! are deduplicated by value and a single display value is derived from the
//! question kind.

pub mod views;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use survey_common::db::QuestionKind;

/// Separator between option texts of a multi-select answer
pub const MULTI_SELECT_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionInfo {
    pub text: String,
    pub value: String,
}

/// Question structure as shown to analytics consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInfo {
    pub id: String,
    pub text: String,
    pub type_name: String,
    pub kind: QuestionKind,
    pub order: i64,
    pub mandatory: bool,
    pub options: Vec<OptionInfo>,
}

/// One stored response row joined with its question and selected option
#[derive(Debug, Clone)]
pub struct RawResponse<'a> {
    pub question: &'a QuestionInfo,
    pub selected: Option<OptionInfo>,
    pub free_text: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DeliveryResponses<'a> {
    pub delivery_id: String,
    pub responses: Vec<RawResponse<'a>>,
}

/// Aggregated answer for one (delivery, question)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub delivery_id: String,
    pub question_id: String,
    pub question_text: String,
    pub type_name: String,
    pub kind: QuestionKind,
    pub order: i64,
    pub mandatory: bool,
    /// Option catalog of the question
    pub options: Vec<OptionInfo>,
    /// Joined option texts, the single option text, or the free text
    pub display_value: Option<String>,
    pub selected_values: Vec<String>,
    pub free_text: Option<String>,
    /// Latest receipt time in the group
    pub received_at: DateTime<Utc>,
}

struct Group<'a> {
    delivery_id: &'a str,
    question: &'a QuestionInfo,
    selected: Vec<&'a OptionInfo>,
    seen_values: HashSet<&'a str>,
    free_text: Option<&'a str>,
    received_at: DateTime<Utc>,
}

impl Group<'_> {
    fn into_answer(self) -> AnsweredQuestion {
        let display_value = match self.question.kind {
            QuestionKind::MultiSelect if !self.selected.is_empty() => Some(
                self.selected
                    .iter()
                    .map(|o| o.text.as_str())
                    .collect::<Vec<_>>()
                    .join(MULTI_SELECT_SEPARATOR),
            ),
            QuestionKind::SingleSelect => self.selected.first().map(|o| o.text.clone()),
            QuestionKind::FreeText => self.free_text.map(str::to_string),
            QuestionKind::MultiSelect => None,
        };

        AnsweredQuestion {
            delivery_id: self.delivery_id.to_string(),
            question_id: self.question.id.clone(),
            question_text: self.question.text.clone(),
            type_name: self.question.type_name.clone(),
            kind: self.question.kind,
            order: self.question.order,
            mandatory: self.question.mandatory,
            options: self.question.options.clone(),
            display_value,
            selected_values: self.selected.iter().map(|o| o.value.clone()).collect(),
            free_text: self.free_text.map(str::to_string),
            received_at: self.received_at,
        }
    }
}

/// Aggregate raw responses; output follows first-seen group order
pub fn aggregate(deliveries: &[DeliveryResponses<'_>]) -> Vec<AnsweredQuestion> {
    let mut index: HashMap<(&str, i64, &str), usize> = HashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();

    for delivery in deliveries {
        for response in &delivery.responses {
            let question = response.question;
            let key = (delivery.delivery_id.as_str(), question.order, question.id.as_str());

            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(Group {
                    delivery_id: &delivery.delivery_id,
                    question,
                    selected: Vec::new(),
                    seen_values: HashSet::new(),
                    free_text: None,
                    received_at: response.received_at,
                });
                groups.len() - 1
            });
            let group = &mut groups[slot];

            if let Some(option) = &response.selected {
                if group.seen_values.insert(option.value.as_str()) {
                    group.selected.push(option);
                }
            }
            if let Some(text) = response.free_text.as_deref().filter(|t| !t.is_empty()) {
                group.free_text = Some(text);
            }
            if response.received_at > group.received_at {
                group.received_at = response.received_at;
            }
        }
    }

    groups.into_iter().map(Group::into_answer).collect()
}
