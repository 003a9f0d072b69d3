//! Business rule validation for ingestion units
//!
//! Validation is pure: it reads the unit, the policy and the catalog and never
//! touches the database, so a rejected unit produces no writes.

use crate::catalog::Catalog;
use crate::config::IngestionPolicy;
use crate::payload::{IngestionUnit, SurveyPayload};
use std::collections::HashSet;
use thiserror::Error;

/// A business rule violation, naming the unit, survey and position involved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unit {unit}: campaign must have exactly {expected} surveys, found {found}")]
    SurveyCount {
        unit: String,
        expected: usize,
        found: usize,
    },

    #[error("unit {unit}, survey \"{survey}\": must have exactly {expected} questions, found {found}")]
    QuestionCount {
        unit: String,
        survey: String,
        expected: usize,
        found: usize,
    },

    #[error("unit {unit}, survey \"{survey}\": channel must be \"{expected}\", found \"{found}\"")]
    Channel {
        unit: String,
        survey: String,
        expected: String,
        found: String,
    },

    #[error("unit {unit}, survey \"{survey}\", question {position}: order must be {position}, found {found}")]
    Order {
        unit: String,
        survey: String,
        position: usize,
        found: i64,
    },

    #[error("unit {unit}, survey \"{survey}\", question {position}: type must be \"{expected}\", found \"{found}\"")]
    UnexpectedType {
        unit: String,
        survey: String,
        position: usize,
        expected: String,
        found: String,
    },

    #[error("unit {unit}, survey \"{survey}\", question {position}: unknown question type \"{found}\"")]
    UnknownType {
        unit: String,
        survey: String,
        position: usize,
        found: String,
    },

    #[error("unit {unit}, survey \"{survey}\", question {position}: must have exactly {expected} options, found {found}")]
    OptionCount {
        unit: String,
        survey: String,
        position: usize,
        expected: usize,
        found: usize,
    },

    #[error("unit {unit}, survey \"{survey}\", question {position}: free-text question must not have options")]
    FreeTextOptions {
        unit: String,
        survey: String,
        position: usize,
    },

    #[error("unit {unit}, survey \"{survey}\", question {position}: duplicate option value \"{value}\"")]
    DuplicateOptionValue {
        unit: String,
        survey: String,
        position: usize,
        value: String,
    },
}

/// Check one unit against the policy; stops at the first violation
pub fn validate_unit(
    unit: &IngestionUnit,
    policy: &IngestionPolicy,
    catalog: &Catalog,
) -> Result<(), ValidationError> {
    let unit_id = &unit.company.id;
    let surveys = &unit.campaign.surveys;

    if surveys.len() != policy.survey_count {
        return Err(ValidationError::SurveyCount {
            unit: unit_id.clone(),
            expected: policy.survey_count,
            found: surveys.len(),
        });
    }

    for survey in surveys {
        validate_survey(unit_id, survey, policy, catalog)?;
    }

    Ok(())
}

fn validate_survey(
    unit_id: &str,
    survey: &SurveyPayload,
    policy: &IngestionPolicy,
    catalog: &Catalog,
) -> Result<(), ValidationError> {
    if survey.questions.len() != policy.questions_per_survey {
        return Err(ValidationError::QuestionCount {
            unit: unit_id.to_string(),
            survey: survey.name.clone(),
            expected: policy.questions_per_survey,
            found: survey.questions.len(),
        });
    }

    if survey.channel != policy.channel {
        return Err(ValidationError::Channel {
            unit: unit_id.to_string(),
            survey: survey.name.clone(),
            expected: policy.channel.clone(),
            found: survey.channel.clone(),
        });
    }

    for (index, question) in survey.questions.iter().enumerate() {
        let position = index + 1;

        if question.order != position as i64 {
            return Err(ValidationError::Order {
                unit: unit_id.to_string(),
                survey: survey.name.clone(),
                position,
                found: question.order,
            });
        }

        if let Some(expected) = policy.expected_types.get(index) {
            if &question.type_name != expected {
                return Err(ValidationError::UnexpectedType {
                    unit: unit_id.to_string(),
                    survey: survey.name.clone(),
                    position,
                    expected: expected.clone(),
                    found: question.type_name.clone(),
                });
            }
        }

        let Some(question_type) = catalog.question_type(&question.type_name) else {
            return Err(ValidationError::UnknownType {
                unit: unit_id.to_string(),
                survey: survey.name.clone(),
                position,
                found: question.type_name.clone(),
            });
        };

        let options = question.options();
        if question_type.kind.is_choice() {
            if options.len() != policy.choice_option_count {
                return Err(ValidationError::OptionCount {
                    unit: unit_id.to_string(),
                    survey: survey.name.clone(),
                    position,
                    expected: policy.choice_option_count,
                    found: options.len(),
                });
            }
        } else if !options.is_empty() {
            return Err(ValidationError::FreeTextOptions {
                unit: unit_id.to_string(),
                survey: survey.name.clone(),
                position,
            });
        }

        let mut seen = HashSet::with_capacity(options.len());
        for option in options {
            if !seen.insert(option.value.as_str()) {
                return Err(ValidationError::DuplicateOptionValue {
                    unit: unit_id.to_string(),
                    survey: survey.name.clone(),
                    position,
                    value: option.value.clone(),
                });
            }
        }
    }

    Ok(())
}
