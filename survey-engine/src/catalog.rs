//! Reference data lookups
//!
//! Built once per batch (or per request) and passed explicitly to the
//! validator and reconciler.

use std::collections::HashMap;
use survey_common::db::{Channel, QuestionType};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    channels: HashMap<String, Channel>,
    question_types: HashMap<String, QuestionType>,
}

impl Catalog {
    pub fn new(channels: Vec<Channel>, question_types: Vec<QuestionType>) -> Self {
        Self {
            channels: channels.into_iter().map(|c| (c.name.clone(), c)).collect(),
            question_types: question_types
                .into_iter()
                .map(|t| (t.name.clone(), t))
                .collect(),
        }
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn question_type(&self, name: &str) -> Option<&QuestionType> {
        self.question_types.get(name)
    }

    pub fn has_question_types(&self) -> bool {
        !self.question_types.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use survey_common::db::QuestionKind;

    /// Catalog matching the seeded reference data
    pub fn seeded() -> Catalog {
        Catalog::new(
            vec![
                Channel { id: "ch-ocr".into(), name: "Ocr".into() },
                Channel { id: "ch-email".into(), name: "Email".into() },
            ],
            vec![
                QuestionType {
                    id: "qt-multi".into(),
                    name: "Opción Múltiple".into(),
                    kind: QuestionKind::MultiSelect,
                },
                QuestionType {
                    id: "qt-single".into(),
                    name: "Opción Única".into(),
                    kind: QuestionKind::SingleSelect,
                },
                QuestionType {
                    id: "qt-text".into(),
                    name: "Completar".into(),
                    kind: QuestionKind::FreeText,
                },
            ],
        )
    }
}
