use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type QuestionId = i64;
pub type CategoryId = i64;

pub const MIN_DIFFICULTY: i64 = 1;
pub const MAX_DIFFICULTY: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    pub answer: String,
    pub category: CategoryId,
    pub difficulty: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: CategoryId,
    pub difficulty: i64,
}

/// A seed row: the category is referenced by name and created if missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedQuestion {
    pub category: String,
    pub question: String,
    pub answer: String,
    pub difficulty: i64,
}

/// 部分更新，None 代表維持原值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPatch {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<CategoryId>,
    pub difficulty: Option<i64>,
}

impl QuestionPatch {
    pub fn is_empty(&self) -> bool {
        self.question.is_none()
            && self.answer.is_none()
            && self.category.is_none()
            && self.difficulty.is_none()
    }

    pub fn apply(&self, question: &mut Question) {
        if let Some(text) = &self.question {
            question.question = text.clone();
        }
        if let Some(answer) = &self.answer {
            question.answer = answer.clone();
        }
        if let Some(category) = self.category {
            question.category = category;
        }
        if let Some(difficulty) = self.difficulty {
            question.difficulty = difficulty;
        }
    }
}

/// Result of asking for the next quiz question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizOutcome {
    Next(Question),
    /// Every eligible question has already been served.
    Exhausted,
}

impl QuizOutcome {
    pub fn into_question(self) -> Option<Question> {
        match self {
            QuizOutcome::Next(question) => Some(question),
            QuizOutcome::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, QuizOutcome::Exhausted)
    }
}

/// `{id: type}` map the front end renders in its sidebar.
pub fn category_map(categories: &[Category]) -> BTreeMap<CategoryId, String> {
    categories
        .iter()
        .map(|category| (category.id, category.kind.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPage {
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub categories: BTreeMap<CategoryId, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryQuestions {
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub current_category: String,
}
