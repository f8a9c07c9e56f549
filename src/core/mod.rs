pub mod pagination;
pub mod service;

pub use crate::domain::model::{Category, Question, QuizOutcome};
pub use crate::domain::ports::{ConfigProvider, QuestionStore};
pub use crate::utils::error::Result;
