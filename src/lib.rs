pub mod adapters;
pub mod app;
pub mod client;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{http::router, memory::MemoryStore, sqlite::SqliteStore};
pub use client::{QuizClient, QuizRun};
pub use core::service::TriviaService;
pub use domain::model::{
    Category, NewQuestion, Question, QuestionPatch, QuizOutcome, SeedQuestion,
};
pub use domain::ports::{ConfigProvider, QuestionStore};
pub use domain::selector::select_next;
pub use utils::error::{Result, TriviaError};
