use crate::core::pagination::QUESTIONS_PER_PAGE;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "trivia-api")]
#[command(about = "JSON API for browsing trivia questions and playing quizzes")]
pub struct CliConfig {
    #[arg(long, help = "Load settings from a TOML file instead of flags")]
    pub config: Option<String>,

    #[arg(long, default_value = super::DEFAULT_HOST)]
    pub host: String,

    #[arg(long, default_value_t = super::DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, default_value = super::DEFAULT_DATABASE_PATH)]
    pub database_path: String,

    #[arg(long, help = "Keep questions in memory only")]
    pub in_memory: bool,

    #[arg(long, help = "CSV file (category,question,answer,difficulty) to import at startup")]
    pub seed: Option<String>,

    #[arg(long, default_value_t = QUESTIONS_PER_PAGE)]
    pub questions_per_page: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn database_path(&self) -> Option<&str> {
        (!self.in_memory).then_some(self.database_path.as_str())
    }

    fn seed_file(&self) -> Option<&str> {
        self.seed.as_deref()
    }

    fn questions_per_page(&self) -> usize {
        self.questions_per_page
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("host", &self.host)?;
        validate_range("port", self.port, 1, u16::MAX)?;
        if !self.in_memory {
            validate_path("database_path", &self.database_path)?;
        }
        if let Some(seed) = &self.seed {
            validate_path("seed", seed)?;
        }
        validate_positive_number("questions_per_page", self.questions_per_page, 1)
    }
}
