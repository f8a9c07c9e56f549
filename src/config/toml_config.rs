use crate::core::pagination::QUESTIONS_PER_PAGE;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, TriviaError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub seed: Option<SeedConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default)]
    pub in_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_questions_per_page")]
    pub questions_per_page: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub file: String,
}

fn default_host() -> String {
    super::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    super::DEFAULT_PORT
}

fn default_database_path() -> String {
    super::DEFAULT_DATABASE_PATH.to_string()
}

fn default_questions_per_page() -> usize {
    QUESTIONS_PER_PAGE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            in_memory: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            questions_per_page: default_questions_per_page(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TriviaError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TriviaError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TRIVIA_DB})，未設定的保留原文
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TriviaError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_range("server.port", self.server.port, 1, u16::MAX)?;

        if !self.database.in_memory {
            validate_path("database.path", &self.database.path)?;
            if self.database.path.contains("${") {
                return Err(TriviaError::ConfigValidationError {
                    field: "database.path".to_string(),
                    message: format!("unresolved variable in '{}'", self.database.path),
                });
            }
        }

        validate_positive_number("api.questions_per_page", self.api.questions_per_page, 1)?;

        if let Some(seed) = &self.seed {
            validate_path("seed.file", &seed.file)?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn host(&self) -> &str {
        &self.server.host
    }

    fn port(&self) -> u16 {
        self.server.port
    }

    fn database_path(&self) -> Option<&str> {
        (!self.database.in_memory).then_some(self.database.path.as_str())
    }

    fn seed_file(&self) -> Option<&str> {
        self.seed.as_ref().map(|seed| seed.file.as_str())
    }

    fn questions_per_page(&self) -> usize {
        self.api.questions_per_page
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
