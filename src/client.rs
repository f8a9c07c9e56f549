use crate::domain::model::{Category, CategoryId, Question, QuestionId, QuizOutcome};
use crate::utils::error::{Result, TriviaError};
use crate::utils::validation::validate_url;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use url::Url;

/// 與網頁前端相同，一輪測驗最多 5 題
pub const QUIZ_LENGTH: usize = 5;

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    categories: BTreeMap<CategoryId, String>,
}

#[derive(Debug, Deserialize)]
struct QuizResponse {
    question: Option<Question>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug, Clone)]
pub struct QuizClient {
    base_url: Url,
    client: Client,
}

impl QuizClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = validate_url("server", base_url)?;
        // 少了結尾斜線時 join 會丟掉最後一段路徑
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            client: Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| TriviaError::ConfigError {
                message: format!("cannot build URL for {}: {}", path, e),
            })
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let url = self.endpoint("categories")?;
        tracing::debug!("Fetching categories from {}", url);

        let response = check_status(self.client.get(url).send().await?).await?;
        let body: CategoriesResponse = response.json().await?;

        Ok(body
            .categories
            .into_iter()
            .map(|(id, kind)| Category { id, kind })
            .collect())
    }

    /// `category` 為 None 時從所有類別出題
    pub async fn next_question(
        &self,
        category: Option<CategoryId>,
        previous_questions: &[QuestionId],
    ) -> Result<QuizOutcome> {
        let url = self.endpoint("quizzes")?;
        let payload = json!({
            "previous_questions": previous_questions,
            "quiz_category": category.unwrap_or(0),
        });
        tracing::debug!("Requesting next question: {}", payload);

        let response = self.client.post(url).json(&payload).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = category {
                return Err(TriviaError::CategoryNotFound { id });
            }
        }

        let body: QuizResponse = check_status(response).await?.json().await?;
        Ok(match body.question {
            Some(question) => QuizOutcome::Next(question),
            None => QuizOutcome::Exhausted,
        })
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    Err(TriviaError::UnexpectedResponse {
        status: status.as_u16(),
        message,
    })
}

pub fn answers_match(expected: &str, given: &str) -> bool {
    expected.trim().to_lowercase() == given.trim().to_lowercase()
}

/// One quiz session. The run owns the previously-served ids and sends them
/// with every request.
#[derive(Debug, Clone)]
pub struct QuizRun {
    category: Option<CategoryId>,
    max_questions: usize,
    previous_questions: Vec<QuestionId>,
    correct: usize,
}

impl QuizRun {
    pub fn new(category: Option<CategoryId>, max_questions: usize) -> Self {
        Self {
            category,
            max_questions,
            previous_questions: Vec::new(),
            correct: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.previous_questions.len() >= self.max_questions
    }

    pub async fn next_question(&mut self, client: &QuizClient) -> Result<Option<Question>> {
        if self.is_finished() {
            return Ok(None);
        }

        match client
            .next_question(self.category, &self.previous_questions)
            .await?
        {
            QuizOutcome::Next(question) => {
                self.previous_questions.push(question.id);
                Ok(Some(question))
            }
            QuizOutcome::Exhausted => {
                tracing::debug!(
                    "No more questions after {}",
                    self.previous_questions.len()
                );
                Ok(None)
            }
        }
    }

    pub fn record_answer(&mut self, question: &Question, answer: &str) -> bool {
        let correct = answers_match(&question.answer, answer);
        if correct {
            self.correct += 1;
        }
        correct
    }

    pub fn previous_questions(&self) -> &[QuestionId] {
        &self.previous_questions
    }

    pub fn asked(&self) -> usize {
        self.previous_questions.len()
    }

    pub fn correct(&self) -> usize {
        self.correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_match_ignores_case_and_spaces() {
        assert!(answers_match("The Liver", "  the liver "));
        assert!(!answers_match("The Liver", "liver"));
    }

    #[test]
    fn test_client_rejects_bad_base_url() {
        assert!(QuizClient::new("not a url").is_err());
        assert!(QuizClient::new("http://127.0.0.1:5000/").is_ok());
    }

    #[test]
    fn test_run_limit() {
        let run = QuizRun::new(None, 0);
        assert!(run.is_finished());
        assert_eq!(run.asked(), 0);
    }

    #[test]
    fn test_record_answer_counts_correct() {
        let mut run = QuizRun::new(Some(1), QUIZ_LENGTH);
        let question = Question {
            id: 1,
            question: "Whose autobiography is entitled 'I Know Why the Caged Bird Sings'?"
                .to_string(),
            answer: "Maya Angelou".to_string(),
            category: 4,
            difficulty: 2,
        };
        assert!(run.record_answer(&question, "maya angelou"));
        assert!(!run.record_answer(&question, "Toni Morrison"));
        assert_eq!(run.correct(), 1);
    }
}
