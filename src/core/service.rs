use crate::core::pagination::{Page, QUESTIONS_PER_PAGE};
use crate::domain::model::{
    category_map, Category, CategoryId, CategoryQuestions, NewQuestion, Question, QuestionId,
    QuestionPage, QuestionPatch, QuizOutcome, MAX_DIFFICULTY, MIN_DIFFICULTY,
};
use crate::domain::ports::QuestionStore;
use crate::domain::selector::select_next;
use crate::utils::error::{Result, TriviaError};
use crate::utils::validation::{validate_non_empty_string, validate_range};
use std::collections::HashSet;

pub struct TriviaService<S: QuestionStore> {
    store: S,
    questions_per_page: usize,
}

impl<S: QuestionStore> TriviaService<S> {
    pub fn new(store: S) -> Self {
        Self::with_page_size(store, QUESTIONS_PER_PAGE)
    }

    pub fn with_page_size(store: S, questions_per_page: usize) -> Self {
        Self {
            store,
            questions_per_page: questions_per_page.max(1),
        }
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let categories = self.store.categories().await?;
        if categories.is_empty() {
            return Err(TriviaError::unprocessable("no categories available"));
        }
        Ok(categories)
    }

    pub async fn questions_page(&self, page: i64) -> Result<QuestionPage> {
        let window =
            Page::new(page, self.questions_per_page).ok_or(TriviaError::PageOutOfRange { page })?;

        let questions = self.store.questions().await?;
        let current = window.slice(&questions);
        if current.is_empty() {
            return Err(TriviaError::PageOutOfRange { page });
        }

        let categories = self.store.categories().await?;
        Ok(QuestionPage {
            questions: current.to_vec(),
            total_questions: questions.len(),
            categories: category_map(&categories),
        })
    }

    pub async fn questions_by_category(&self, id: CategoryId) -> Result<CategoryQuestions> {
        let category = self
            .store
            .category(id)
            .await?
            .ok_or(TriviaError::CategoryNotFound { id })?;

        let questions = self.store.questions_in_category(id).await?;
        Ok(CategoryQuestions {
            total_questions: questions.len(),
            questions,
            current_category: category.kind,
        })
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Question>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(TriviaError::bad_request("search term cannot be empty"));
        }
        self.store.search_questions(term).await
    }

    pub async fn create_question(&self, new_question: NewQuestion) -> Result<Question> {
        validate_question_fields(
            Some(&new_question.question),
            Some(&new_question.answer),
            Some(new_question.difficulty),
        )?;
        self.ensure_category(new_question.category).await?;

        let question = self.store.insert_question(new_question).await?;
        tracing::info!(
            "Created question {} in category {}",
            question.id,
            question.category
        );
        Ok(question)
    }

    pub async fn update_question(&self, id: QuestionId, patch: QuestionPatch) -> Result<Question> {
        if patch.is_empty() {
            return Err(TriviaError::bad_request("nothing to update"));
        }
        validate_question_fields(
            patch.question.as_ref(),
            patch.answer.as_ref(),
            patch.difficulty,
        )?;
        if let Some(category) = patch.category {
            self.ensure_category(category).await?;
        }

        let question = self
            .store
            .update_question(id, patch)
            .await?
            .ok_or(TriviaError::QuestionNotFound { id })?;
        tracing::info!("Updated question {}", id);
        Ok(question)
    }

    pub async fn delete_question(&self, id: QuestionId) -> Result<QuestionId> {
        if !self.store.delete_question(id).await? {
            return Err(TriviaError::QuestionNotFound { id });
        }
        tracing::info!("Deleted question {}", id);
        Ok(id)
    }

    pub async fn total_questions(&self) -> Result<usize> {
        Ok(self.store.questions().await?.len())
    }

    /// `None` draws from every category.
    pub async fn next_quiz_question(
        &self,
        category: Option<CategoryId>,
        previous_questions: &[QuestionId],
    ) -> Result<QuizOutcome> {
        let pool = match category {
            Some(id) => {
                if self.store.category(id).await?.is_none() {
                    return Err(TriviaError::CategoryNotFound { id });
                }
                self.store.questions_in_category(id).await?
            }
            None => self.store.questions().await?,
        };

        let previous: HashSet<QuestionId> = previous_questions.iter().copied().collect();
        let outcome = select_next(&pool, &previous, &mut rand::thread_rng());

        match &outcome {
            QuizOutcome::Next(question) => tracing::debug!(
                "Serving quiz question {} ({} of {} already served)",
                question.id,
                previous.len(),
                pool.len()
            ),
            QuizOutcome::Exhausted => {
                tracing::debug!("Quiz exhausted after {} questions", previous.len())
            }
        }

        Ok(outcome)
    }

    async fn ensure_category(&self, id: CategoryId) -> Result<()> {
        if self.store.category(id).await?.is_none() {
            return Err(TriviaError::unprocessable(format!(
                "category {} does not exist",
                id
            )));
        }
        Ok(())
    }
}

fn validate_question_fields(
    question: Option<&String>,
    answer: Option<&String>,
    difficulty: Option<i64>,
) -> Result<()> {
    let check = || -> Result<()> {
        if let Some(text) = question {
            validate_non_empty_string("question", text)?;
        }
        if let Some(text) = answer {
            validate_non_empty_string("answer", text)?;
        }
        if let Some(value) = difficulty {
            validate_range("difficulty", value, MIN_DIFFICULTY, MAX_DIFFICULTY)?;
        }
        Ok(())
    };

    // 欄位錯誤一律視為 400
    check().map_err(|e| TriviaError::bad_request(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;

    fn seeded_service() -> TriviaService<MemoryStore> {
        let store = MemoryStore::new();
        let science = store.add_category("Science");
        let art = store.add_category("Art");
        store.add_category("Sports");
        for i in 1..=12 {
            store.add_question(&format!("Science question {}", i), "yes", science, 1);
        }
        store.add_question("Who painted the Mona Lisa?", "Leonardo da Vinci", art, 3);
        TriviaService::new(store)
    }

    #[test]
    fn test_categories_empty_store_is_unprocessable() {
        let service = TriviaService::new(MemoryStore::new());
        let result = tokio_test::block_on(service.categories());
        assert!(matches!(result, Err(TriviaError::Unprocessable { .. })));
    }

    #[tokio::test]
    async fn test_questions_page_sizes() {
        let service = seeded_service();

        let first = service.questions_page(1).await.unwrap();
        assert_eq!(first.questions.len(), 10);
        assert_eq!(first.total_questions, 13);
        assert_eq!(first.categories.len(), 3);
        assert_eq!(first.questions[0].id, 1);

        let second = service.questions_page(2).await.unwrap();
        assert_eq!(second.questions.len(), 3);
        assert_eq!(second.questions[0].id, 11);
    }

    #[tokio::test]
    async fn test_questions_page_out_of_range() {
        let service = seeded_service();
        assert!(matches!(
            service.questions_page(3).await,
            Err(TriviaError::PageOutOfRange { page: 3 })
        ));
        assert!(matches!(
            service.questions_page(0).await,
            Err(TriviaError::PageOutOfRange { page: 0 })
        ));
    }

    #[tokio::test]
    async fn test_custom_page_size() {
        let store = MemoryStore::new();
        let id = store.add_category("History");
        for i in 0..5 {
            store.add_question(&format!("Q{}", i), "A", id, 2);
        }
        let service = TriviaService::with_page_size(store, 2);
        assert_eq!(service.questions_page(3).await.unwrap().questions.len(), 1);
    }

    #[tokio::test]
    async fn test_questions_by_category() {
        let service = seeded_service();
        let art = service.questions_by_category(2).await.unwrap();
        assert_eq!(art.current_category, "Art");
        assert_eq!(art.total_questions, 1);

        let sports = service.questions_by_category(3).await.unwrap();
        assert_eq!(sports.total_questions, 0);

        assert!(matches!(
            service.questions_by_category(99).await,
            Err(TriviaError::CategoryNotFound { id: 99 })
        ));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let service = seeded_service();
        let results = service.search("mona LISA").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].answer, "Leonardo da Vinci");

        assert!(service.search("xylophone").await.unwrap().is_empty());
        assert!(matches!(
            service.search("  ").await,
            Err(TriviaError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_question_validation() {
        let service = seeded_service();
        let valid = NewQuestion {
            question: "What is H2O?".to_string(),
            answer: "Water".to_string(),
            category: 1,
            difficulty: 1,
        };

        let created = service.create_question(valid.clone()).await.unwrap();
        assert_eq!(created.id, 14);
        assert_eq!(service.total_questions().await.unwrap(), 14);

        let blank = NewQuestion {
            answer: " ".to_string(),
            ..valid.clone()
        };
        assert!(matches!(
            service.create_question(blank).await,
            Err(TriviaError::BadRequest { .. })
        ));

        let too_hard = NewQuestion {
            difficulty: 6,
            ..valid.clone()
        };
        assert!(matches!(
            service.create_question(too_hard).await,
            Err(TriviaError::BadRequest { .. })
        ));

        let orphan = NewQuestion {
            category: 42,
            ..valid
        };
        assert!(matches!(
            service.create_question(orphan).await,
            Err(TriviaError::Unprocessable { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_question() {
        let service = seeded_service();
        let patch = QuestionPatch {
            answer: Some("Da Vinci".to_string()),
            ..Default::default()
        };
        let updated = service.update_question(13, patch.clone()).await.unwrap();
        assert_eq!(updated.answer, "Da Vinci");
        assert_eq!(updated.question, "Who painted the Mona Lisa?");

        assert!(matches!(
            service.update_question(500, patch).await,
            Err(TriviaError::QuestionNotFound { id: 500 })
        ));
        assert!(matches!(
            service.update_question(13, QuestionPatch::default()).await,
            Err(TriviaError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_question() {
        let service = seeded_service();
        assert_eq!(service.delete_question(13).await.unwrap(), 13);
        assert!(matches!(
            service.delete_question(13).await,
            Err(TriviaError::QuestionNotFound { id: 13 })
        ));
    }

    #[tokio::test]
    async fn test_quiz_unknown_category() {
        let service = seeded_service();
        assert!(matches!(
            service.next_quiz_question(Some(77), &[]).await,
            Err(TriviaError::CategoryNotFound { id: 77 })
        ));
    }

    #[tokio::test]
    async fn test_quiz_stays_in_category() {
        let service = seeded_service();
        let outcome = service.next_quiz_question(Some(2), &[]).await.unwrap();
        assert_eq!(outcome.into_question().map(|q| q.id), Some(13));

        let outcome = service.next_quiz_question(Some(2), &[13]).await.unwrap();
        assert!(outcome.is_exhausted());

        let empty = service.next_quiz_question(Some(3), &[]).await.unwrap();
        assert!(empty.is_exhausted());
    }

    #[tokio::test]
    async fn test_quiz_all_categories_excludes_previous() {
        let service = seeded_service();
        let previous: Vec<QuestionId> = (1..=12).collect();
        for _ in 0..20 {
            let outcome = service
                .next_quiz_question(None, &previous)
                .await
                .unwrap();
            assert_eq!(outcome.into_question().map(|q| q.id), Some(13));
        }
    }
}
