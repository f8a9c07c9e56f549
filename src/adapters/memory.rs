use crate::domain::model::{
    Category, CategoryId, NewQuestion, Question, QuestionId, QuestionPatch, SeedQuestion,
};
use crate::domain::ports::QuestionStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    questions: BTreeMap<QuestionId, Question>,
    next_category_id: CategoryId,
    next_question_id: QuestionId,
}

impl Tables {
    fn insert_category(&mut self, kind: &str) -> CategoryId {
        self.next_category_id += 1;
        let id = self.next_category_id;
        self.categories.insert(
            id,
            Category {
                id,
                kind: kind.to_string(),
            },
        );
        id
    }

    fn category_named(&self, kind: &str) -> Option<CategoryId> {
        self.categories
            .values()
            .find(|category| category.kind == kind)
            .map(|category| category.id)
    }

    fn insert_question(&mut self, new_question: NewQuestion) -> Question {
        self.next_question_id += 1;
        let question = Question {
            id: self.next_question_id,
            question: new_question.question,
            answer: new_question.answer,
            category: new_question.category,
            difficulty: new_question.difficulty,
        };
        self.questions.insert(question.id, question.clone());
        question
    }
}

/// 記憶體內的題庫，測試與 `--in-memory` 使用
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means another thread panicked mid-write; the maps
    // themselves are still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_category(&self, kind: &str) -> CategoryId {
        self.write().insert_category(kind)
    }

    pub fn add_question(
        &self,
        question: &str,
        answer: &str,
        category: CategoryId,
        difficulty: i64,
    ) -> QuestionId {
        self.write()
            .insert_question(NewQuestion {
                question: question.to_string(),
                answer: answer.to_string(),
                category,
                difficulty,
            })
            .id
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.read().categories.values().cloned().collect())
    }

    async fn category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.read().categories.get(&id).cloned())
    }

    async fn insert_category(&self, kind: &str) -> Result<Category> {
        let id = self.add_category(kind);
        Ok(Category {
            id,
            kind: kind.to_string(),
        })
    }

    async fn questions(&self) -> Result<Vec<Question>> {
        Ok(self.read().questions.values().cloned().collect())
    }

    async fn questions_in_category(&self, category: CategoryId) -> Result<Vec<Question>> {
        Ok(self
            .read()
            .questions
            .values()
            .filter(|question| question.category == category)
            .cloned()
            .collect())
    }

    async fn question(&self, id: QuestionId) -> Result<Option<Question>> {
        Ok(self.read().questions.get(&id).cloned())
    }

    async fn search_questions(&self, term: &str) -> Result<Vec<Question>> {
        let needle = term.to_lowercase();
        Ok(self
            .read()
            .questions
            .values()
            .filter(|question| question.question.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn insert_question(&self, question: NewQuestion) -> Result<Question> {
        Ok(self.write().insert_question(question))
    }

    async fn update_question(
        &self,
        id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<Option<Question>> {
        let mut tables = self.write();
        Ok(tables.questions.get_mut(&id).map(|question| {
            patch.apply(question);
            question.clone()
        }))
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool> {
        Ok(self.write().questions.remove(&id).is_some())
    }

    async fn import_questions(&self, rows: Vec<SeedQuestion>) -> Result<usize> {
        // 單一把寫鎖內完成，其他讀者看不到一半的匯入
        let mut tables = self.write();
        let imported = rows.len();
        for row in rows {
            let category = match tables.category_named(&row.category) {
                Some(id) => id,
                None => tables.insert_category(&row.category),
            };
            tables.insert_question(NewQuestion {
                question: row.question,
                answer: row.answer,
                category,
                difficulty: row.difficulty,
            });
        }
        Ok(imported)
    }
}
