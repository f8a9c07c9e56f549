use crate::domain::model::{
    Category, CategoryId, NewQuestion, Question, QuestionId, QuestionPatch, SeedQuestion,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Data access capability handed to the service. Implementations return
/// plain in-memory collections.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn categories(&self) -> Result<Vec<Category>>;
    async fn category(&self, id: CategoryId) -> Result<Option<Category>>;
    async fn insert_category(&self, kind: &str) -> Result<Category>;

    /// 依 id 排序
    async fn questions(&self) -> Result<Vec<Question>>;
    async fn questions_in_category(&self, category: CategoryId) -> Result<Vec<Question>>;
    async fn question(&self, id: QuestionId) -> Result<Option<Question>>;

    /// Case-insensitive substring match on the question text.
    async fn search_questions(&self, term: &str) -> Result<Vec<Question>>;

    async fn insert_question(&self, question: NewQuestion) -> Result<Question>;
    async fn update_question(
        &self,
        id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<Option<Question>>;
    async fn delete_question(&self, id: QuestionId) -> Result<bool>;

    /// Writes every row or none of them. Returns the number of questions stored.
    async fn import_questions(&self, rows: Vec<SeedQuestion>) -> Result<usize>;
}

/// Server settings, whether they come from CLI flags or a TOML file.
pub trait ConfigProvider: Send + Sync {
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    /// None 表示使用記憶體資料庫
    fn database_path(&self) -> Option<&str>;
    fn seed_file(&self) -> Option<&str>;
    fn questions_per_page(&self) -> usize;

    fn bind_address(&self) -> String {
        format!("{}:{}", self.host(), self.port())
    }
}
