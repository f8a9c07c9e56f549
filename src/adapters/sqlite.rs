use crate::domain::model::{
    Category, CategoryId, NewQuestion, Question, QuestionId, QuestionPatch, SeedQuestion,
};
use crate::domain::ports::QuestionStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const QUESTION_COLUMNS: &str = "id, question, answer, category, difficulty";

/// SQLite 題庫。rusqlite 是同步 API，所有查詢都丟到 blocking 執行緒
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::debug!("Opening SQLite database at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            f(&guard)
        })
        .await?
    }
}

pub(crate) fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            category INTEGER NOT NULL,
            difficulty INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 5),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (category) REFERENCES categories(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_questions_category ON questions(category)",
        [],
    )?;

    Ok(())
}

fn question_from_row(row: &Row<'_>) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        category: row.get(3)?,
        difficulty: row.get(4)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        kind: row.get(1)?,
    })
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn query_questions<P: rusqlite::Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> Result<Vec<Question>> {
    let sql = format!(
        "SELECT {} FROM questions {} ORDER BY id",
        QUESTION_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let questions = stmt
        .query_map(params, question_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(questions)
}

fn store_question(conn: &Connection, question: NewQuestion) -> Result<Question> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO questions (question, answer, category, difficulty, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            question.question,
            question.answer,
            question.category,
            question.difficulty,
            now
        ],
    )?;

    Ok(Question {
        id: conn.last_insert_rowid(),
        question: question.question,
        answer: question.answer,
        category: question.category,
        difficulty: question.difficulty,
    })
}

fn find_question(conn: &Connection, id: QuestionId) -> Result<Option<Question>> {
    let sql = format!("SELECT {} FROM questions WHERE id = ?1", QUESTION_COLUMNS);
    Ok(conn.query_row(&sql, [id], question_from_row).optional()?)
}

#[async_trait]
impl QuestionStore for SqliteStore {
    async fn categories(&self) -> Result<Vec<Category>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, type FROM categories ORDER BY id")?;
            let categories = stmt
                .query_map([], category_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(categories)
        })
        .await
    }

    async fn category(&self, id: CategoryId) -> Result<Option<Category>> {
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, type FROM categories WHERE id = ?1",
                    [id],
                    category_from_row,
                )
                .optional()?)
        })
        .await
    }

    async fn insert_category(&self, kind: &str) -> Result<Category> {
        let kind = kind.to_string();
        self.with_conn(move |conn| {
            conn.execute("INSERT INTO categories (type) VALUES (?1)", [&kind])?;
            Ok(Category {
                id: conn.last_insert_rowid(),
                kind,
            })
        })
        .await
    }

    async fn questions(&self) -> Result<Vec<Question>> {
        self.with_conn(|conn| query_questions(conn, "", [])).await
    }

    async fn questions_in_category(&self, category: CategoryId) -> Result<Vec<Question>> {
        self.with_conn(move |conn| query_questions(conn, "WHERE category = ?1", [category]))
            .await
    }

    async fn question(&self, id: QuestionId) -> Result<Option<Question>> {
        self.with_conn(move |conn| find_question(conn, id)).await
    }

    async fn search_questions(&self, term: &str) -> Result<Vec<Question>> {
        // SQLite 的 LIKE 只對 ASCII 不分大小寫
        let pattern = like_pattern(term);
        self.with_conn(move |conn| {
            query_questions(conn, "WHERE question LIKE ?1 ESCAPE '\\'", [pattern])
        })
        .await
    }

    async fn insert_question(&self, question: NewQuestion) -> Result<Question> {
        self.with_conn(move |conn| store_question(conn, question)).await
    }

    async fn update_question(
        &self,
        id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<Option<Question>> {
        self.with_conn(move |conn| {
            let Some(mut question) = find_question(conn, id)? else {
                return Ok(None);
            };
            patch.apply(&mut question);

            conn.execute(
                "UPDATE questions
                 SET question = ?1, answer = ?2, category = ?3, difficulty = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    question.question,
                    question.answer,
                    question.category,
                    question.difficulty,
                    Utc::now().to_rfc3339(),
                    id
                ],
            )?;
            Ok(Some(question))
        })
        .await
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool> {
        self.with_conn(move |conn| {
            let deleted = conn.execute("DELETE FROM questions WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn import_questions(&self, rows: Vec<SeedQuestion>) -> Result<usize> {
        self.with_conn(move |conn| {
            // 任一筆失敗時 tx 在 drop 時 rollback
            let tx = conn.unchecked_transaction()?;
            let imported = rows.len();
            for row in rows {
                let existing: Option<CategoryId> = tx
                    .query_row(
                        "SELECT id FROM categories WHERE type = ?1",
                        [&row.category],
                        |r| r.get(0),
                    )
                    .optional()?;
                let category = match existing {
                    Some(id) => id,
                    None => {
                        tx.execute("INSERT INTO categories (type) VALUES (?1)", [&row.category])?;
                        tx.last_insert_rowid()
                    }
                };

                store_question(
                    &tx,
                    NewQuestion {
                        question: row.question,
                        answer: row.answer,
                        category,
                        difficulty: row.difficulty,
                    },
                )?;
            }
            tx.commit()?;
            Ok(imported)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        // 重複執行不應失敗
        run_migrations(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"categories".to_string()));
        assert!(tables.contains(&"questions".to_string()));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("title"), "%title%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let store = SqliteStore::open_in_memory().unwrap();
        let category = store.insert_category("Math").await.unwrap();
        for text in ["What is 50% of 10?", "What is 50 of 10?"] {
            store
                .insert_question(NewQuestion {
                    question: text.to_string(),
                    answer: "5".to_string(),
                    category: category.id,
                    difficulty: 1,
                })
                .await
                .unwrap();
        }

        let hits = store.search_questions("50%").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].question, "What is 50% of 10?");
    }

    #[tokio::test]
    async fn test_foreign_key_rejects_unknown_category() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store
            .insert_question(NewQuestion {
                question: "Orphan?".to_string(),
                answer: "Yes".to_string(),
                category: 12,
                difficulty: 1,
            })
            .await;
        assert!(matches!(
            result,
            Err(crate::utils::error::TriviaError::DatabaseError(_))
        ));
    }
}
