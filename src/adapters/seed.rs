use crate::domain::model::{SeedQuestion, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::domain::ports::QuestionStore;
use crate::utils::error::{Result, TriviaError};
use crate::utils::validation::validate_range;
use std::io::Read;
use std::path::Path;

pub async fn import_csv_file<S: QuestionStore>(store: &S, path: &Path) -> Result<usize> {
    tracing::info!("Importing questions from {}", path.display());
    let file = std::fs::File::open(path)?;
    import_csv(store, file).await
}

/// 匯入 `category,question,answer,difficulty` 格式的 CSV，類別依名稱自動建立
pub async fn import_csv<S: QuestionStore, R: Read>(store: &S, reader: R) -> Result<usize> {
    let rows = parse_rows(reader)?;
    let imported = store.import_questions(rows).await?;

    tracing::info!("Imported {} questions", imported);
    Ok(imported)
}

// 全部解析成功才寫入
fn parse_rows<R: Read>(reader: R) -> Result<Vec<SeedQuestion>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<SeedQuestion>().enumerate() {
        let row = record?;
        // header 是第 1 行
        let line = index + 2;
        if row.category.is_empty() || row.question.is_empty() || row.answer.is_empty() {
            return Err(TriviaError::bad_request(format!(
                "seed line {} has an empty field",
                line
            )));
        }
        validate_range("difficulty", row.difficulty, MIN_DIFFICULTY, MAX_DIFFICULTY)
            .map_err(|e| TriviaError::bad_request(format!("seed line {}: {}", line, e)))?;
        rows.push(row);
    }
    Ok(rows)
}
