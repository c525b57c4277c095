use std::collections::HashMap;

use millionaire_core::model::{Question, QuestionId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    u64::try_from(v)
        .map(QuestionId::new)
        .map_err(|_| StorageError::Serialization("question_id sign overflow".into()))
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("question_id overflow".into()))
}

pub(crate) fn level_from_i64(v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid level: {v}")))
}

/// Escape `%`, `_` and `\` so user text matches literally inside `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Build a `Question` from a `questions` row plus its ordered wrong answers.
pub(crate) fn map_question_row(
    row: &SqliteRow,
    wrong_answers: &mut HashMap<i64, Vec<String>>,
) -> Result<Question, StorageError> {
    let raw_id: i64 = row.try_get("id").map_err(ser)?;
    let answers = wrong_answers.remove(&raw_id).unwrap_or_default();

    Question::from_persisted(
        question_id_from_i64(raw_id)?,
        level_from_i64(row.try_get::<i64, _>("level").map_err(ser)?)?,
        row.try_get::<String, _>("text").map_err(ser)?,
        row.try_get::<String, _>("correct_answer").map_err(ser)?,
        answers,
        row.try_get::<Option<String>, _>("info").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

/// Group `wrong_answers` rows (already ordered by position) by question id.
pub(crate) fn group_wrong_answers(
    rows: &[SqliteRow],
) -> Result<HashMap<i64, Vec<String>>, StorageError> {
    let mut grouped: HashMap<i64, Vec<String>> = HashMap::new();
    for row in rows {
        let question_id: i64 = row.try_get("question_id").map_err(ser)?;
        let text: String = row.try_get("text").map_err(ser)?;
        grouped.entry(question_id).or_default().push(text);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("plain"), "%plain%");
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(question_id_from_i64(-1).is_err());
        assert_eq!(question_id_from_i64(4).unwrap(), QuestionId::new(4));
    }
}
