use std::collections::HashMap;

use millionaire_core::model::{Question, QuestionId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    conn, group_wrong_answers, level_from_i64, like_pattern, map_question_row,
    question_id_from_i64, question_id_to_i64, ser,
};
use crate::repository::{LevelCount, NewQuestionRecord, QuestionRepository, StorageError};

const QUESTION_COLUMNS: &str = "id, level, text, correct_answer, info, created_at, updated_at";

/// Ids bound per `IN (...)` lookup; SQLite caps host parameters at 32766.
const WRONG_ANSWER_BATCH: usize = 500;

impl SqliteRepository {
    async fn wrong_answers_for(
        &self,
        ids: &[i64],
    ) -> Result<HashMap<i64, Vec<String>>, StorageError> {
        let mut grouped = HashMap::with_capacity(ids.len());
        for batch in ids.chunks(WRONG_ANSWER_BATCH) {
            let placeholders = (1..=batch.len())
                .map(|n| format!("?{n}"))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT question_id, text FROM wrong_answers \
                 WHERE question_id IN ({placeholders}) \
                 ORDER BY question_id ASC, position ASC"
            );

            let mut q = sqlx::query(&sql);
            for id in batch {
                q = q.bind(*id);
            }
            let rows = q.fetch_all(&self.pool).await.map_err(conn)?;
            grouped.extend(group_wrong_answers(&rows)?);
        }
        Ok(grouped)
    }

    async fn hydrate(&self, rows: Vec<SqliteRow>) -> Result<Vec<Question>, StorageError> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id").map_err(ser))
            .collect::<Result<Vec<_>, _>>()?;
        let mut wrong = self.wrong_answers_for(&ids).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_question_row(&row, &mut wrong)?);
        }
        Ok(out)
    }

    async fn hydrate_one(&self, row: Option<SqliteRow>) -> Result<Option<Question>, StorageError> {
        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

async fn insert_wrong_answers(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    question_id: i64,
    answers: &[String],
) -> Result<(), StorageError> {
    for (position, text) in answers.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| StorageError::Serialization("position overflow".into()))?;
        sqlx::query(
            r"
            INSERT INTO wrong_answers (question_id, position, text)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(question_id)
        .bind(position)
        .bind(text)
        .execute(&mut **tx)
        .await
        .map_err(conn)?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn random_question_at_level(&self, level: u32) -> Result<Option<Question>, StorageError> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE level = ?1 ORDER BY RANDOM() LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(i64::from(level))
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        self.hydrate_one(row).await
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        self.hydrate(rows).await
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(question_id_to_i64(id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        self.hydrate_one(row).await
    }

    async fn insert_new_question(&self, record: NewQuestionRecord) -> Result<QuestionId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO questions (level, text, correct_answer, info, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ",
        )
        .bind(i64::from(record.level))
        .bind(&record.text)
        .bind(&record.correct_answer)
        .bind(record.info.as_deref())
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let raw_id = res.last_insert_rowid();
        insert_wrong_answers(&mut tx, raw_id, &record.wrong_answers).await?;
        tx.commit().await.map_err(conn)?;

        question_id_from_i64(raw_id)
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let raw_id = question_id_to_i64(question.id())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // created_at is immutable once inserted
        let res = sqlx::query(
            r"
            UPDATE questions
            SET level = ?2, text = ?3, correct_answer = ?4, info = ?5, updated_at = ?6
            WHERE id = ?1
            ",
        )
        .bind(raw_id)
        .bind(i64::from(question.level()))
        .bind(question.text())
        .bind(question.correct_answer())
        .bind(question.info())
        .bind(question.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query("DELETE FROM wrong_answers WHERE question_id = ?1")
            .bind(raw_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        insert_wrong_answers(&mut tx, raw_id, question.wrong_answers()).await?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(question_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn search_questions(&self, needle: &str) -> Result<Vec<Question>, StorageError> {
        let sql = format!(
            r"
            SELECT {QUESTION_COLUMNS}
            FROM questions q
            WHERE q.text LIKE ?1 ESCAPE '\'
               OR q.correct_answer LIKE ?1 ESCAPE '\'
               OR EXISTS (
                    SELECT 1 FROM wrong_answers w
                    WHERE w.question_id = q.id AND w.text LIKE ?1 ESCAPE '\'
               )
            ORDER BY q.id ASC
            "
        );
        let rows = sqlx::query(&sql)
            .bind(like_pattern(needle))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        self.hydrate(rows).await
    }

    async fn count_by_level(&self) -> Result<Vec<LevelCount>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT level, COUNT(*) AS count
            FROM questions
            GROUP BY level
            ORDER BY level ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let count: i64 = row.try_get("count").map_err(ser)?;
                Ok(LevelCount {
                    level: level_from_i64(row.try_get::<i64, _>("level").map_err(ser)?)?,
                    count: u64::try_from(count)
                        .map_err(|_| StorageError::Serialization("negative count".into()))?,
                })
            })
            .collect()
    }
}
