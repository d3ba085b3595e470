//! PostgreSQL implementation of ThreadStore.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::conversation::ThreadRecord;
use crate::domain::drafting::TurnRole;
use crate::domain::foundation::{ThreadIdentity, Timestamp, THREAD_SEPARATOR};
use crate::ports::{StorageError, ThreadStore};

/// PostgreSQL implementation of ThreadStore.
#[derive(Clone)]
pub struct PostgresThreadStore {
    pool: PgPool,
}

impl PostgresThreadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThreadStore for PostgresThreadStore {
    async fn append(&self, record: &ThreadRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO thread_records (thread_id, role, content, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.thread_id.to_string())
        .bind(role_to_str(record.role))
        .bind(&record.content)
        .bind(record.timestamp.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database(format!("Failed to append thread record: {}", e)))?;

        Ok(())
    }

    async fn list_thread_history(
        &self,
        thread_id: &ThreadIdentity,
    ) -> Result<Vec<ThreadRecord>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT role, content, created_at
            FROM thread_records
            WHERE thread_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(thread_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::database(format!("Failed to fetch thread history: {}", e)))?;

        rows.iter()
            .map(|row| -> Result<ThreadRecord, StorageError> {
                let role: &str = row.get("role");
                let content: String = row.get("content");
                let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");

                Ok(ThreadRecord {
                    thread_id: thread_id.clone(),
                    role: str_to_role(role)?,
                    content,
                    timestamp: Timestamp::from_datetime(created_at),
                })
            })
            .collect()
    }

    async fn delete_threads_by_prefix(&self, prefix: &str) -> Result<u64, StorageError> {
        let result = sqlx::query(
            r#"
            DELETE FROM thread_records
            WHERE thread_id = $1 OR thread_id LIKE $2 ESCAPE '\'
            "#,
        )
        .bind(prefix)
        .bind(like_prefix(&format!("{}{}", prefix, THREAD_SEPARATOR)))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database(format!("Failed to delete threads: {}", e)))?;

        Ok(result.rows_affected())
    }
}

/// LIKE pattern matching strings that start with `prefix` literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn role_to_str(role: TurnRole) -> &'static str {
    match role {
        TurnRole::Customer => "customer",
        TurnRole::Assistant => "assistant",
    }
}

fn str_to_role(s: &str) -> Result<TurnRole, StorageError> {
    match s {
        "customer" => Ok(TurnRole::Customer),
        "assistant" => Ok(TurnRole::Assistant),
        _ => Err(StorageError::corrupted(format!("Unknown turn role: {}", s))),
    }
}
