//! `MetadataStore`: row-level CRUD plus partition delete, keyed by `(owner, prefix)`.

use crate::transaction::with_transaction;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filepoint_core::{AppError, MetadataRow};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, owner: Uuid, prefix: &str) -> Result<Option<MetadataRow>, AppError>;

    async fn insert(&self, row: &MetadataRow) -> Result<(), AppError>;

    /// Overwrites `definitions_map` / `file_labels` for an existing row (Stage C commit).
    async fn update_definitions(
        &self,
        owner: Uuid,
        prefix: &str,
        definitions_map: HashMap<String, String>,
        file_labels: Vec<String>,
    ) -> Result<(), AppError>;

    async fn delete(&self, owner: Uuid, prefix: &str) -> Result<(), AppError>;

    /// Deletes every row under `owner` (full-depth `DELETE /upload/all`).
    async fn delete_partition(&self, owner: Uuid) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PostgresMetadataStore {
    pool: PgPool,
}

impl PostgresMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_from_record(
        owner: Uuid,
        prefix: String,
        author: Option<String>,
        title: Option<String>,
        request_id: Uuid,
        correlation_id: String,
        definitions_map: serde_json::Value,
        file_labels: serde_json::Value,
        occurred_on: DateTime<Utc>,
    ) -> Result<MetadataRow, AppError> {
        let definitions_map: HashMap<String, String> = serde_json::from_value(definitions_map)
            .map_err(|e| AppError::Internal(format!("malformed definitions_map: {e}")))?;
        let file_labels: Vec<String> = serde_json::from_value(file_labels)
            .map_err(|e| AppError::Internal(format!("malformed file_labels: {e}")))?;

        Ok(MetadataRow {
            owner,
            prefix,
            author,
            title,
            request_id,
            correlation_id,
            definitions_map,
            file_labels,
            occurred_on,
        })
    }
}

#[async_trait]
impl MetadataStore for PostgresMetadataStore {
    async fn get(&self, owner: Uuid, prefix: &str) -> Result<Option<MetadataRow>, AppError> {
        let record = sqlx::query(
            r#"
            SELECT owner, prefix, author, title, request_id, correlation_id,
                   definitions_map, file_labels, occurred_on
            FROM metadata_rows
            WHERE owner = $1 AND prefix = $2
            "#,
        )
        .bind(owner)
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let row = Self::row_from_record(
            record.try_get("owner")?,
            record.try_get("prefix")?,
            record.try_get("author")?,
            record.try_get("title")?,
            record.try_get("request_id")?,
            record.try_get("correlation_id")?,
            record.try_get("definitions_map")?,
            record.try_get("file_labels")?,
            record.try_get("occurred_on")?,
        )?;
        Ok(Some(row))
    }

    async fn insert(&self, row: &MetadataRow) -> Result<(), AppError> {
        let definitions_map = serde_json::to_value(&row.definitions_map)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let file_labels =
            serde_json::to_value(&row.file_labels).map_err(|e| AppError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO metadata_rows
                (owner, prefix, author, title, request_id, correlation_id,
                 definitions_map, file_labels, occurred_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(row.owner)
        .bind(&row.prefix)
        .bind(&row.author)
        .bind(&row.title)
        .bind(row.request_id)
        .bind(&row.correlation_id)
        .bind(definitions_map)
        .bind(file_labels)
        .bind(row.occurred_on)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_definitions(
        &self,
        owner: Uuid,
        prefix: &str,
        definitions_map: HashMap<String, String>,
        file_labels: Vec<String>,
    ) -> Result<(), AppError> {
        let definitions_map =
            serde_json::to_value(&definitions_map).map_err(|e| AppError::Internal(e.to_string()))?;
        let file_labels =
            serde_json::to_value(&file_labels).map_err(|e| AppError::Internal(e.to_string()))?;
        let prefix_owned = prefix.to_string();
        let prefix_for_error = prefix_owned.clone();

        // Stage C's commit runs inside its own transaction (spec.md §5: Stage
        // C happens-before ack) so a crash mid-write never leaves a row with
        // a half-applied definitions_map.
        let rows_affected = with_transaction(&self.pool, move |tx| {
            Box::pin(async move {
                let result = sqlx::query(
                    r#"
                    UPDATE metadata_rows
                    SET definitions_map = $3, file_labels = $4
                    WHERE owner = $1 AND prefix = $2
                    "#,
                )
                .bind(owner)
                .bind(&prefix_owned)
                .bind(definitions_map)
                .bind(file_labels)
                .execute(&mut *tx)
                .await?;
                Ok(result.rows_affected())
            })
        })
        .await
        .map_err(AppError::UpstreamTransient)?;

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "metadata row not found for {owner}/{prefix_for_error}"
            )));
        }
        Ok(())
    }

    async fn delete(&self, owner: Uuid, prefix: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM metadata_rows WHERE owner = $1 AND prefix = $2")
            .bind(owner)
            .bind(prefix)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_partition(&self, owner: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM metadata_rows WHERE owner = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_from_record_round_trips_json_columns() {
        let mut definitions = HashMap::new();
        definitions.insert("low".to_string(), "owner/uid/low-def.webp".to_string());

        let row = PostgresMetadataStore::row_from_record(
            Uuid::nil(),
            "owner/uid".to_string(),
            Some("alice".to_string()),
            Some("hello".to_string()),
            Uuid::nil(),
            "corr-1".to_string(),
            serde_json::to_value(&definitions).unwrap(),
            serde_json::to_value(Vec::<String>::new()).unwrap(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(row.get_definition_key(filepoint_core::Definition::Low), Some(&"owner/uid/low-def.webp".to_string()));
    }
}
