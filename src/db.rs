//! PostgreSQL document store. Documents live as JSONB rows keyed by
//! `(kind, id)`; translation writes use `jsonb_set` on
//! `translations.{lang}` so they never touch the rest of the document.

use crate::document::{Document, FieldMap};
use crate::error::StoreError;
use crate::store::DocumentStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;

const CREATE_DOCUMENTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS documents (
        kind TEXT NOT NULL,
        id TEXT NOT NULL,
        body JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (kind, id)
    )";

const SELECT_DOCUMENT: &str = "SELECT body FROM documents WHERE kind = $1 AND id = $2";

const SELECT_TRANSLATION: &str =
    "SELECT body -> 'translations' -> $3::text FROM documents WHERE kind = $1 AND id = $2";

// The inner jsonb_set creates an empty translations object when the document
// has none (or a malformed one); the outer one writes only the language key.
const SET_TRANSLATION: &str = "UPDATE documents
    SET body = jsonb_set(
            CASE WHEN jsonb_typeof(body -> 'translations') = 'object' THEN body
                 ELSE jsonb_set(body, '{translations}', '{}'::jsonb, true)
            END,
            ARRAY['translations', $3::text],
            $4,
            true
        ),
        updated_at = now()
    WHERE kind = $1 AND id = $2";

const UPSERT_DOCUMENT: &str = "INSERT INTO documents (kind, id, body) VALUES ($1, $2, $3)
    ON CONFLICT (kind, id) DO UPDATE SET body = EXCLUDED.body, updated_at = now()";

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Connect and create the documents table if it does not exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        sqlx::query(CREATE_DOCUMENTS_TABLE)
            .execute(&pool)
            .await
            .context("Failed to create documents table")?;

        info!("Connected to PostgreSQL document store");
        Ok(Self { pool })
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn load(&self, kind: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let body: Option<Json<Value>> = sqlx::query_scalar(SELECT_DOCUMENT)
            .bind(kind)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        body.map(|Json(value)| serde_json::from_value(value))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn cached_translation(
        &self,
        kind: &str,
        id: &str,
        lang: &str,
    ) -> Result<Option<FieldMap>, StoreError> {
        let entry: Option<Option<Json<Value>>> = sqlx::query_scalar(SELECT_TRANSLATION)
            .bind(kind)
            .bind(id)
            .bind(lang)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match entry.flatten() {
            Some(Json(Value::Object(fields))) => Some(fields),
            _ => None,
        })
    }

    async fn set_translation(
        &self,
        kind: &str,
        id: &str,
        lang: &str,
        entry: FieldMap,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(SET_TRANSLATION)
            .bind(kind)
            .bind(id)
            .bind(lang)
            .bind(Json(Value::Object(entry)))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn upsert(&self, kind: &str, document: Document) -> Result<String, StoreError> {
        let id = document.id().ok_or(StoreError::MissingId)?;
        sqlx::query(UPSERT_DOCUMENT)
            .bind(kind)
            .bind(&id)
            .bind(Json(document.into_value()))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }
}
