//! Cache store adapter: reads and writes the per-language `translations`
//! cache held on each document.

use crate::document::{Document, FieldMap, COMPUTED_AT_KEY};
use crate::error::StoreError;
use crate::i18n::{Language, TranslationMetrics};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Backing document store, addressed by `(kind, id)`.
///
/// Implementations must apply `set_translation` as a field-scoped update of
/// `translations.{lang}`: no other language and no original field may change.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, kind: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// The stored `translations.{lang}` entry, if any.
    async fn cached_translation(
        &self,
        kind: &str,
        id: &str,
        lang: &str,
    ) -> Result<Option<FieldMap>, StoreError> {
        Ok(self
            .load(kind, id)
            .await?
            .and_then(|document| document.translation(lang).cloned()))
    }

    async fn set_translation(
        &self,
        kind: &str,
        id: &str,
        lang: &str,
        entry: FieldMap,
    ) -> Result<(), StoreError>;

    /// Insert or replace a whole document. Returns its id.
    async fn upsert(&self, kind: &str, document: Document) -> Result<String, StoreError>;
}

/// Pure read of `document.translations[lang]`.
pub fn read_cached<'a>(document: &'a Document, lang: Language) -> Option<&'a FieldMap> {
    document.translation(lang.code())
}

/// Persist `values` as `translations.{lang}` with a `computedAt` timestamp.
///
/// Failures are logged and counted, never returned: the caller serves the
/// computed translation anyway and the miss recurs on the next request.
/// Returns the entry as written (or as it would have been written).
pub async fn write_cached(
    store: &dyn DocumentStore,
    kind: &str,
    id: &str,
    lang: Language,
    values: FieldMap,
    metrics: &TranslationMetrics,
) -> FieldMap {
    let mut entry = values;
    entry.insert(
        COMPUTED_AT_KEY.to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );

    match store
        .set_translation(kind, id, lang.code(), entry.clone())
        .await
    {
        Ok(()) => debug!(kind, id, lang = %lang, "Cached translation"),
        Err(e) => {
            metrics.record_store_write_failure();
            warn!(kind, id, lang = %lang, error = %e, "Failed to cache translation");
        }
    }
    entry
}

/// In-process store, used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<(String, String), Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, kind: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&(kind.to_string(), id.to_string()))
            .cloned())
    }

    async fn set_translation(
        &self,
        kind: &str,
        id: &str,
        lang: &str,
        entry: FieldMap,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(&(kind.to_string(), id.to_string()))
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            })?;
        document.set_translation(lang, entry);
        Ok(())
    }

    async fn upsert(&self, kind: &str, document: Document) -> Result<String, StoreError> {
        let id = document.id().ok_or(StoreError::MissingId)?;
        self.documents
            .write()
            .await
            .insert((kind.to_string(), id.clone()), document);
        Ok(id)
    }
}
