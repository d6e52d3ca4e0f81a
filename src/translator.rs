//! Translation orchestrator: the public entry point of the core.
//!
//! For each document it serves the cached `translations.{lang}` entry when
//! one exists. Otherwise it translates every eligible field, persists the
//! result, and returns the document with translated values merged over the
//! originals.

use crate::document::{has_content, Document, FieldMap};
use crate::error::TranslateError;
use crate::field::FieldTranslator;
use crate::i18n::{Language, TranslationMetrics};
use crate::provider::ProviderClient;
use crate::schema;
use crate::store::{read_cached, write_cached, DocumentStore};
use futures::future::{join_all, try_join_all, BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// One document and the language it was served in.
#[derive(Debug, Clone, Serialize)]
pub struct TranslatedDocument {
    pub language: Language,
    pub document: Document,
}

/// Documents in request order and the language they were served in.
#[derive(Debug, Clone, Serialize)]
pub struct TranslatedDocuments {
    pub language: Language,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InflightKey {
    kind: String,
    id: String,
    lang: Language,
}

type InflightEntry = Shared<BoxFuture<'static, FieldMap>>;
type InflightMap = Arc<Mutex<HashMap<InflightKey, InflightEntry>>>;

/// Clears its in-flight entry when the waiter finishes or is dropped.
struct InflightGuard {
    inflight: InflightMap,
    key: InflightKey,
    entry: InflightEntry,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if inflight
            .get(&self.key)
            .is_some_and(|running| running.ptr_eq(&self.entry))
        {
            inflight.remove(&self.key);
        }
    }
}

#[derive(Clone)]
pub struct TranslationService {
    translator: FieldTranslator,
    store: Arc<dyn DocumentStore>,
    metrics: Arc<TranslationMetrics>,
    inflight: InflightMap,
}

impl TranslationService {
    pub fn new(client: ProviderClient, store: Arc<dyn DocumentStore>) -> Self {
        let metrics = Arc::clone(client.metrics());
        Self {
            translator: FieldTranslator::new(client),
            store,
            metrics,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn metrics(&self) -> &Arc<TranslationMetrics> {
        &self.metrics
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Serve `document` in `target`.
    ///
    /// Only a failed cache read is an error; provider and cache write
    /// failures degrade to original-language values.
    pub async fn translate_document(
        &self,
        document: Document,
        target: Language,
        kind: &str,
    ) -> Result<Document, TranslateError> {
        if target.is_canonical() {
            return Ok(document);
        }

        let fields = schema::fields_for(kind);
        if fields.is_empty() {
            debug!(kind, "No translatable fields for document kind");
            return Ok(document);
        }

        let id = document.id();

        if let Some(cached) = self
            .lookup_cached(&document, id.as_deref(), kind, target)
            .await?
        {
            self.metrics.record_cache_hit();
            debug!(kind, id = ?id, lang = %target, "Translation cache hit");
            let mut merged = document.merged(&cached);
            if merged.translation(target.code()).is_none() {
                merged.set_translation(target.code(), cached);
            }
            return Ok(merged);
        }
        self.metrics.record_cache_miss();

        match id {
            Some(id) => {
                let entry = self.compute_shared(kind, id, &document, fields, target).await;
                let mut merged = document.merged(&entry);
                merged.set_translation(target.code(), entry);
                Ok(merged)
            }
            None => {
                debug!(kind, lang = %target, "Document has no id, translation will not be cached");
                let values = compute(&self.translator, &document, fields, target).await;
                Ok(document.merged(&values))
            }
        }
    }

    /// Serve every document in `target`, concurrently, preserving order.
    pub async fn translate_documents(
        &self,
        documents: Vec<Document>,
        target: Language,
        kind: &str,
    ) -> Result<Vec<Document>, TranslateError> {
        if target.is_canonical() {
            return Ok(documents);
        }

        let count = documents.len();
        let translated = try_join_all(
            documents
                .into_iter()
                .map(|document| self.translate_document(document, target, kind)),
        )
        .await?;

        info!(kind, lang = %target, count, "Translated documents");
        Ok(translated)
    }

    /// Cached entry from the document itself, else from the store.
    async fn lookup_cached(
        &self,
        document: &Document,
        id: Option<&str>,
        kind: &str,
        target: Language,
    ) -> Result<Option<FieldMap>, TranslateError> {
        if let Some(cached) = read_cached(document, target) {
            return Ok(Some(cached.clone()));
        }
        let Some(id) = id else {
            return Ok(None);
        };
        self.store
            .cached_translation(kind, id, target.code())
            .await
            .map_err(TranslateError::from_store_read)
    }

    /// Compute and persist the entry for `(kind, id, target)`, joining an
    /// identical computation that is already running.
    async fn compute_shared(
        &self,
        kind: &str,
        id: String,
        document: &Document,
        fields: &'static [&'static str],
        target: Language,
    ) -> FieldMap {
        let key = InflightKey {
            kind: kind.to_string(),
            id: id.clone(),
            lang: target,
        };

        let guard = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = match inflight.get(&key) {
                Some(running) => {
                    debug!(kind, id = %id, lang = %target, "Joining in-flight translation");
                    running.clone()
                }
                None => {
                    let translator = self.translator.clone();
                    let store = Arc::clone(&self.store);
                    let metrics = Arc::clone(&self.metrics);
                    let document = document.clone();
                    let kind = kind.to_string();

                    let computation = async move {
                        let values = compute(&translator, &document, fields, target).await;
                        write_cached(store.as_ref(), &kind, &id, target, values, &metrics).await
                    }
                    .boxed()
                    .shared();

                    inflight.insert(key.clone(), computation.clone());
                    computation
                }
            };
            InflightGuard {
                inflight: Arc::clone(&self.inflight),
                key,
                entry,
            }
        };

        guard.entry.clone().await
    }
}

/// Translate every listed field that is present and non-empty.
async fn compute(
    translator: &FieldTranslator,
    document: &Document,
    fields: &[&str],
    target: Language,
) -> FieldMap {
    let pending = fields.iter().filter_map(|name| {
        document
            .get(name)
            .filter(|value| has_content(value))
            .map(|value| (*name, value.clone()))
    });

    join_all(pending.map(|(name, value)| async move {
        (name.to_string(), translator.translate_json(value, target).await)
    }))
    .await
    .into_iter()
    .collect()
}
