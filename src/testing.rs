//! Test doubles shared by the unit tests.

use crate::document::{Document, FieldMap};
use crate::error::{ProviderError, StoreError};
use crate::i18n::Language;
use crate::provider::TranslationProvider;
use crate::store::{DocumentStore, MemoryStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Provider backed by a lookup table. Unknown text is echoed with a
/// `[lang]` prefix; texts listed in `failing` always error.
#[derive(Default)]
pub struct MapProvider {
    table: HashMap<String, String>,
    failing: HashSet<String>,
    fail_all: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MapProvider {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            table: pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, texts: &[&str]) -> Self {
        self.failing = texts.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Sleep before answering, so concurrent requests overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn always_failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for MapProvider {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_all || self.failing.contains(text) {
            return Err(ProviderError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", target.code(), text)))
    }
}

/// [`MemoryStore`] wrapper that can be told to fail reads or writes and
/// counts store traffic.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: bool,
    corrupt_reads: bool,
    fail_writes: bool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Reads fail as if the stored body were not a JSON object.
    pub fn corrupt_reads(mut self) -> Self {
        self.corrupt_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn load(&self, kind: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        if self.corrupt_reads {
            let malformed = serde_json::from_value::<Document>(serde_json::json!([1, 2]))
                .expect_err("arrays are not documents");
            return Err(StoreError::Serialization(malformed));
        }
        self.inner.load(kind, id).await
    }

    async fn set_translation(
        &self,
        kind: &str,
        id: &str,
        lang: &str,
        entry: FieldMap,
    ) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.set_translation(kind, id, lang, entry).await
    }

    async fn upsert(&self, kind: &str, document: Document) -> Result<String, StoreError> {
        self.inner.upsert(kind, document).await
    }
}
