//! Provider client: the only place the core talks to the external
//! translation service.
//!
//! Every call goes through a semaphore so a request that fans out to many
//! leaves cannot flood the provider, and through a timeout so a hanging call
//! fails one leaf instead of stalling the request. Calls are never retried.

use crate::error::ProviderError;
use crate::i18n::{Language, TranslationMetrics};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// An external service that translates one string at a time.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> Result<String, ProviderError>;
}

/// Rate-limited, time-bounded handle to a [`TranslationProvider`].
#[derive(Clone)]
pub struct ProviderClient {
    provider: Arc<dyn TranslationProvider>,
    limiter: Arc<Semaphore>,
    timeout: Duration,
    source: Language,
    metrics: Arc<TranslationMetrics>,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn TranslationProvider>, metrics: Arc<TranslationMetrics>) -> Self {
        Self {
            provider,
            limiter: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENCY)),
            timeout: DEFAULT_TIMEOUT,
            source: Language::canonical(),
            metrics,
        }
    }

    /// Cap the number of provider calls in flight at once (minimum 1).
    pub fn with_max_concurrency(mut self, permits: usize) -> Self {
        self.limiter = Arc::new(Semaphore::new(permits.max(1)));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn metrics(&self) -> &Arc<TranslationMetrics> {
        &self.metrics
    }

    /// Translate one string into `target`.
    ///
    /// Canonical or source targets and blank text are returned unchanged
    /// without a network call.
    pub async fn translate(&self, text: &str, target: Language) -> Result<String, ProviderError> {
        if target.is_canonical() || target == self.source || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ProviderError::Closed)?;

        self.metrics.record_provider_call();
        debug!(lang = %target, chars = text.len(), "Calling translation provider");

        let result = match tokio::time::timeout(self.timeout, self.provider.translate(text, target))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };

        if let Err(e) = &result {
            self.metrics.record_provider_failure();
            warn!(lang = %target, error = %e, "Translation provider call failed");
        }
        result
    }
}
