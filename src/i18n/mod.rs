//! Supported languages, language resolution and translation metrics.
//!
//! - `registry`: single source of truth for supported languages
//! - `language`: validated `Language` handle
//! - `resolver`: picks the language to serve from request signals
//! - `metrics`: cache and provider counters

mod language;
mod metrics;
mod registry;
pub mod resolver;

pub use language::Language;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use resolver::{resolve, LanguageSignals};
