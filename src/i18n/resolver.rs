//! Resolves the language to serve from the signals a caller supplies.

use crate::i18n::{Language, LanguageRegistry};
use tracing::debug;

/// Caller-supplied language signals, in priority order.
#[derive(Debug, Clone, Default)]
pub struct LanguageSignals<'a> {
    /// Explicit request parameter (e.g. `?lang=es`)
    pub explicit: Option<&'a str>,
    /// Raw locale header value (e.g. `es-MX,es;q=0.9`)
    pub locale_header: Option<&'a str>,
}

impl<'a> LanguageSignals<'a> {
    pub fn new(explicit: Option<&'a str>, locale_header: Option<&'a str>) -> Self {
        Self {
            explicit,
            locale_header,
        }
    }
}

/// Pick the language to serve. Never fails: unusable signals fall back to the
/// canonical language.
pub fn resolve(signals: &LanguageSignals<'_>) -> Language {
    if let Some(language) = signals.explicit.and_then(lookup) {
        return language;
    }

    if let Some(language) = signals
        .locale_header
        .map(primary_subtag)
        .and_then(|tag| lookup(&tag))
    {
        return language;
    }

    debug!(
        explicit = ?signals.explicit,
        locale_header = ?signals.locale_header,
        "No supported language signal, serving canonical language"
    );
    Language::canonical()
}

fn lookup(code: &str) -> Option<Language> {
    let code = code.trim().to_lowercase();
    if !LanguageRegistry::get().is_enabled(&code) {
        return None;
    }
    Language::from_code(&code).ok()
}

/// Token before the first separator of a locale header, lower-cased.
fn primary_subtag(header: &str) -> String {
    header
        .trim()
        .split(|c: char| matches!(c, '-' | '_' | ',' | ';') || c.is_whitespace())
        .next()
        .unwrap_or("")
        .to_lowercase()
}
