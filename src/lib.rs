//! Translation caching service for dashboard documents.
//!
//! Documents are translated field by field through an external provider and
//! the result is cached on the document under `translations.{lang}`, so a
//! (document, language) pair is paid for once.

pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod field;
pub mod i18n;
pub mod openai;
pub mod provider;
pub mod schema;
pub mod security;
pub mod server;
pub mod store;
pub mod translator;

#[cfg(test)]
pub(crate) mod testing;
