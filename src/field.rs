//! Field translator: walks a field value and translates every leaf string.
//!
//! Values are lifted into [`FieldValue`] so the dispatch is exhaustive. Each
//! leaf is translated independently; a leaf whose provider call fails keeps
//! its original text, so the walk itself never fails and always returns a
//! value of the same shape.

use crate::i18n::Language;
use crate::provider::ProviderClient;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde_json::{Map, Value};

/// Shape of a document field, as far as translation is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    /// Ordered list whose elements are all strings
    List(Vec<String>),
    /// Nested string-keyed map
    Fields(Vec<(String, FieldValue)>),
    /// Anything else; passed through untouched
    Opaque(Value),
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => FieldValue::Scalar(text),
            Value::Array(items) if items.iter().all(Value::is_string) => FieldValue::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(text) => Some(text),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::Object(entries) => FieldValue::Fields(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, FieldValue::from(value)))
                    .collect(),
            ),
            other => FieldValue::Opaque(other),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Scalar(text) => Value::String(text),
            FieldValue::List(items) => Value::Array(items.into_iter().map(Value::String).collect()),
            FieldValue::Fields(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect::<Map<String, Value>>(),
            ),
            FieldValue::Opaque(value) => value,
        }
    }
}

#[derive(Clone)]
pub struct FieldTranslator {
    client: ProviderClient,
}

impl FieldTranslator {
    pub fn new(client: ProviderClient) -> Self {
        Self { client }
    }

    /// Translate every leaf string of `value` into `target`.
    pub fn translate_value(&self, value: FieldValue, target: Language) -> BoxFuture<'_, FieldValue> {
        async move {
            match value {
                FieldValue::Scalar(text) => FieldValue::Scalar(self.translate_leaf(text, target).await),
                FieldValue::List(items) => FieldValue::List(
                    join_all(items.into_iter().map(|item| self.translate_leaf(item, target))).await,
                ),
                FieldValue::Fields(entries) => {
                    FieldValue::Fields(
                        join_all(entries.into_iter().map(|(key, value)| async move {
                            let translated = self.translate_value(value, target).await;
                            (key, translated)
                        }))
                        .await,
                    )
                }
                FieldValue::Opaque(value) => FieldValue::Opaque(value),
            }
        }
        .boxed()
    }

    /// Convenience wrapper over [`translate_value`](Self::translate_value) for raw JSON.
    pub async fn translate_json(&self, value: Value, target: Language) -> Value {
        self.translate_value(FieldValue::from(value), target)
            .await
            .into()
    }

    async fn translate_leaf(&self, text: String, target: Language) -> String {
        match self.client.translate(&text, target).await {
            Ok(translated) => translated,
            // Already logged and counted by the client
            Err(_) => text,
        }
    }
}
