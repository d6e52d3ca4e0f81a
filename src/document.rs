//! Documents as stored by the dashboard: a JSON object with an `id`, original
//! fields, and an optional per-language `translations` cache.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ID_KEY: &str = "id";
pub const TRANSLATIONS_KEY: &str = "translations";

/// Timestamp key written inside each `translations.{lang}` entry.
pub const COMPUTED_AT_KEY: &str = "computedAt";

/// Field name -> value, as held in a document or a translation entry.
pub type FieldMap = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(FieldMap);

impl Document {
    /// Wrap a JSON value; `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Stable identifier as a string key. Numeric ids are rendered in
    /// decimal; missing, empty or non-scalar ids yield `None`.
    pub fn id(&self) -> Option<String> {
        match self.0.get(ID_KEY)? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// The cached translation entry for `lang`, if one has been computed.
    pub fn translation(&self, lang: &str) -> Option<&FieldMap> {
        self.0
            .get(TRANSLATIONS_KEY)?
            .as_object()?
            .get(lang)?
            .as_object()
    }

    /// Store `entry` under `translations.{lang}`, leaving every other
    /// language and every original field as it was.
    pub fn set_translation(&mut self, lang: &str, entry: FieldMap) {
        let translations = self
            .0
            .entry(TRANSLATIONS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !translations.is_object() {
            *translations = Value::Object(Map::new());
        }
        if let Value::Object(translations) = translations {
            translations.insert(lang.to_string(), Value::Object(entry));
        }
    }

    /// Shallow copy with every original field named in `values` replaced by
    /// its translated value. The timestamp key and keys the document does
    /// not have are ignored, so the key set never changes.
    pub fn merged(&self, values: &FieldMap) -> Document {
        let mut merged = self.0.clone();
        for (key, value) in values {
            if key == COMPUTED_AT_KEY || key == ID_KEY || key == TRANSLATIONS_KEY {
                continue;
            }
            if let Some(slot) = merged.get_mut(key) {
                *slot = value.clone();
            }
        }
        Document(merged)
    }
}

/// Whether a field value carries anything worth sending to the provider.
pub fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
