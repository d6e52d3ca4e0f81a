//! Which fields of each document kind are worth translating.

/// Kind -> translatable fields, in translation order.
const SCHEMAS: &[(&str, &[&str])] = &[
    (
        "abilities",
        &["name", "description", "category", "tags", "prerequisites"],
    ),
    (
        "sessions",
        &["title", "summary", "notes", "techniques", "observations"],
    ),
    ("enrichments", &["headline", "body", "tags"]),
];

/// Translatable fields for `kind`. Unknown kinds have none.
pub fn fields_for(kind: &str) -> &'static [&'static str] {
    SCHEMAS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

/// All registered document kinds.
pub fn kinds() -> impl Iterator<Item = &'static str> {
    SCHEMAS.iter().map(|(name, _)| *name)
}
