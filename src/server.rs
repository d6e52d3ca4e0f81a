//! HTTP surface: resolves the requested language, hands documents to the
//! translation service and wraps the result with the language served.

use crate::document::Document;
use crate::error::TranslateError;
use crate::i18n::{resolve, Language, LanguageRegistry, LanguageSignals, MetricsReport};
use crate::schema;
use crate::security::is_authorized;
use crate::translator::{TranslatedDocument, TranslatedDocuments, TranslationService};
use axum::{
    extract::{Path, Query, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub struct AppState {
    pub service: TranslationService,
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

/// Single or batch translation result.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TranslateResponse {
    One(TranslatedDocument),
    Many(TranslatedDocuments),
}

type ApiError = (StatusCode, Json<Value>);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/translate/:kind", post(translate))
        .route("/documents/:kind/:id", get(get_document))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness plus what this instance can serve.
async fn health() -> Json<Value> {
    let languages: Vec<&str> = LanguageRegistry::get()
        .list_enabled()
        .into_iter()
        .map(|lang| lang.code)
        .collect();
    let kinds: Vec<&str> = schema::kinds().collect();
    Json(json!({"status": "ok", "languages": languages, "kinds": kinds}))
}

async fn metrics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MetricsReport>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(state.service.metrics().report()))
}

async fn translate(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<TranslateResponse>, ApiError> {
    authorize(&state, &headers)?;
    let language = requested_language(&query, &headers);

    match body {
        Value::Array(items) => {
            let documents = items
                .into_iter()
                .map(Document::from_value)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| bad_request("every element must be a JSON object"))?;

            let documents = state
                .service
                .translate_documents(documents, language, &kind)
                .await
                .map_err(translate_error)?;

            Ok(Json(TranslateResponse::Many(TranslatedDocuments {
                language,
                documents,
            })))
        }
        other => {
            let document = Document::from_value(other)
                .ok_or_else(|| bad_request("body must be a JSON object or array of objects"))?;

            let document = state
                .service
                .translate_document(document, language, &kind)
                .await
                .map_err(translate_error)?;

            Ok(Json(TranslateResponse::One(TranslatedDocument {
                language,
                document,
            })))
        }
    }
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> Result<Json<TranslatedDocument>, ApiError> {
    authorize(&state, &headers)?;
    let language = requested_language(&query, &headers);

    let document = state
        .service
        .store()
        .load(&kind, &id)
        .await
        .map_err(|e| translate_error(TranslateError::from_store_read(e)))?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({"error": format!("document {}/{} not found", kind, id)})),
            )
        })?;

    let document = state
        .service
        .translate_document(document, language, &kind)
        .await
        .map_err(translate_error)?;

    Ok(Json(TranslatedDocument { language, document }))
}

fn requested_language(query: &LangQuery, headers: &HeaderMap) -> Language {
    let locale_header = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    resolve(&LanguageSignals::new(query.lang.as_deref(), locale_header))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if is_authorized(state.api_key.as_deref(), headers) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "missing or invalid API key"})),
        ))
    }
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}

fn translate_error(error: TranslateError) -> ApiError {
    warn!(error = %error, "Translation request failed");
    let status = if error.is_retryable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(json!({"error": error.to_string()})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::TranslationMetrics;
    use crate::provider::ProviderClient;
    use crate::store::{DocumentStore, MemoryStore};
    use crate::testing::{FlakyStore, MapProvider};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(store: Arc<dyn DocumentStore>, api_key: Option<&str>) -> Router {
        let provider = Arc::new(MapProvider::new(&[("Hello", "Hola"), ("a", "A"), ("b", "B")]));
        let client = ProviderClient::new(provider, Arc::new(TranslationMetrics::new()));
        router(Arc::new(AppState {
            service: TranslationService::new(client, store),
            api_key: api_key.map(str::to_string),
        }))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(MemoryStore::new()), None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "status": "ok",
                "languages": ["en", "es", "zh", "hi", "ar"],
                "kinds": ["abilities", "sessions", "enrichments"]
            })
        );
    }

    #[tokio::test]
    async fn test_translate_single_document_with_query_language() {
        let response = app(Arc::new(MemoryStore::new()), None)
            .oneshot(post_json(
                "/translate/enrichments?lang=es",
                json!({"headline": "Hello", "tags": ["a", "b"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["language"], "es");
        assert_eq!(body["document"], json!({"headline": "Hola", "tags": ["A", "B"]}));
    }

    #[tokio::test]
    async fn test_translate_batch_uses_accept_language() {
        let request = Request::builder()
            .method("POST")
            .uri("/translate/enrichments")
            .header("content-type", "application/json")
            .header("accept-language", "es-MX,es;q=0.9")
            .body(Body::from(
                json!([{"headline": "Hello"}, {"headline": "a"}]).to_string(),
            ))
            .unwrap();

        let response = app(Arc::new(MemoryStore::new()), None)
            .oneshot(request)
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["language"], "es");
        assert_eq!(
            body["documents"],
            json!([{"headline": "Hola"}, {"headline": "A"}])
        );
    }

    #[tokio::test]
    async fn test_unsupported_language_serves_english() {
        let response = app(Arc::new(MemoryStore::new()), None)
            .oneshot(post_json(
                "/translate/enrichments?lang=fr",
                json!({"headline": "Hello"}),
            ))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["language"], "en");
        assert_eq!(body["document"]["headline"], "Hello");
    }

    #[tokio::test]
    async fn test_translate_rejects_non_object_elements() {
        let response = app(Arc::new(MemoryStore::new()), None)
            .oneshot(post_json("/translate/enrichments?lang=es", json!([1, 2])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_document_translates_stored_document() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert(
                "enrichments",
                Document::from_value(json!({"id": "e1", "headline": "Hello"})).unwrap(),
            )
            .await
            .unwrap();

        let response = app(store.clone(), None)
            .oneshot(
                Request::get("/documents/enrichments/e1?lang=es")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["document"]["headline"], "Hola");
        let stored = store.load("enrichments", "e1").await.unwrap().unwrap();
        assert_eq!(stored.translation("es").unwrap()["headline"], "Hola");
    }

    #[tokio::test]
    async fn test_get_document_not_found() {
        let response = app(Arc::new(MemoryStore::new()), None)
            .oneshot(
                Request::get("/documents/enrichments/missing?lang=es")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_outage_is_service_unavailable() {
        let response = app(Arc::new(FlakyStore::new().failing_reads()), None)
            .oneshot(post_json(
                "/translate/enrichments?lang=es",
                json!({"id": 1, "headline": "Hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_corrupt_stored_document_is_internal_error() {
        let response = app(Arc::new(FlakyStore::new().corrupt_reads()), None)
            .oneshot(
                Request::get("/documents/enrichments/e1?lang=es")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("corrupt"));
    }

    #[tokio::test]
    async fn test_api_key_required_when_configured() {
        let app = app(Arc::new(MemoryStore::new()), Some("secret"));

        let denied = app
            .clone()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = app
            .oneshot(
                Request::get("/metrics")
                    .header("x-api-key", "secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(body_json(allowed).await["cache_hits"], 0);
    }
}
