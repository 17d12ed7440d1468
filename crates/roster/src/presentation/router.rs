use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{cards, search, spotlight_sets, CatalogRefinement, ModelCard, ModelDetail, SPOTLIGHT_SET_SIZE};
use crate::catalog::{merge_sources, CatalogReconciler, CatalogSource, SourceStatus};

pub const DATABASE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-database-status");
pub const MODELS_COUNT_HEADER: HeaderName = HeaderName::from_static("x-models-count");
pub const CATALOG_MERGE_HEADER: HeaderName = HeaderName::from_static("x-catalog-merge");

/// Router exposing the catalog, model pages and search.
pub fn catalog_router<S>(reconciler: Arc<CatalogReconciler<S>>) -> Router
where
    S: CatalogSource + 'static,
{
    Router::new()
        .route("/api/models", get(models_handler::<S>))
        .route("/api/v1/catalog", get(catalog_handler::<S>))
        .route("/api/v1/catalog/spotlight", get(spotlight_handler::<S>))
        .route("/api/v1/models/:slug", get(model_handler::<S>))
        .route("/api/v1/search", get(search_handler::<S>))
        .with_state(reconciler)
}

fn status_header(status: SourceStatus) -> (HeaderName, HeaderValue) {
    (
        DATABASE_STATUS_HEADER,
        HeaderValue::from_static(status.header_value()),
    )
}

/// Raw dynamic catalog, `[]` when the store is unavailable.
pub(crate) async fn models_handler<S>(State(reconciler): State<Arc<CatalogReconciler<S>>>) -> Response
where
    S: CatalogSource + 'static,
{
    let catalog = reconciler.dynamic_catalog().await;
    let mut response = (
        StatusCode::OK,
        [status_header(catalog.status)],
        Json(&catalog.records),
    )
        .into_response();

    if catalog.status == SourceStatus::Success {
        response
            .headers_mut()
            .insert(MODELS_COUNT_HEADER, HeaderValue::from(catalog.records.len()));
    }
    response
}

pub(crate) async fn catalog_handler<S>(State(reconciler): State<Arc<CatalogReconciler<S>>>) -> Response
where
    S: CatalogSource + 'static,
{
    let catalog = reconciler.build().await;
    (
        StatusCode::OK,
        [
            status_header(catalog.source_status),
            (
                CATALOG_MERGE_HEADER,
                HeaderValue::from_static(catalog.outcome.header_value()),
            ),
        ],
        Json(cards(&catalog.records)),
    )
        .into_response()
}

pub(crate) async fn spotlight_handler<S>(
    State(reconciler): State<Arc<CatalogReconciler<S>>>,
) -> Json<Vec<Vec<ModelCard>>>
where
    S: CatalogSource + 'static,
{
    let catalog = reconciler.build().await;
    Json(spotlight_sets(&cards(&catalog.records), SPOTLIGHT_SET_SIZE))
}

pub(crate) async fn model_handler<S>(
    State(reconciler): State<Arc<CatalogReconciler<S>>>,
    Path(slug): Path<String>,
) -> Response
where
    S: CatalogSource + 'static,
{
    match reconciler.model_by_slug(&slug).await {
        Some(record) => (StatusCode::OK, Json(ModelDetail::from(&record))).into_response(),
        None => {
            let payload = json!({ "error": format!("model '{slug}' not found") });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchResponse {
    query: String,
    count: usize,
    results: Vec<ModelCard>,
}

/// Searches the first-paint list refined with the dynamic payload.
pub(crate) async fn search_handler<S>(
    State(reconciler): State<Arc<CatalogReconciler<S>>>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse>
where
    S: CatalogSource + 'static,
{
    let rendered = merge_sources(reconciler.snapshot().records(), Vec::new()).records;
    let mut refinement = CatalogRefinement::new(reconciler.attach_media(rendered));

    let dynamic = reconciler.dynamic_catalog().await;
    let fetched = match dynamic.status {
        SourceStatus::Success => Ok(dynamic.records),
        status => Err(status.header_value()),
    };
    refinement.apply(fetched);

    let matches: Vec<_> = search(refinement.records(), &params.q)
        .into_iter()
        .cloned()
        .collect();
    let results = cards(&matches);
    Json(SearchResponse {
        query: params.q.trim().to_string(),
        count: results.len(),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MediaDiscovery, ModelRecord, ModelStats, SourceError, StaticCatalog};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct FakeSource(Option<Vec<ModelRecord>>);

    impl CatalogSource for FakeSource {
        async fn fetch_models(&self) -> Result<Vec<ModelRecord>, SourceError> {
            self.0
                .clone()
                .ok_or_else(|| SourceError::Connect("connection refused".to_string()))
        }
    }

    fn model(id: &str, slug: &str, name: &str) -> ModelRecord {
        ModelRecord {
            id: id.to_string(),
            slug: slug.to_string(),
            name: name.to_string(),
            stats: ModelStats::default(),
            instagram: None,
            featured_image: String::new(),
            gallery: Vec::new(),
        }
    }

    fn app(dynamic: Option<Vec<ModelRecord>>) -> Router {
        let snapshot = StaticCatalog::new(vec![
            model("2", "bo", "Bo Chen"),
            model("1", "ana", "Ana Lima"),
        ])
        .expect("snapshot");
        let media = tempfile::tempdir().expect("tempdir");
        let reconciler = CatalogReconciler::new(
            Arc::new(FakeSource(dynamic)),
            Arc::new(snapshot),
            MediaDiscovery::new(media.path().join("models"), "/models"),
        );
        catalog_router(Arc::new(reconciler))
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn models_endpoint_reports_connection_failure() {
        let response = get(app(None), "/api/models").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[DATABASE_STATUS_HEADER], "connection-failed");
        assert!(response.headers().get(MODELS_COUNT_HEADER).is_none());
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn models_endpoint_counts_dynamic_records() {
        let response = get(app(Some(vec![model("9", "cy", "Cy")])), "/api/models").await;
        assert_eq!(response.headers()[DATABASE_STATUS_HEADER], "success");
        assert_eq!(response.headers()[MODELS_COUNT_HEADER], "1");
        assert_eq!(body_json(response).await[0]["slug"], "cy");
    }

    #[tokio::test]
    async fn catalog_falls_back_to_snapshot() {
        let response = get(app(None), "/api/v1/catalog").await;
        assert_eq!(response.headers()[CATALOG_MERGE_HEADER], "static-only");
        let body = body_json(response).await;
        assert_eq!(body[0]["slug"], "ana");
        assert_eq!(body[0]["href"], "/models/ana/");
        assert_eq!(body[1]["slug"], "bo");
    }

    #[tokio::test]
    async fn catalog_merges_partial_dynamic_payload() {
        let response = get(app(Some(vec![model("2", "bo", "Bo Updated")])), "/api/v1/catalog").await;
        assert_eq!(response.headers()[CATALOG_MERGE_HEADER], "merged-by-slug");
        assert_eq!(body_json(response).await[1]["name"], "Bo Updated");
    }

    #[tokio::test]
    async fn model_page_and_missing_model() {
        let response = get(app(None), "/api/v1/models/ana").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "Ana Lima");

        let response = get(app(None), "/api/v1/models/nobody").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn spotlight_returns_padded_sets() {
        let body = body_json(get(app(None), "/api/v1/catalog/spotlight").await).await;
        let set = body[0].as_array().expect("set");
        assert_eq!(set.len(), 3);
        assert_eq!(set[2]["slug"], "ana");
    }

    #[tokio::test]
    async fn search_uses_refined_catalog() {
        let dynamic = Some(vec![model("2", "bo", "Bo Updated")]);
        let body = body_json(get(app(dynamic), "/api/v1/search?q=updated").await).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["slug"], "bo");

        let body = body_json(get(app(None), "/api/v1/search?q=").await).await;
        assert_eq!(body["count"], 0);
    }
}
