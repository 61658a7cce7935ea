//! HTTP API for browser hosts.
//!
//! Endpoints mirror what a web front end needs: scene composition, per-click
//! annotation, layout validation, catalog search, and a model proxy so
//! binary assets on hosts without CORS headers can still be fetched by the
//! browser. Download URLs returned by the search endpoint are rewritten to
//! go through the proxy.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::catalog::{self, ModelCatalog};
use crate::config::Config;
use crate::director::{AnnotationLevel, DirectorError, GeminiDirector, SceneDirector};
use crate::scene::SceneComposer;
use crate::scene::validator::ElementPlacement;

pub struct Server {
    config: Config,
}

struct AppState {
    composer: SceneComposer,
    director: Arc<dyn SceneDirector>,
    catalog: Arc<dyn ModelCatalog>,
    client: reqwest::Client,
    candidate_limit: usize,
    proxy_allow_hosts: Vec<String>,
}

impl Server {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    pub async fn run(&self) -> Result<()> {
        let director: Arc<dyn SceneDirector> =
            Arc::new(GeminiDirector::new(&self.config.director)?);
        let catalog = catalog::create_catalog(&self.config.catalog)?;
        let composer = SceneComposer::new(
            director.clone(),
            catalog.clone(),
            self.config.catalog.candidate_limit,
        );

        let state = Arc::new(AppState {
            composer,
            director,
            catalog,
            client: reqwest::Client::new(),
            candidate_limit: self.config.catalog.candidate_limit,
            proxy_allow_hosts: self.config.server.proxy_allow_hosts.clone(),
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = Router::new()
            .route("/api/compose", post(compose))
            .route("/api/annotate", post(annotate))
            .route("/api/validate-scene", post(validate_scene))
            .route("/api/search-models", get(search_models))
            .route("/api/proxy-model", get(proxy_model))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .with_context(|| format!("invalid listen address {}", self.config.server.host))?;
        info!("listening on http://{addr}");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let mut body = json!({ "error": error });
    if let Some(details) = details {
        body["details"] = json!(details);
    }
    (status, Json(body)).into_response()
}

fn director_error_response(context: &str, err: DirectorError) -> Response {
    warn!(context, error = %err, "director request failed");
    error_response(StatusCode::BAD_GATEWAY, context, Some(err.to_string()))
}

// -- handlers ----------------------------------------------------------------

#[derive(Deserialize)]
struct ComposeRequest {
    query: String,
}

async fn compose(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ComposeRequest>,
) -> Response {
    if request.query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Query is required", None);
    }

    match state
        .composer
        .compose_from_query(&request.query, |_| {})
        .await
    {
        Ok(scene) => Json(scene).into_response(),
        Err(err) => director_error_response("Failed to compose scene", err),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateRequest {
    object_name: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    level: Option<AnnotationLevel>,
}

async fn annotate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnnotateRequest>,
) -> Response {
    if request.object_name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "objectName is required", None);
    }

    let context = request
        .context
        .unwrap_or_else(|| "Exploring a 3D scene".to_string());
    match state
        .director
        .annotate_object(
            &request.object_name,
            &context,
            request.level.unwrap_or_default(),
        )
        .await
    {
        Ok(annotation) => Json(annotation).into_response(),
        Err(err) => director_error_response("Annotation failed", err),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateRequest {
    elements: Vec<ElementPlacement>,
    scene_goal: String,
}

async fn validate_scene(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRequest>,
) -> Response {
    if request.elements.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Elements are required", None);
    }

    match state
        .director
        .validate_layout(&request.elements, &request.scene_goal)
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(err) => director_error_response("Scene validation failed", err),
    }
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
    limit: Option<usize>,
}

async fn search_models(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    if params.q.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Query parameter \"q\" is required", None);
    }

    let limit = params.limit.unwrap_or(state.candidate_limit).max(1);
    match state.catalog.search(&params.q, limit).await {
        Ok(mut outcome) => {
            for model in &mut outcome.models {
                model.download_url = rewrite_download_url(&model.download_url);
            }
            Json(outcome).into_response()
        }
        Err(err) => {
            warn!(query = %params.q, error = %format!("{err:#}"), "catalog search failed");
            error_response(
                StatusCode::BAD_GATEWAY,
                "Failed to search models",
                Some(format!("{err:#}")),
            )
        }
    }
}

/// GitHub raw URLs are CORS-enabled and fetchable directly; everything else
/// goes through the proxy.
fn rewrite_download_url(url: &str) -> String {
    if url.contains("raw.githubusercontent.com") {
        url.to_string()
    } else {
        format!("/api/proxy-model?url={}", urlencoding::encode(url))
    }
}

#[derive(Deserialize)]
struct ProxyParams {
    url: String,
}

async fn proxy_model(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProxyParams>,
) -> Response {
    let url = match reqwest::Url::parse(&params.url) {
        Ok(url) => url,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid url parameter", None),
    };

    if !matches!(url.scheme(), "http" | "https") {
        return error_response(StatusCode::BAD_REQUEST, "Unsupported url scheme", None);
    }
    if !host_allowed(&url, &state.proxy_allow_hosts) {
        return error_response(
            StatusCode::FORBIDDEN,
            "Domain not allowed",
            url.host_str().map(str::to_string),
        );
    }

    match state.client.get(url).send().await {
        Ok(upstream) if upstream.status().is_success() => {
            let content_type = upstream
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("model/gltf-binary")
                .to_string();

            let body = Body::from_stream(upstream.bytes_stream());
            match Response::builder()
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CACHE_CONTROL, "public, max-age=86400")
                .body(body)
            {
                Ok(response) => response,
                Err(err) => error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to build proxy response",
                    Some(err.to_string()),
                ),
            }
        }
        Ok(upstream) => error_response(
            StatusCode::BAD_GATEWAY,
            "Upstream fetch failed",
            Some(format!("status {}", upstream.status())),
        ),
        Err(err) => error_response(
            StatusCode::BAD_GATEWAY,
            "Upstream fetch failed",
            Some(err.to_string()),
        ),
    }
}

fn host_allowed(url: &reqwest::Url, allowed: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    allowed
        .iter()
        .any(|domain| host == domain || host.ends_with(&format!(".{domain}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowlist() -> Vec<String> {
        vec![
            "static.poly.pizza".to_string(),
            "raw.githubusercontent.com".to_string(),
        ]
    }

    #[test]
    fn allowlisted_hosts_pass() {
        let url = reqwest::Url::parse("https://static.poly.pizza/model.glb").unwrap();
        assert!(host_allowed(&url, &allowlist()));
    }

    #[test]
    fn subdomains_of_allowlisted_hosts_pass() {
        let url = reqwest::Url::parse("https://cdn.static.poly.pizza/model.glb").unwrap();
        assert!(host_allowed(&url, &allowlist()));
    }

    #[test]
    fn other_hosts_are_rejected() {
        let url = reqwest::Url::parse("https://evil.example.com/model.glb").unwrap();
        assert!(!host_allowed(&url, &allowlist()));

        // Prefix tricks don't count as subdomains.
        let url = reqwest::Url::parse("https://notstatic.poly.pizza.example.com/x.glb").unwrap();
        assert!(!host_allowed(&url, &allowlist()));
    }

    #[test]
    fn github_raw_urls_are_left_direct() {
        let url = "https://raw.githubusercontent.com/KhronosGroup/x/main/Fox.glb";
        assert_eq!(rewrite_download_url(url), url);
    }

    #[test]
    fn other_urls_are_rewritten_through_the_proxy() {
        let rewritten = rewrite_download_url("https://static.poly.pizza/abc.glb");
        assert!(rewritten.starts_with("/api/proxy-model?url="));
        assert!(rewritten.contains("static.poly.pizza%2Fabc.glb"));
    }
}
