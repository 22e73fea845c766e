// HTTP REST API Server Implementation
// Read-only JSON API over the key dataset plus media file streaming

use anyhow::Result;
use axum::{
    extract::{Path, Query as AxumQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    config::ApiConfig,
    observability::with_trace_id,
    repository::{CollectionListingRow, GroupListingRow, KeyStore, OrganizationRow},
    services::{KeyService, MediaFileError, MediaService, MediaVariantKind, MetadataService},
    shaping::{KeyDetail, KeyInfo, KeyListEntry},
    types::{Language, ValidatedKeyId, ValidatedMediaId, ValidatedRevisionId},
};

// Global server start time for uptime tracking
static SERVER_START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    keys: KeyService,
    media: MediaService,
    metadata: MetadataService,
    config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(store: KeyStore, config: Arc<ApiConfig>) -> Self {
        let media = MediaService::new(store.clone(), config.clone());
        let keys = KeyService::new(store.clone(), media.clone(), config.clone());
        let metadata = MetadataService::new(store);
        Self {
            keys,
            media,
            metadata,
            config,
        }
    }
}

/// Query parameters for language-filtered endpoints
#[derive(Debug, Deserialize)]
pub struct LanguageParams {
    pub language: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Key info response: one object when a language is given, otherwise the
/// [no, en] pair with per-language misses left as null
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum KeyInfoResponse {
    Single(Box<KeyInfo>),
    Pair([Option<KeyInfo>; 2]),
}

/// Create HTTP server with all routes configured
pub fn create_server(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .route("/health", get(health_check))
        .route("/keys", get(list_keys))
        .route("/keys/:key_id", get(get_key))
        .route("/keys/info/:key_id", get(get_key_info))
        .route("/keys/revision/:revision_id", get(get_key_by_revision))
        .route("/metadata/organizations", get(list_organizations))
        .route("/metadata/groups", get(list_groups))
        .route("/metadata/collections", get(list_collections))
        .route("/media/:media_id", get(get_media_file))
        .route("/media/thumbnails/:media_id", get(get_media_thumbnail))
        .with_state(state);

    let router = match config.mount_path() {
        Some(prefix) => Router::new().nest(prefix, api),
        None => api,
    };

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

/// Start the HTTP server on the configured port
pub async fn start_server(state: AppState) -> Result<()> {
    let port = state.config.port;
    let app = create_server(state);
    let listener = TcpListener::bind(&format!("0.0.0.0:{port}")).await?;

    info!("keyapi HTTP server starting on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    let uptime_seconds = SERVER_START_TIME.elapsed().as_secs();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
    })
}

/// Get the list of publicly visible keys
async fn list_keys(
    State(state): State<AppState>,
) -> Result<Json<Vec<KeyListEntry>>, (StatusCode, Json<ErrorResponse>)> {
    let result = with_trace_id("list_keys", async move { state.keys.list_keys().await }).await;

    match result {
        Ok(keys) => Ok(Json(keys)),
        Err(e) => {
            warn!("Could not get key list: {:#}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "Could not get key list".to_string(),
                }),
            ))
        }
    }
}

/// Get one key by ID
async fn get_key(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
) -> Result<Json<KeyDetail>, (StatusCode, Json<ErrorResponse>)> {
    let key_id = match ValidatedKeyId::parse(&key_id) {
        Ok(id) => id,
        Err(_) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "invalid_id".to_string(),
                    message: "Key ID must be a version 4 UUID".to_string(),
                }),
            ));
        }
    };

    let result = with_trace_id("get_key", async move {
        state.keys.key_by_id(key_id.as_uuid(), None).await
    })
    .await;

    match result {
        Ok(Some(key)) => Ok(Json(key)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "key_not_found".to_string(),
                message: format!("Key with ID {key_id} not found"),
            }),
        )),
        Err(e) => {
            warn!("Could not get key {}: {:#}", key_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "Could not get key".to_string(),
                }),
            ))
        }
    }
}

/// Get key info by ID, for one language or for the [no, en] pair
async fn get_key_info(
    State(state): State<AppState>,
    Path(key_id): Path<String>,
    AxumQuery(params): AxumQuery<LanguageParams>,
) -> Result<Json<KeyInfoResponse>, (StatusCode, Json<ErrorResponse>)> {
    let key_id = match ValidatedKeyId::parse(&key_id) {
        Ok(id) => id,
        Err(_) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "invalid_id".to_string(),
                    message: "Key ID must be a version 4 UUID".to_string(),
                }),
            ));
        }
    };

    let language = match params.language.as_deref() {
        Some(raw) => match raw.parse::<Language>() {
            Ok(language) => Some(language),
            Err(_) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "invalid_language".to_string(),
                        message: "Language must be one of: no, en".to_string(),
                    }),
                ));
            }
        },
        None => None,
    };

    let result = with_trace_id("get_key_info", async move {
        match language {
            Some(language) => {
                let info = state.keys.key_info(key_id.as_uuid(), language).await?;
                Ok(info.map(|i| KeyInfoResponse::Single(Box::new(i))))
            }
            None => {
                // No language requested: return both variants as a pair,
                // each allowed to miss independently
                let (no, en) = tokio::try_join!(
                    state.keys.key_info(key_id.as_uuid(), Language::No),
                    state.keys.key_info(key_id.as_uuid(), Language::En),
                )?;
                Ok(Some(KeyInfoResponse::Pair([no, en])))
            }
        }
    })
    .await;

    match result {
        Ok(Some(response)) => Ok(Json(response)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "key_not_found".to_string(),
                message: format!("Key with ID {key_id} not found"),
            }),
        )),
        Err(e) => {
            warn!("Could not get key info {}: {:#}", key_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "Could not get key info".to_string(),
                }),
            ))
        }
    }
}

/// Get one key by revision ID
async fn get_key_by_revision(
    State(state): State<AppState>,
    Path(revision_id): Path<String>,
) -> Result<Json<KeyDetail>, (StatusCode, Json<ErrorResponse>)> {
    let revision_id = match ValidatedRevisionId::parse(&revision_id) {
        Ok(id) => id,
        Err(_) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "invalid_id".to_string(),
                    message: "Revision ID must be a version 4 UUID".to_string(),
                }),
            ));
        }
    };

    let result = with_trace_id("get_key_by_revision", async move {
        let Some(key_id) = state.keys.revision_key_id(revision_id.as_uuid()).await? else {
            return Ok(None);
        };
        state
            .keys
            .key_by_id(key_id, Some(revision_id.as_uuid()))
            .await
    })
    .await;

    match result {
        Ok(Some(key)) => Ok(Json(key)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "revision_not_found".to_string(),
                message: format!("Revision with ID {revision_id} not found"),
            }),
        )),
        Err(e) => {
            warn!("Could not get key revision {}: {:#}", revision_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "Could not get key revision".to_string(),
                }),
            ))
        }
    }
}

fn require_language(
    params: &LanguageParams,
) -> Result<Language, (StatusCode, Json<ErrorResponse>)> {
    let raw = params.language.as_deref().ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "missing_language".to_string(),
                message: "Query parameter 'language' is required".to_string(),
            }),
        )
    })?;
    raw.parse::<Language>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_language".to_string(),
                message: "Language must be one of: no, en".to_string(),
            }),
        )
    })
}

/// Get the organization listing for one language
async fn list_organizations(
    State(state): State<AppState>,
    AxumQuery(params): AxumQuery<LanguageParams>,
) -> Result<Json<Vec<OrganizationRow>>, (StatusCode, Json<ErrorResponse>)> {
    let language = require_language(&params)?;

    let result = with_trace_id("list_organizations", async move {
        state.metadata.organizations(language).await
    })
    .await;

    match result {
        Ok(organizations) => Ok(Json(organizations)),
        Err(e) => {
            warn!("Could not get organizations: {:#}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "Could not get organizations".to_string(),
                }),
            ))
        }
    }
}

/// Get the key group listing for one language
async fn list_groups(
    State(state): State<AppState>,
    AxumQuery(params): AxumQuery<LanguageParams>,
) -> Result<Json<Vec<GroupListingRow>>, (StatusCode, Json<ErrorResponse>)> {
    let language = require_language(&params)?;

    let result =
        with_trace_id("list_groups", async move { state.metadata.groups(language).await }).await;

    match result {
        Ok(groups) => Ok(Json(groups)),
        Err(e) => {
            warn!("Could not get key groups: {:#}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "Could not get key groups".to_string(),
                }),
            ))
        }
    }
}

/// Get the collection listing for one language
async fn list_collections(
    State(state): State<AppState>,
    AxumQuery(params): AxumQuery<LanguageParams>,
) -> Result<Json<Vec<CollectionListingRow>>, (StatusCode, Json<ErrorResponse>)> {
    let language = require_language(&params)?;

    let result = with_trace_id("list_collections", async move {
        state.metadata.collections(language).await
    })
    .await;

    match result {
        Ok(collections) => Ok(Json(collections)),
        Err(e) => {
            warn!("Could not get key collections: {:#}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "Could not get key collections".to_string(),
                }),
            ))
        }
    }
}

/// Stream one resolved media file
async fn serve_media(
    state: AppState,
    media_id: String,
    kind: MediaVariantKind,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let media_id = match ValidatedMediaId::parse(&media_id) {
        Ok(id) => id,
        Err(_) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "invalid_id".to_string(),
                    message: "Media ID must be a positive integer".to_string(),
                }),
            ));
        }
    };

    let path = match state.media.resolve_file(media_id, kind).await {
        Ok(path) => path,
        Err(MediaFileError::NotFound) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "media_not_found".to_string(),
                    message: format!("Media with ID {media_id} not found"),
                }),
            ));
        }
        Err(MediaFileError::MissingFile(stored)) => {
            warn!("File path does not exist: {}", stored);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "Could not get media file".to_string(),
                }),
            ));
        }
        Err(MediaFileError::Other(e)) => {
            warn!("Could not resolve media {}: {:#}", media_id, e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "Could not get media file".to_string(),
                }),
            ));
        }
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = crate::services::media_content_type(&path);
            Ok((
                [(header::CONTENT_TYPE, content_type.to_string())],
                bytes,
            )
                .into_response())
        }
        Err(e) => {
            warn!("Could not read media file {}: {}", path.display(), e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "Could not get media file".to_string(),
                }),
            ))
        }
    }
}

/// Get a media file
async fn get_media_file(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    serve_media(state, media_id, MediaVariantKind::Full).await
}

/// Get a media file thumbnail
async fn get_media_thumbnail(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    serve_media(state, media_id, MediaVariantKind::Thumbnail).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_language() {
        let ok = LanguageParams {
            language: Some("no".to_string()),
        };
        assert_eq!(require_language(&ok).unwrap(), Language::No);

        let invalid = LanguageParams {
            language: Some("xx".to_string()),
        };
        let (status, body) = require_language(&invalid).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "invalid_language");

        let missing = LanguageParams { language: None };
        let (status, body) = require_language(&missing).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "missing_language");
    }

    #[test]
    fn test_key_info_pair_serializes_misses_as_null() {
        let response = KeyInfoResponse::Pair([None, None]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!([null, null]));
    }
}
