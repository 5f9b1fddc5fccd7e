//! REST API Handlers
//!
//! Implements the REST endpoints for profile resolution and for inspecting
//! registered backends and their capability tables.

use crate::controlplane::ResolutionEngine;
use crate::domain::ports::{
    BackendCapabilitySet, BackendKind, CapabilityAdapter, ConcreteStorageParameters,
    FallbackPolicy, VolumeRequest,
};
use crate::domain::profile::{Profile, ProfileRegistry, RequirementVector};
use crate::domain::units::parse_capacity;
use crate::error::{Error, Result};
use axum::{
    body::Bytes,
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Profile resolution request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveProfileRequest {
    /// Target backend name
    pub backend: String,
    /// Profile name: gold, silver, bronze
    #[serde(default)]
    pub profile: Option<String>,
    /// Capacity (e.g., "100Gi", "1Ti")
    #[serde(default)]
    pub capacity: Option<String>,
    /// Dataset the volume is for
    #[serde(default)]
    pub dataset_id: Option<String>,
    /// Dataset metadata; may carry the profile instead of `profile`
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ResolveProfileRequest {
    /// Convert into a domain request, validating names and sizes
    ///
    /// An explicit `profile` takes precedence; metadata is only consulted
    /// when it is absent.
    pub fn into_volume_request(self) -> Result<VolumeRequest> {
        let size_bytes = self.capacity.as_deref().map(parse_capacity).transpose()?;
        let explicit = self
            .profile
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(str::parse::<Profile>)
            .transpose()?;

        let mut request = match explicit {
            Some(profile) => VolumeRequest {
                size_bytes,
                metadata: self.metadata,
                ..VolumeRequest::new(self.backend).with_profile(profile)
            },
            None => VolumeRequest::from_metadata(self.backend, size_bytes, self.metadata)?,
        };
        if let Some(dataset_id) = self.dataset_id {
            request = request.with_dataset_id(dataset_id);
        }

        Ok(request)
    }
}

/// Profile resolution response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveProfileResponse {
    #[serde(flatten)]
    pub parameters: ConcreteStorageParameters,
    pub dataset_id: Option<String>,
    pub resolved_at: DateTime<Utc>,
}

/// Backend summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendInfoResponse {
    pub name: String,
    pub kind: BackendKind,
    pub supported_profiles: Vec<Profile>,
    pub default_class: String,
    pub allocation_unit_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<BackendCapabilitySet>,
}

impl BackendInfoResponse {
    fn from_adapter(adapter: &dyn CapabilityAdapter, detailed: bool) -> Self {
        let capabilities = adapter.capabilities();
        Self {
            name: adapter.name().to_string(),
            kind: adapter.kind(),
            supported_profiles: capabilities.supported_profiles(),
            default_class: capabilities.default.class.clone(),
            allocation_unit_bytes: adapter.allocation_unit(),
            capabilities: detailed.then(|| capabilities.clone()),
        }
    }
}

/// Profile catalogue response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilesResponse {
    pub default_profile: Profile,
    pub fallback_policy: FallbackPolicy,
    pub profiles: Vec<RequirementVector>,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn error_response(error: &Error) -> Response {
    let status = match error {
        Error::UnsupportedBackend { .. } => StatusCode::NOT_FOUND,
        Error::UnsupportedProfile { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::InvalidProfileName { .. } | Error::CapacityParse(_) | Error::JsonParse(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let details = match error {
        Error::UnsupportedProfile { .. } if error.is_retryable() => {
            Some("retry with a cheaper profile or omit the profile".to_string())
        }
        _ => None,
    };

    (
        status,
        Json(ApiErrorResponse {
            error: error.code().to_string(),
            message: error.to_string(),
            details,
        }),
    )
        .into_response()
}

// =============================================================================
// REST Router
// =============================================================================

/// REST API router builder
pub struct RestRouter {
    engine: Arc<ResolutionEngine>,
}

impl RestRouter {
    pub fn new(engine: Arc<ResolutionEngine>) -> Self {
        Self { engine }
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        let state = AppState {
            engine: self.engine,
        };

        Router::new()
            .route("/v1/resolve", post(resolve_profile))
            .route("/v1/backends", get(list_backends))
            .route("/v1/backends/:name", get(get_backend))
            .route("/v1/profiles", get(list_profiles))
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<ResolutionEngine>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Resolve a profile request into backend parameters
async fn resolve_profile(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_resolve_request(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("Rejected resolve request: {}", e);
            return error_response(&e);
        }
    };

    match state.engine.resolve(&request) {
        Ok(parameters) => (
            StatusCode::OK,
            Json(ResolveProfileResponse {
                parameters,
                dataset_id: request.dataset_id,
                resolved_at: Utc::now(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(backend = %request.backend, "Resolution failed: {}", e);
            error_response(&e)
        }
    }
}

fn parse_resolve_request(body: &[u8]) -> Result<VolumeRequest> {
    let body: ResolveProfileRequest = serde_json::from_slice(body)?;
    info!(backend = %body.backend, profile = ?body.profile, "Resolving profile request");
    body.into_volume_request()
}

/// List registered backends
async fn list_backends(State(state): State<AppState>) -> Response {
    let backends: Vec<BackendInfoResponse> = state
        .engine
        .registry()
        .adapters()
        .map(|adapter| BackendInfoResponse::from_adapter(adapter.as_ref(), false))
        .collect();

    (StatusCode::OK, Json(backends)).into_response()
}

/// Get one backend with its capability table
async fn get_backend(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.engine.registry().get(&name) {
        Ok(adapter) => (
            StatusCode::OK,
            Json(BackendInfoResponse::from_adapter(adapter.as_ref(), true)),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// List profiles and the active fallback policy
async fn list_profiles(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        Json(ProfilesResponse {
            default_profile: Profile::DEFAULT,
            fallback_policy: state.engine.fallback_policy(),
            profiles: ProfileRegistry::all().to_vec(),
        }),
    )
        .into_response()
}

/// Health check
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controlplane::backends::BackendFactory;
    use crate::controlplane::{BackendRegistry, EngineConfig};
    use crate::domain::units::GIB;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn router(policy: FallbackPolicy) -> Router {
        let registry = BackendRegistry::from_entries(&BackendFactory::builtin_entries()).unwrap();
        let engine = ResolutionEngine::new(
            EngineConfig {
                fallback_policy: policy,
                ..Default::default()
            },
            registry,
        );
        RestRouter::new(Arc::new(engine)).build()
    }

    async fn post_json(router: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_into_volume_request() {
        let body = ResolveProfileRequest {
            backend: "ebs".into(),
            profile: Some("Gold".into()),
            capacity: Some("10Gi".into()),
            dataset_id: Some("ds-1".into()),
            metadata: BTreeMap::new(),
        };
        let request = body.into_volume_request().unwrap();
        assert_eq!(request.profile, Some(Profile::Gold));
        assert_eq!(request.size_bytes, Some(10 * GIB));
        assert_eq!(request.dataset_id.as_deref(), Some("ds-1"));
    }

    #[test]
    fn test_profile_from_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            crate::domain::ports::PROFILE_METADATA_KEY.to_string(),
            "silver".to_string(),
        );
        let body = ResolveProfileRequest {
            backend: "cinder".into(),
            profile: None,
            capacity: None,
            dataset_id: None,
            metadata,
        };
        assert_eq!(body.into_volume_request().unwrap().profile, Some(Profile::Silver));
    }

    #[tokio::test]
    async fn test_resolve_endpoint() {
        let (status, body) = post_json(
            router(FallbackPolicy::Reject),
            "/v1/resolve",
            serde_json::json!({"backend": "ebs", "profile": "gold", "capacity": "100Gi"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["volumeClass"], "io1");
        assert_eq!(body["iops"], 3000);
        assert_eq!(body["effectiveProfile"], "gold");
        assert!(body["resolvedAt"].is_string());
    }

    #[tokio::test]
    async fn test_resolve_error_statuses() {
        let (status, body) = post_json(
            router(FallbackPolicy::Reject),
            "/v1/resolve",
            serde_json::json!({"backend": "nfs"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unsupported_backend");

        let (status, body) = post_json(
            router(FallbackPolicy::Reject),
            "/v1/resolve",
            serde_json::json!({"backend": "mayastor", "profile": "silver"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "unsupported_profile");
        assert!(body["details"].is_string());

        let (status, body) = post_json(
            router(FallbackPolicy::Reject),
            "/v1/resolve",
            serde_json::json!({"backend": "ebs", "profile": "platinum"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_profile_name");
    }

    #[test]
    fn test_explicit_profile_overrides_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            crate::domain::ports::PROFILE_METADATA_KEY.to_string(),
            "platinum".to_string(),
        );
        let body = ResolveProfileRequest {
            backend: "ebs".into(),
            profile: Some("bronze".into()),
            capacity: None,
            dataset_id: None,
            metadata,
        };
        let request = body.into_volume_request().unwrap();
        assert_eq!(request.profile, Some(Profile::Bronze));
        assert_eq!(
            request.metadata.get(crate::domain::ports::PROFILE_METADATA_KEY).map(String::as_str),
            Some("platinum")
        );
    }

    #[tokio::test]
    async fn test_malformed_body_returns_json_error() {
        for raw in ["{not json", r#"{"profile": "gold"}"#] {
            let request = Request::builder()
                .method("POST")
                .uri("/v1/resolve")
                .header("content-type", "application/json")
                .body(Body::from(raw))
                .unwrap();
            let response = router(FallbackPolicy::Reject).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["error"], "invalid_json");
            assert!(body["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_resolve_with_fallback() {
        let (status, body) = post_json(
            router(FallbackPolicy::Default),
            "/v1/resolve",
            serde_json::json!({"backend": "loopback", "profile": "gold"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requestedProfile"], "gold");
        assert!(body["effectiveProfile"].is_null());
        assert_eq!(body["source"]["kind"], "fallback");
        assert_eq!(body["source"]["policy"], "default");
    }

    #[tokio::test]
    async fn test_backend_endpoints() {
        let (status, body) = get_json(router(FallbackPolicy::Reject), "/v1/backends").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 4);
        assert!(body[0].get("capabilities").is_none());

        let (status, body) = get_json(router(FallbackPolicy::Reject), "/v1/backends/mayastor").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["supportedProfiles"], serde_json::json!(["gold", "bronze"]));
        assert_eq!(body["capabilities"]["tiers"]["gold"]["class"], "tier=hot");

        let (status, _) = get_json(router(FallbackPolicy::Reject), "/v1/backends/nfs").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_profiles_endpoint() {
        let (status, body) = get_json(router(FallbackPolicy::BestEffort), "/v1/profiles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["defaultProfile"], "bronze");
        assert_eq!(body["fallbackPolicy"], "best-effort");
        assert_eq!(body["profiles"][0]["profile"], "gold");
        assert_eq!(body["profiles"][0]["performance"], "high");
    }
}
