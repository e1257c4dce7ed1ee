//! REST API for the storage fit service.
//!
//! A thin JSON binding around the packing engine, used by the inventory form
//! and the 3D preview. Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::error::PackingError;
use crate::geometry::find_layout_violations;
use crate::metrics::calculate_recommended_units;
use crate::model::{PackedItem, SelectedItem, StorageUnit};
use crate::optimizer::{PackingResult, pack_items_with_config, pack_items_with_progress};
use crate::types::{Dimensions, EPSILON_GENERAL, Vec3};
use crate::visualization::{
    ContainerShell, VisualItem, VisualizationDimensions, VisualizationScene,
    get_container_visualization_dimensions, visualize,
};

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>storage-fit API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the packing endpoints.
///
/// `scale` asks for a visualization scene in the given inches-to-scene factor.
#[derive(Deserialize, Clone, ToSchema)]
#[schema(
    example = json!({
        "items": [
            { "item_id": "dresser", "quantity": 2, "width": 40.0, "depth": 20.0, "height": 35.0, "color": "#8b5a2b" },
            { "item_id": "box", "quantity": 12, "width": 18.0, "depth": 18.0, "height": 16.0, "color": "#c8a165" }
        ],
        "scale": 0.1
    })
)]
pub struct PackRequest {
    pub items: Vec<SelectedItem>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub scale: Option<f64>,
}

impl PackRequest {
    fn validated_scale(&self) -> Result<Option<f64>, String> {
        match self.scale {
            Some(scale) if !(scale > 0.0 && scale.is_finite()) => {
                Err(format!("scale must be a positive number, got: {}", scale))
            }
            other => Ok(other),
        }
    }
}

/// Response of `/pack`.
///
/// `recommended_units` is the volume-only estimate and may be lower than
/// `result.container_count`.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub result: PackingResult,
    pub recommended_units: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<VisualizationScene>,
}

impl PackResponse {
    fn from_packing_result(result: PackingResult, scene_scale: Option<f64>) -> Self {
        let recommended_units = calculate_recommended_units(result.total_volume_cubic_feet);
        let scene = scene_scale.map(|scale| visualize(&result, scale));
        Self {
            result,
            recommended_units,
            scene,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "total_cubic_feet": 300.0 }))]
pub struct RecommendedUnitsRequest {
    pub total_cubic_feet: f64,
}

#[derive(Serialize, ToSchema)]
pub struct RecommendedUnitsResponse {
    pub recommended_units: u32,
}

/// Storage unit constants and the shell size at the configured scale.
#[derive(Serialize, ToSchema)]
pub struct ContainerResponse {
    pub unit: StorageUnit,
    pub scale: f64,
    pub shell: VisualizationDimensions,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    code: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    code: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, code, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        "invalid_json",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        "validation_error",
        details,
    )
}

fn packing_error(err: &PackingError) -> Response {
    let (status, headline) = match err {
        PackingError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Invalid input data"),
        PackingError::UnplaceableItem { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Item too large for a single storage unit",
        ),
        PackingError::CapacityExceeded { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Too many items in one request",
        ),
        PackingError::PlacementFailed { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Packing failed")
        }
    };
    error_response(
        status,
        headline,
        err.code(),
        err.to_string(),
    )
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Result<(PackRequest, Option<f64>), Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    match payload.validated_scale() {
        Ok(scale) => Ok((payload, scale)),
        Err(details) => Err(validation_error(details)),
    }
}

fn log_layout_violations(result: &PackingResult) {
    if !cfg!(debug_assertions) {
        return;
    }
    let violations = find_layout_violations(&result.packed_items, EPSILON_GENERAL);
    if !violations.is_empty() {
        warn!(?violations, "packing produced an inconsistent layout");
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream, handle_recommended_units, handle_container),
    components(
        schemas(
            PackRequest,
            PackResponse,
            PackingResult,
            PackedItem,
            SelectedItem,
            Vec3,
            Dimensions,
            VisualizationScene,
            ContainerShell,
            VisualItem,
            VisualizationDimensions,
            RecommendedUnitsRequest,
            RecommendedUnitsResponse,
            ContainerResponse,
            StorageUnit,
            ErrorResponse
        )
    ),
    tags((name = "packing", description = "Storage unit packing and estimates"))
)]
struct ApiDoc;

fn router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { optimizer_config };

    Router::new()
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        .route("/recommended_units", post(handle_recommended_units))
        .route("/container", get(handle_container))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
pub async fn start_api_server(
    config: ApiConfig,
    optimizer_config: OptimizerConfig,
) -> std::io::Result<()> {
    let app = router(optimizer_config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("Local access: http://localhost:{}", config.port());
    }
    info!("Endpoints: POST /pack, POST /pack_stream, POST /recommended_units, GET /container");
    info!("Documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /pack endpoint.
///
/// Packs the submitted inventory and returns placements, metrics and the
/// volume-only estimate.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Successfully packed items", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid, oversized or too many items",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (request, scale) = match parse_pack_request(payload) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    let unit_count: u64 = request.items.iter().map(|i| u64::from(i.quantity)).sum();
    info!(
        lines = request.items.len(),
        units = unit_count,
        "New pack request"
    );

    let config = &state.optimizer_config;
    let result = match pack_items_with_config(&request.items, config.packing_config()) {
        Ok(result) => result,
        Err(err) => {
            warn!(code = err.code(), "Pack request rejected: {}", err);
            return packing_error(&err);
        }
    };
    log_layout_violations(&result);
    info!(
        containers = result.container_count,
        volume_cubic_feet = result.total_volume_cubic_feet,
        "Pack request finished"
    );

    let scene_scale = scale.or_else(|| {
        config
            .include_scene()
            .then(|| config.visualization_scale())
    });
    let response = PackResponse::from_packing_result(result, scene_scale);
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /pack_stream endpoint (SSE).
///
/// Streams pack events as Server-Sent Events so the preview can build the
/// layout step by step. A rejected request yields a single `Failed` event.
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams pack events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Malformed request",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (request, _) = match parse_pack_request(payload) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<String>(32);
    let packing_config = state.optimizer_config.packing_config();

    tokio::task::spawn_blocking(move || {
        let outcome = pack_items_with_progress(&request.items, packing_config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver means the client went away; drop the rest.
                let _ = tx.blocking_send(json);
            }
        });
        if let Err(err) = outcome {
            let failure = json!({
                "type": "Failed",
                "code": err.code(),
                "reason": err.to_string(),
            });
            let _ = tx.blocking_send(failure.to_string());
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /recommended_units.
///
/// Volume-only estimate for forms that do not have item dimensions yet.
#[utoipa::path(
    post,
    path = "/recommended_units",
    request_body = RecommendedUnitsRequest,
    responses(
        (status = 200, description = "Estimated storage units", body = RecommendedUnitsResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid JSON data", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_recommended_units(
    payload: Result<Json<RecommendedUnitsRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };
    let response = RecommendedUnitsResponse {
        recommended_units: calculate_recommended_units(request.total_cubic_feet),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for GET /container.
#[utoipa::path(
    get,
    path = "/container",
    responses(
        (status = 200, description = "Storage unit constants", body = ContainerResponse)
    ),
    tag = "packing"
)]
async fn handle_container(State(state): State<ApiState>) -> impl IntoResponse {
    let scale = state.optimizer_config.visualization_scale();
    Json(ContainerResponse {
        unit: StorageUnit::STANDARD,
        scale,
        shell: get_container_visualization_dimensions(scale),
    })
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
