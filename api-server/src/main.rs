use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Router,
};
use eth_test_utils::SafeFixture;
use safedeploy::roster::Owner;
use safedeploy::{DeployError, DeployStatus, RosterAction, RosterError, SafeWorkbench};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    /// Owner rows in display order
    pub owners: Vec<Owner>,

    /// Signature threshold for the next deployment
    pub threshold: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOwnerRequest {
    /// Replacement address string for the row
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct ThresholdRequest {
    pub threshold: u32,
}

#[derive(Debug, Serialize)]
pub struct DeployResponse {
    pub tx_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    pub effective_gas_price: String,

    /// Deployed proxies after the post-deployment refresh
    pub proxies: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProxiesResponse {
    pub proxies: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,

    /// Failure message when status is `failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    pub owners: usize,
    pub threshold: u32,
    pub proxies: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub safe_version: String,
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Owner with key {0} not found")]
    OwnerNotFound(u64),

    #[error("Deployment not ready: {0}")]
    NotReady(String),

    #[error("Deployment failed: {0}")]
    DeployFailed(String),
}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::OwnerNotFound { key } => ApiError::OwnerNotFound(key),
        }
    }
}

impl From<DeployError> for ApiError {
    fn from(err: DeployError) -> Self {
        match err {
            DeployError::MissingDependency(_) => ApiError::NotReady(err.to_string()),
            _ => ApiError::DeployFailed(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::OwnerNotFound(key) => (
                StatusCode::NOT_FOUND,
                format!("Owner with key {} not found", key),
            ),
            ApiError::NotReady(msg) => (StatusCode::CONFLICT, msg),
            ApiError::DeployFailed(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details: None,
        });

        (status, body).into_response()
    }
}

// ============================================================================
// Application State
// ============================================================================

struct AppState {
    workbench: Mutex<SafeWorkbench>,
}

// ============================================================================
// API Handlers
// ============================================================================

fn roster_response(workbench: &SafeWorkbench) -> RosterResponse {
    RosterResponse {
        owners: workbench.owners().to_vec(),
        threshold: workbench.threshold(),
    }
}

fn proxy_strings(workbench: &SafeWorkbench) -> Vec<String> {
    workbench
        .proxies()
        .iter()
        .map(|proxy| format!("{:?}", proxy))
        .collect()
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        safe_version: "1.1.1".to_string(),
    })
}

/// Deployment status plus a summary of the workbench state
async fn deployment_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let workbench = state.workbench.lock().await;
    let status = workbench.status();
    let detail = match &status {
        DeployStatus::Failed { message } => Some(message.clone()),
        _ => None,
    };

    Json(StatusResponse {
        status: status.as_str().to_string(),
        detail,
        owners: workbench.owners().len(),
        threshold: workbench.threshold(),
        proxies: workbench.proxies().len(),
    })
}

/// List the owner roster
async fn list_owners(State(state): State<Arc<AppState>>) -> Json<RosterResponse> {
    let workbench = state.workbench.lock().await;
    Json(roster_response(&workbench))
}

/// Append a blank owner row
async fn add_owner(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RosterResponse>, ApiError> {
    let mut workbench = state.workbench.lock().await;
    workbench.apply(RosterAction::AddOwner)?;
    Ok(Json(roster_response(&workbench)))
}

/// Overwrite the address of one owner row
async fn update_owner(
    State(state): State<Arc<AppState>>,
    Path(key): Path<u64>,
    Json(request): Json<UpdateOwnerRequest>,
) -> Result<Json<RosterResponse>, ApiError> {
    let mut workbench = state.workbench.lock().await;
    workbench.apply(RosterAction::UpdateOwnerAddress {
        key,
        value: request.address,
    })?;
    Ok(Json(roster_response(&workbench)))
}

/// Delete an owner row; unknown keys are a no-op
async fn remove_owner(
    State(state): State<Arc<AppState>>,
    Path(key): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let mut workbench = state.workbench.lock().await;
    workbench.apply(RosterAction::RemoveOwner { key })?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set the signature threshold for the next deployment
async fn set_threshold(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ThresholdRequest>,
) -> Json<RosterResponse> {
    let mut workbench = state.workbench.lock().await;
    workbench.set_threshold(request.threshold);
    Json(roster_response(&workbench))
}

/// Deploy a Safe for the current roster
async fn deploy_safe(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeployResponse>, ApiError> {
    let mut workbench = state.workbench.lock().await;
    info!(
        "Deploying Safe for {} owners (threshold {})",
        workbench.owners().len(),
        workbench.threshold()
    );

    let receipt = workbench.deploy().await.map_err(|e| {
        error!("Safe deployment failed: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(DeployResponse {
        tx_hash: receipt.tx_hash.to_string(),
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
        effective_gas_price: receipt.effective_gas_price.to_string(),
        proxies: proxy_strings(&workbench),
    }))
}

/// List deployed proxies, refreshing from the ledger first. A failed
/// refresh serves the stored list.
async fn list_proxies(State(state): State<Arc<AppState>>) -> Json<ProxiesResponse> {
    let mut workbench = state.workbench.lock().await;
    if let Err(err) = workbench.refresh_proxies().await {
        warn!("Proxy refresh failed, serving the stored list: {}", err);
    }
    Json(ProxiesResponse {
        proxies: proxy_strings(&workbench),
    })
}

// ============================================================================
// Router
// ============================================================================

fn app(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/status", get(deployment_status))
        .route("/owners", get(list_owners).post(add_owner))
        .route("/owners/:key", patch(update_owner).delete(remove_owner))
        .route("/threshold", put(set_threshold))
        .route("/deploy", post(deploy_safe))
        .route("/proxies", get(list_proxies))
        .with_state(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

// ============================================================================
// Main Application
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!("Starting Safedeploy API Server");

    // Wire the workbench against the in-process simulated ledger
    let fixture = SafeFixture::bootstrap();
    let mut workbench = fixture.workbench;
    if let Err(err) = workbench.refresh_proxies().await {
        warn!("Initial proxy refresh failed: {}", err);
    }

    let state = Arc::new(AppState {
        workbench: Mutex::new(workbench),
    });

    let app = app(state);

    // Get port from environment or use default
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = format!("0.0.0.0:{}", port);
    info!("Listening on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!("Safedeploy API is ready!");
    info!("  - Health check: http://{}:{}/health", "localhost", port);
    info!("  - Owner roster: http://{}:{}/owners", "localhost", port);
    info!("  - Deploy endpoint: POST http://{}:{}/deploy", "localhost", port);

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
