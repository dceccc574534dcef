// Name Picker - Web Server
// JSON API over one shared FilterEngine (axum)

use anyhow::Result;
use chrono::{DateTime, Utc};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use name_picker::{
    load_directory, BabyName, CatalogConfig, CatalogError, FilterEngine, QueryParams,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<FilterEngine>>,
}

impl AppState {
    fn new(engine: FilterEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    fn engine(&self) -> Result<MutexGuard<'_, FilterEngine>, ApiError> {
        self.engine.lock().map_err(|_| {
            error!("engine lock poisoned");
            ApiError(StatusCode::INTERNAL_SERVER_ERROR, "engine unavailable".to_string())
        })
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Handler failure: status + message, rendered through ApiResponse
struct ApiError(StatusCode, String);

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let status = match err {
            CatalogError::UnresolvedEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(ApiResponse::err(self.1))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// Request / Response types
// ============================================================================

/// Query string of GET /api/names; absent fields take their defaults
#[derive(Debug, Default, Deserialize)]
struct NamesQuery {
    gender: Option<String>,
    sort: Option<String>,
    initial: Option<String>,
    years: Option<String>,
    limit: Option<String>,
}

#[derive(Serialize)]
struct NamesResponse {
    params: QueryParams,
    entries: Vec<String>,
}

#[derive(Serialize)]
struct NameSummary {
    name: String,
    category: String,
    popularity: u64,
}

impl From<&BabyName> for NameSummary {
    fn from(name: &BabyName) -> Self {
        Self {
            name: name.name().to_string(),
            category: name.category().as_str().to_string(),
            popularity: name.rolling_popularity(),
        }
    }
}

#[derive(Serialize)]
struct NameDetail {
    #[serde(flatten)]
    summary: NameSummary,
    first_letter: char,
    history: BTreeMap<i32, u64>,
}

/// A user's shortlist; `saved_at` is null until the first save
#[derive(Serialize)]
struct SelectionResponse {
    user: u8,
    saved_at: Option<DateTime<Utc>>,
    names: Vec<NameSummary>,
}

impl SelectionResponse {
    fn load(engine: &FilterEngine, user: u8) -> Result<Self, CatalogError> {
        Ok(Self {
            user,
            saved_at: engine.selection_saved_at(user)?,
            names: engine.selection(user)?.into_iter().map(NameSummary::from).collect(),
        })
    }
}

#[derive(Deserialize)]
struct SelectionRequest {
    entries: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct ActiveUser {
    user: u8,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/names - Run a query against the catalog
async fn list_names(
    State(state): State<AppState>,
    Query(query): Query<NamesQuery>,
) -> ApiResult<NamesResponse> {
    let params = QueryParams::parse(
        query.gender.as_deref(),
        query.sort.as_deref(),
        query.initial.as_deref(),
        query.years.as_deref(),
        query.limit.as_deref(),
    )?;

    let mut engine = state.engine()?;
    engine.set_params(params);
    let entries = engine.refresh().to_vec();

    Ok(Json(ApiResponse::ok(NamesResponse { params, entries })))
}

/// GET /api/names/:name - One name with its full history
async fn get_name(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<NameDetail> {
    let engine = state.engine()?;
    let entry = engine
        .lookup(&name)
        .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, format!("no name {:?}", name)))?;

    Ok(Json(ApiResponse::ok(NameDetail {
        summary: entry.into(),
        first_letter: entry.first_letter(),
        history: entry.history().clone(),
    })))
}

/// GET /api/users/:user/selection
async fn get_selection(
    State(state): State<AppState>,
    Path(user): Path<u8>,
) -> ApiResult<SelectionResponse> {
    let engine = state.engine()?;
    Ok(Json(ApiResponse::ok(SelectionResponse::load(&engine, user)?)))
}

/// PUT /api/users/:user/selection - Replace a user's shortlist from display entries
async fn put_selection(
    State(state): State<AppState>,
    Path(user): Path<u8>,
    Json(request): Json<SelectionRequest>,
) -> ApiResult<SelectionResponse> {
    let mut engine = state.engine()?;
    let ids = engine.resolve_display_entries(&request.entries)?;
    engine.set_selection(user, ids)?;

    info!(user, names = request.entries.len(), "selection replaced");

    Ok(Json(ApiResponse::ok(SelectionResponse::load(&engine, user)?)))
}

/// GET /api/users/active
async fn get_active_user(State(state): State<AppState>) -> ApiResult<ActiveUser> {
    let engine = state.engine()?;
    Ok(Json(ApiResponse::ok(ActiveUser {
        user: engine.active_user().get(),
    })))
}

/// PUT /api/users/active
async fn put_active_user(
    State(state): State<AppState>,
    Json(request): Json<ActiveUser>,
) -> ApiResult<ActiveUser> {
    let mut engine = state.engine()?;
    engine.set_active_user(request.user)?;
    Ok(Json(ApiResponse::ok(request)))
}

/// POST /api/params/reset
async fn reset_params(State(state): State<AppState>) -> ApiResult<QueryParams> {
    let mut engine = state.engine()?;
    engine.reset_params();
    Ok(Json(ApiResponse::ok(engine.params())))
}

fn app(state: AppState) -> Router {
    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/names", get(list_names))
        .route("/names/:name", get(get_name))
        .route("/users/active", get(get_active_user).put(put_active_user))
        .route("/users/:user/selection", get(get_selection).put(put_selection))
        .route("/params/reset", post(reset_params))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[derive(Parser)]
#[command(name = "name-picker-server", version, about = "JSON API for the name picker")]
struct Cli {
    /// JSON config file (year range, data directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory with yobYYYY.txt files (overrides the config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long, default_value = "0.0.0.0:3000")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    println!("🌐 Name Picker - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut config = match &cli.config {
        Some(path) => CatalogConfig::from_file(path)?,
        None => CatalogConfig::default(),
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let data_dir = config.data_dir.clone();
    let mut engine = FilterEngine::new(config);
    let summary = load_directory(&data_dir, &mut engine)?;
    println!("✓ Catalog loaded: {} names from {} files", summary.names, summary.files);

    let listener = tokio::net::TcpListener::bind(&cli.addr).await?;

    println!("\n🚀 Server running on http://{}", cli.addr);
    println!("   API: http://{}/api/names?gender=F&sort=P&limit=20", cli.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app(AppState::new(engine))).await?;

    Ok(())
}
