use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use crate::chef::ChefClient;
use crate::tls::CertPaths;
use recipebox_core::browse::{RecipePage, RecipeQuery};
use recipebox_core::chef::{ChefAnswer, ChefError};
use recipebox_core::error::RecipeBoxError;
use recipebox_core::models::{
    MealPlanItem, NewRecipe, Recipe, RecipeUpdate, Session, ShoppingCategory, ShoppingListItem,
    SlotId, SyncReport, WeekPlan, parse_iso_date, week_start,
};
use recipebox_core::service::RecipeBoxService;
use recipebox_core::storage::content_type;

const BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<RecipeBoxService>>,
    chef: Arc<ChefClient>,
    /// Session used for every request when auth is disabled.
    default_session: Option<Session>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct AddPlacementRequest {
    recipe_id: i64,
    slot: String,
}

#[derive(Deserialize)]
struct MovePlacementRequest {
    slot: String,
}

#[derive(Deserialize)]
struct AddItemRequest {
    name: String,
    category: Option<String>,
}

#[derive(Deserialize)]
struct CheckItemRequest {
    is_checked: bool,
}

#[derive(Deserialize)]
struct ChefRequest {
    query: String,
}

#[derive(Deserialize)]
struct RangeQuery {
    start: String,
    end: String,
}

#[derive(Deserialize)]
struct OptionalRange {
    start: Option<String>,
    end: Option<String>,
}

impl OptionalRange {
    fn resolve(&self) -> Result<Option<(NaiveDate, NaiveDate)>, ApiError> {
        match (self.start.as_deref(), self.end.as_deref()) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Ok(Some((parse_iso_date(start)?, parse_iso_date(end)?))),
            _ => Err(ApiError::BadRequest(
                "start and end must be given together".to_string(),
            )),
        }
    }
}

#[derive(Deserialize)]
struct ImageUpload {
    filename: String,
}

#[derive(Serialize)]
struct RemovedResponse {
    removed: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Internal(err) => {
                tracing::error!(error = %format!("{err:#}"), "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<RecipeBoxError> for ApiError {
    fn from(err: RecipeBoxError) -> Self {
        match err {
            RecipeBoxError::NotAuthenticated => Self::Unauthorized(err.to_string()),
            RecipeBoxError::NotFound(_) => Self::NotFound(err.to_string()),
            RecipeBoxError::Invalid(msg) => Self::BadRequest(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match RecipeBoxError::classify(&err) {
            Some(domain) => domain.clone().into(),
            None => Self::Internal(err),
        }
    }
}

impl From<ChefError> for ApiError {
    fn from(err: ChefError) -> Self {
        match err {
            ChefError::EmptyQuery => Self::BadRequest(err.to_string()),
            _ => Self::BadGateway(err.to_string()),
        }
    }
}

// --- Middleware ---

/// Resolve the bearer token to a [`Session`] and attach it to the request.
async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let session = if let Some(ref session) = state.default_session {
        Ok(session.clone())
    } else {
        let token = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();
        let svc = state
            .svc
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        svc.authenticate(token)
    };

    match session {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => match RecipeBoxError::classify(&err) {
            Some(RecipeBoxError::NotAuthenticated) => ApiError::Unauthorized(
                "Invalid or missing API token".to_string(),
            )
            .into_response(),
            _ => ApiError::Internal(err).into_response(),
        },
    }
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Recipe handlers ---

async fn browse_recipes(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<RecipeQuery>,
) -> Result<Json<RecipePage>, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(Json(svc.browse_recipes(&session, &query)?))
}

async fn create_recipe(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<NewRecipe>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let recipe = svc.add_recipe(&session, &req)?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn get_recipe(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<Recipe>, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(Json(svc.get_recipe(&session, id)?))
}

async fn update_recipe(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Json(req): Json<RecipeUpdate>,
) -> Result<Json<Recipe>, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(Json(svc.update_recipe(&session, id, &req)?))
}

async fn delete_recipe(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if svc.delete_recipe(&session, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Recipe {id} not found")))
    }
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<Recipe>, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(Json(svc.toggle_favorite(&session, id)?))
}

async fn upload_image(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Query(upload): Query<ImageUpload>,
    body: Bytes,
) -> Result<Json<Recipe>, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let recipe = svc.attach_image(&session, id, &upload.filename, &body)?;
    Ok(Json(recipe))
}

async fn get_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = {
        let svc = state
            .svc
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match svc.images() {
            Some(store) => store.get(&key).context("failed to read image")?,
            None => None,
        }
    };
    let bytes = bytes.ok_or_else(|| ApiError::NotFound(format!("Image {key} not found")))?;
    Ok(([(header::CONTENT_TYPE, content_type(&key))], bytes).into_response())
}

// --- Meal plan handlers ---

async fn list_meal_plan(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<MealPlanItem>>, ApiError> {
    let start = parse_iso_date(&range.start)?;
    let end = parse_iso_date(&range.end)?;
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(Json(svc.get_meal_plan(&session, start, end)?))
}

async fn add_placement(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<AddPlacementRequest>,
) -> Result<(StatusCode, Json<MealPlanItem>), ApiError> {
    let slot: SlotId = req.slot.parse()?;
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let item = svc.add_to_meal_plan(&session, req.recipe_id, &slot)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn clear_meal_plan(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(range): Query<OptionalRange>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let range = range.resolve()?;
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let removed = match range {
        Some((start, end)) => svc.clear_meal_plan_for_range(&session, start, end)?,
        None => svc.clear_meal_plan(&session)?,
    };
    Ok(Json(RemovedResponse { removed }))
}

async fn week_plan(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(date): Path<String>,
) -> Result<Json<WeekPlan>, ApiError> {
    let date = parse_iso_date(&date)?;
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(Json(svc.week_plan(&session, date)?))
}

async fn move_placement(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Json(req): Json<MovePlacementRequest>,
) -> Result<Json<MealPlanItem>, ApiError> {
    let slot: SlotId = req.slot.parse()?;
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(Json(svc.move_placement(&session, id, &slot)?))
}

async fn remove_placement(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if svc.remove_from_meal_plan(&session, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Meal plan item {id} not found")))
    }
}

// --- Shopping list handlers ---

async fn list_items(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<ShoppingListItem>>, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(Json(svc.list_items(&session)?))
}

async fn add_item(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<ShoppingListItem>), ApiError> {
    let category = req
        .category
        .as_deref()
        .map(str::parse::<ShoppingCategory>)
        .transpose()?;
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let item = svc.add_item(&session, &req.name, category)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn clear_list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let removed = svc.clear_list(&session)?;
    Ok(Json(RemovedResponse { removed }))
}

async fn set_item_checked(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Json(req): Json<CheckItemRequest>,
) -> Result<Json<ShoppingListItem>, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(Json(svc.set_item_checked(&session, id, req.is_checked)?))
}

async fn delete_item(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if svc.delete_item(&session, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "Shopping list item {id} not found"
        )))
    }
}

/// Reconcile the list against a date range, defaulting to the current week.
async fn sync_list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(range): Query<OptionalRange>,
) -> Result<Json<SyncReport>, ApiError> {
    let (start, end) = range.resolve()?.unwrap_or_else(|| {
        let start = week_start(Local::now().date_naive());
        (start, start + chrono::Duration::days(6))
    });
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Ok(Json(svc.sync_shopping_list(&session, start, end)?))
}

async fn cleanup_list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let removed = svc.cleanup_orphans(&session)?;
    Ok(Json(RemovedResponse { removed }))
}

async fn remove_checked(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let svc = state
        .svc
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let removed = svc.remove_checked(&session)?;
    Ok(Json(RemovedResponse { removed }))
}

// --- AI Chef ---

async fn ask_chef(
    State(state): State<AppState>,
    Json(req): Json<ChefRequest>,
) -> Result<Json<ChefAnswer>, ApiError> {
    Ok(Json(state.chef.ask(&req.query).await?))
}

// --- Router builder ---

fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/recipes", get(browse_recipes).post(create_recipe))
        .route(
            "/api/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/api/recipes/{id}/favorite", post(toggle_favorite))
        .route("/api/recipes/{id}/image", put(upload_image))
        .route(
            "/api/meal-plan",
            get(list_meal_plan)
                .post(add_placement)
                .delete(clear_meal_plan),
        )
        .route("/api/meal-plan/week/{date}", get(week_plan))
        .route(
            "/api/meal-plan/{id}",
            put(move_placement).delete(remove_placement),
        )
        .route(
            "/api/shopping-list",
            get(list_items).post(add_item).delete(clear_list),
        )
        .route("/api/shopping-list/sync", post(sync_list))
        .route("/api/shopping-list/cleanup", post(cleanup_list))
        .route("/api/shopping-list/checked", delete(remove_checked))
        .route(
            "/api/shopping-list/{id}",
            put(set_item_checked).delete(delete_item),
        )
        .route("/api/chef", post(ask_chef))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/images/{key}", get(get_image))
        .merge(api)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    svc: RecipeBoxService,
    chef: ChefClient,
    port: u16,
    bind: &str,
    default_session: Option<Session>,
    tls: Option<CertPaths>,
) -> anyhow::Result<()> {
    let no_auth = default_session.is_some();
    if let Some(ref session) = default_session {
        tracing::warn!(
            user = %session.username,
            "authentication disabled (--no-auth); every request acts as this user"
        );
        if bind != "127.0.0.1" && bind != "localhost" {
            tracing::warn!(
                %bind,
                "listening with no authentication; any device on your network can access this API"
            );
        }
    }

    let state = AppState {
        svc: Arc::new(Mutex::new(svc)),
        chef: Arc::new(chef),
        default_session,
    };
    let app = build_router(state);

    if let Some(paths) = tls {
        let fingerprint = paths.ensure(bind)?;

        let rustls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            &paths.cert,
            &paths.key,
        )
        .await
        .context("failed to load TLS certificate")?;

        let addr = format!("{bind}:{port}")
            .parse::<std::net::SocketAddr>()
            .context("invalid bind address")?;

        tracing::info!(no_auth, "listening on https://{bind}:{port}");
        eprintln!("Certificate fingerprint (SHA-256):");
        eprintln!("  {fingerprint}");

        axum_server::bind_rustls(addr, rustls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
        tracing::info!(no_auth, "listening on http://{bind}:{port}");
        axum::serve(listener, app).await?;
    }

    Ok(())
}
