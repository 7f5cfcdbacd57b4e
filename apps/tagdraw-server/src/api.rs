use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tagdraw::{
    assign_prizes, eligible_pool, is_eligible, parse_count, select_winners, select_winners_from_allowlist, tag_stats, Comment,
    DrawError, PrizeTier, TagFilter, TagStats, WinnerSet, WinnerStore,
};

use crate::render::{winner_rows, WinnerRow};
use crate::storage::{Store, StoreError};
use crate::sync::{Source, SyncError};

pub const ADMIN_HEADER: &str = "x-admin-password";

#[derive(Clone)]
pub struct AppState {
    pub comments: Store,
    pub winners: Arc<dyn WinnerStore>,
    pub source: Arc<Source>,
    pub tiers: Arc<Vec<PrizeTier>>,
    /// `None` locks every admin route.
    pub admin_password: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("upstream: {0}")]
    Upstream(#[from] SyncError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Draw(DrawError::InsufficientPool { .. }) => StatusCode::CONFLICT,
            ApiError::Draw(DrawError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        let body = match &self {
            ApiError::Draw(DrawError::InsufficientPool { required, available }) => {
                json!({ "error": self.to_string(), "required": required, "available": available })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/likes", get(likes))
        .route("/api/comments", get(comments))
        .route("/api/comments/{id}/verified", put(set_verified))
        .route("/api/stats", get(stats))
        .route("/api/prizes", get(prizes))
        .route("/api/winners", get(winners))
        .route("/api/winners-custom", post(winners_custom))
        .route("/api/winners/clear", post(clear_winners))
        .with_state(state)
}

fn authorize(headers: &HeaderMap, state: &AppState) -> Result<(), ApiError> {
    let given = headers.get(ADMIN_HEADER).and_then(|h| h.to_str().ok());
    match (given, state.admin_password.as_deref()) {
        (Some(v), Some(expected)) if v == expected => Ok(()),
        _ => {
            warn!("rejected admin request");
            Err(ApiError::Unauthorized)
        }
    }
}

fn parse_tag(raw: Option<&str>) -> Result<TagFilter, ApiError> {
    Ok(raw.map(str::parse::<TagFilter>).transpose()?.unwrap_or_default())
}

pub async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub struct MetricsResp {
    pub comments: usize,
    pub verified: usize,
    pub winners: usize,
}

pub async fn metrics(State(state): State<AppState>) -> Result<Json<MetricsResp>, ApiError> {
    let s = state.comments.stats()?;
    Ok(Json(MetricsResp { comments: s.comments, verified: s.verified, winners: state.winners.get().winners().len() }))
}

#[derive(Serialize)]
pub struct LikesResp {
    pub like_count: u64,
}

pub async fn likes(State(state): State<AppState>) -> Result<Json<LikesResp>, ApiError> {
    let like_count = state.source.fetch_like_count().await?;
    Ok(Json(LikesResp { like_count }))
}

#[derive(Deserialize)]
pub struct TagQuery {
    pub tag: Option<String>,
}

#[derive(Serialize)]
pub struct CommentsResp {
    pub comments: Vec<Comment>,
}

pub async fn comments(State(state): State<AppState>, Query(q): Query<TagQuery>) -> Result<Json<CommentsResp>, ApiError> {
    let all = state.comments.find_all()?;
    let comments = match q.tag.as_deref() {
        None => all,
        Some(raw) => {
            let filter = parse_tag(Some(raw))?;
            all.into_iter().filter(|c| is_eligible(&c.text, filter)).collect()
        }
    };
    Ok(Json(CommentsResp { comments }))
}

#[derive(Deserialize)]
pub struct VerifiedReq {
    pub verified: bool,
}

pub async fn set_verified(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<VerifiedReq>,
) -> Result<Json<Comment>, ApiError> {
    authorize(&headers, &state)?;
    let comment = state.comments.set_verified(&id, req.verified)?.ok_or(ApiError::NotFound)?;
    info!("comment {id} verified={}", req.verified);
    Ok(Json(comment))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<TagStats>, ApiError> {
    Ok(Json(tag_stats(&state.comments.find_all()?)))
}

#[derive(Serialize)]
pub struct PrizesResp {
    pub prizes: Vec<PrizeTier>,
}

pub async fn prizes(State(state): State<AppState>) -> Json<PrizesResp> {
    Json(PrizesResp { prizes: state.tiers.as_ref().clone() })
}

#[derive(Deserialize)]
pub struct WinnersQuery {
    pub count: Option<String>,
    pub tag: Option<String>,
}

#[derive(Serialize)]
pub struct WinnersResp {
    pub winners: Vec<WinnerRow>,
}

fn respond(state: &AppState, set: WinnerSet) -> Json<WinnersResp> {
    Json(WinnersResp { winners: winner_rows(assign_prizes(set.winners(), &state.tiers)) })
}

/// Cached winners when drawn. Otherwise draws when `count` is given, or returns an empty list.
pub async fn winners(State(state): State<AppState>, Query(q): Query<WinnersQuery>) -> Result<Json<WinnersResp>, ApiError> {
    let Some(raw) = q.count.as_deref() else {
        return Ok(respond(&state, state.winners.get()));
    };
    let count = parse_count(raw)?;
    let filter = parse_tag(q.tag.as_deref())?;
    let current = state.winners.get();
    if current.is_drawn() {
        return Ok(respond(&state, current));
    }
    let pool = eligible_pool(&state.comments.find_all()?, filter);
    let set = state.winners.get_or_draw(&mut || select_winners(&pool, count, &mut rand::thread_rng()));
    Ok(respond(&state, set))
}

#[derive(Deserialize)]
pub struct CustomDrawReq {
    pub count: Value,
    #[serde(rename = "verifiedUserIds")]
    pub verified_user_ids: Option<Vec<String>>,
}

fn count_from_json(v: &Value) -> Result<usize, DrawError> {
    match v {
        Value::Number(n) => match n.as_u64() {
            Some(c) => usize::try_from(c).map_err(|_| DrawError::invalid("count is too large")),
            None => Err(DrawError::invalid(format!("count must be a non-negative integer, got {n}"))),
        },
        Value::String(s) => parse_count(s),
        other => Err(DrawError::invalid(format!("count must be a number, got {other}"))),
    }
}

/// Draws exactly `count` winners from an allow-list and replaces the current set.
pub async fn winners_custom(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CustomDrawReq>,
) -> Result<Json<WinnersResp>, ApiError> {
    authorize(&headers, &state)?;
    let count = count_from_json(&req.count)?;
    let all = state.comments.find_all()?;
    let allowed: HashSet<String> = match req.verified_user_ids {
        Some(ids) => ids.into_iter().collect(),
        None => all.iter().filter(|c| c.verified).map(|c| c.author.clone()).collect(),
    };
    let pool = eligible_pool(&all, TagFilter::All);
    let drawn = select_winners_from_allowlist(&pool, &allowed, count, &mut rand::thread_rng())?;
    let set = WinnerSet::from_draw(drawn);
    state.winners.set(set.clone());
    Ok(respond(&state, set))
}

pub async fn clear_winners(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    authorize(&headers, &state)?;
    state.winners.clear();
    Ok(Json(json!({ "success": true })))
}
