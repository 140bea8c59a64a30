use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    comments::{
        dto::{AddCommentRequest, AddCommentResponse, CommentFilter},
        repo::Comment,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", get(list_comments))
        .route("/comments/add", post(add_comment))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(filter): Query<CommentFilter>,
) -> AppResult<Json<Vec<Comment>>> {
    let db = state.pool("comments")?;
    let meal = filter.meal.as_deref().map(str::trim).filter(|m| !m.is_empty());
    let comments = Comment::list(db, meal).await.map_err(|e| {
        error!(error = %e, "fetching comments failed");
        AppError::Storage(e)
    })?;
    Ok(Json(comments))
}

#[instrument(skip(state, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    Json(payload): Json<AddCommentRequest>,
) -> AppResult<Json<AddCommentResponse>> {
    let (meal, comment) = payload
        .validated()
        .map_err(|msg| AppError::Validation(msg.into()))?;
    let db = state.pool("comments")?;

    let saved = Comment::create(db, meal, comment).await.map_err(|e| {
        error!(error = %e, "inserting comment failed");
        AppError::Storage(e)
    })?;
    info!(comment_id = saved.id, meal = %saved.meal, "comment added");

    Ok(Json(AddCommentResponse {
        success: true,
        message: "Comment submitted successfully!",
    }))
}
