use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};

use crate::{
    error::{AppError, AppResult},
    menu::repo::{menu_for_day, MealMenu},
    state::AppState,
};

pub fn menu_routes() -> Router<AppState> {
    Router::new().route("/menu/:day/:week", get(get_menu))
}

#[instrument(skip(state))]
pub async fn get_menu(
    State(state): State<AppState>,
    Path((day, week)): Path<(String, String)>,
) -> AppResult<Json<Vec<MealMenu>>> {
    let week = parse_week(&week)?;
    let day = day.trim();
    if day.is_empty() {
        return Err(AppError::Validation("day is required".into()));
    }
    let db = state.pool("menu")?;

    let menu = menu_for_day(db, day, week).await?;
    debug!(meals = menu.len(), "menu loaded");
    Ok(Json(menu))
}

fn parse_week(raw: &str) -> AppResult<i32> {
    match raw.trim().parse::<i32>() {
        Ok(w) if w > 0 => Ok(w),
        _ => Err(AppError::Validation(
            "week must be a positive integer".into(),
        )),
    }
}
