use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use time::{Date, Month};
use tracing::{info, instrument, warn};

use crate::{
    error::{AppError, AppResult},
    ratings::{
        aggregator::Stars,
        dto::{DailyHistory, HistoryQuery, UpdateRatingRequest, UpdateRatingResponse},
        repo_types::{MealRating, RatingHistoryRow},
        window::{is_within_window, Meal},
    },
    state::AppState,
};

pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/ratings", get(list_ratings))
        .route("/ratings/update", post(update_rating))
        .route("/ratings/history", get(rating_history))
}

#[instrument(skip(state))]
pub async fn list_ratings(State(state): State<AppState>) -> AppResult<Json<Vec<MealRating>>> {
    Ok(Json(state.ratings.list().await?))
}

#[instrument(skip(state, payload), fields(meal = %payload.meal))]
pub async fn update_rating(
    State(state): State<AppState>,
    Json(payload): Json<UpdateRatingRequest>,
) -> AppResult<Json<UpdateRatingResponse>> {
    let stars = Stars::from_json(&payload.new_rating).map_err(|e| {
        warn!(value = %payload.new_rating, "rejected rating value");
        AppError::Validation(e.to_string())
    })?;

    let meal = payload.meal.trim();
    if meal.is_empty() {
        return Err(AppError::Validation("meal is required".into()));
    }

    if state.config.enforce_windows && !is_within_window(meal, state.clock.now()) {
        warn!("rating outside meal window");
        return Err(AppError::NotEligible(format!(
            "You can rate {meal} only during its respective time."
        )));
    }

    let applied = state.ratings.apply_rating(meal, stars).await?;
    info!(
        stars = stars.get(),
        average_rating = applied.rating.average_rating,
        rating_count = applied.rating.rating_count,
        "rating accepted"
    );

    let message = if applied.created {
        "Rating added successfully"
    } else {
        "Rating updated successfully"
    };
    Ok(Json(UpdateRatingResponse {
        message,
        rating: applied.rating,
    }))
}

#[instrument(skip(state))]
pub async fn rating_history(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> AppResult<Json<Vec<DailyHistory>>> {
    let (from, until) = month_bounds(&q.month)
        .ok_or_else(|| AppError::Validation("month must look like YYYY-MM".into()))?;
    let rows = state.ratings.history(from, until).await?;
    Ok(Json(group_by_day(rows)))
}

/// First day of `YYYY-MM` and first day of the month after.
pub(crate) fn month_bounds(raw: &str) -> Option<(Date, Date)> {
    let (year, month) = raw.trim().split_once('-')?;
    if month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
    let from = Date::from_calendar_date(year, month, 1).ok()?;
    let until = match month {
        Month::December => Date::from_calendar_date(year + 1, Month::January, 1).ok()?,
        m => Date::from_calendar_date(year, m.next(), 1).ok()?,
    };
    Some((from, until))
}

/// Folds newest-first history rows into one entry per day, keeping that order.
pub(crate) fn group_by_day(rows: Vec<RatingHistoryRow>) -> Vec<DailyHistory> {
    let mut days: Vec<DailyHistory> = Vec::new();
    for row in rows {
        if days.last().map(|d| d.date) != Some(row.date) {
            days.push(DailyHistory::new(row.date));
        }
        let Some(day) = days.last_mut() else { continue };
        let slot = match row.meal.parse::<Meal>() {
            Ok(Meal::Breakfast) => &mut day.breakfast,
            Ok(Meal::Lunch) => &mut day.lunch,
            Ok(Meal::Snacks) => &mut day.snacks,
            Ok(Meal::Dinner) => &mut day.dinner,
            Err(_) => continue,
        };
        *slot = Some(row.average_rating);
    }
    days
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use time::macros::{date, datetime};
    use tower::ServiceExt;

    use super::*;
    use crate::{clock::FixedClock, ratings::memory::InMemoryMealRecordStore};

    const LUNCHTIME: time::OffsetDateTime = datetime!(2026-10-16 12:30 UTC);

    fn app(state: AppState) -> Router {
        Router::new().nest("/api", rating_routes()).with_state(state)
    }

    async fn post_rating(state: &AppState, body: Value) -> (StatusCode, Value) {
        let res = app(state.clone())
            .oneshot(
                Request::post("/api/ratings/update")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(state: &AppState, uri: &str) -> (StatusCode, Value) {
        let res = app(state.clone())
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn lunch_rating_updates_running_mean() {
        let state = AppState::fake(FixedClock(LUNCHTIME));
        state.ratings.upsert("lunch", 4.0, 3).await.unwrap();

        let (status, body) = post_rating(&state, json!({"meal": "lunch", "newRating": 2})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Rating updated successfully");
        assert_eq!(body["rating"]["rating_count"], 4);
        assert_eq!(body["rating"]["average_rating"], 3.5);
    }

    #[tokio::test]
    async fn first_dinner_rating_creates_row() {
        let state = AppState::from_parts(
            None,
            AppState::fake(FixedClock(LUNCHTIME)).config,
            Arc::new(InMemoryMealRecordStore::new()),
            Arc::new(FixedClock(datetime!(2026-10-16 20:00 UTC))),
        );

        let (status, body) = post_rating(&state, json!({"meal": "dinner", "newRating": 5})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Rating added successfully");
        let dinner = state.ratings.get("dinner").await.unwrap().unwrap();
        assert_eq!(dinner, MealRating { meal: "dinner".into(), average_rating: 5.0, rating_count: 1 });
    }

    #[tokio::test]
    async fn invalid_ratings_leave_store_untouched() {
        let state = AppState::fake(FixedClock(LUNCHTIME));
        state.ratings.upsert("lunch", 4.0, 3).await.unwrap();

        for bad in [json!(0), json!(6), json!(2.5), json!("five"), json!(null)] {
            let (status, body) =
                post_rating(&state, json!({"meal": "lunch", "newRating": bad})).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Rating must be a number between 1 and 5");
        }
        let (status, _) = post_rating(&state, json!({"meal": "lunch"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let lunch = state.ratings.get("lunch").await.unwrap().unwrap();
        assert_eq!((lunch.average_rating, lunch.rating_count), (4.0, 3));
    }

    #[tokio::test]
    async fn outside_window_is_rejected() {
        let state = AppState::fake(FixedClock(datetime!(2026-10-16 16:00 UTC)));
        let (status, body) = post_rating(&state, json!({"meal": "lunch", "newRating": 4})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("lunch"));
        assert_eq!(state.ratings.get("lunch").await.unwrap().unwrap().rating_count, 0);

        // unknown meals never have a window
        let (status, _) = post_rating(&state, json!({"meal": "brunch", "newRating": 4})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(state.ratings.get("brunch").await.unwrap(), None);
    }

    #[tokio::test]
    async fn window_check_can_be_disabled() {
        let fake = AppState::fake(FixedClock(datetime!(2026-10-16 03:00 UTC)));
        let mut config = (*fake.config).clone();
        config.enforce_windows = false;
        let state = AppState { config: Arc::new(config), ..fake };

        let (status, _) = post_rating(&state, json!({"meal": "breakfast", "newRating": 3})).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn list_uses_fixed_display_order() {
        let state = AppState::from_parts(
            None,
            AppState::fake(FixedClock(LUNCHTIME)).config,
            Arc::new(InMemoryMealRecordStore::new()),
            Arc::new(FixedClock(LUNCHTIME)),
        );
        for meal in ["snacks", "breakfast", "dinner", "lunch"] {
            state.ratings.upsert(meal, 0.0, 0).await.unwrap();
        }

        let (status, body) = get_json(&state, "/api/ratings").await;
        assert_eq!(status, StatusCode::OK);
        let meals: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["meal"].as_str().unwrap())
            .collect();
        assert_eq!(meals, ["breakfast", "lunch", "snacks", "dinner"]);
    }

    #[tokio::test]
    async fn history_groups_by_day() {
        let state = AppState::fake(FixedClock(LUNCHTIME));
        let day = |meal: &str, avg: f64| MealRating { meal: meal.into(), average_rating: avg, rating_count: 2 };
        state
            .ratings
            .archive(date!(2026 - 10 - 14), &[day("lunch", 3.5), day("dinner", 4.0)])
            .await
            .unwrap();
        state
            .ratings
            .archive(date!(2026 - 10 - 15), &[day("breakfast", 2.0)])
            .await
            .unwrap();

        let (status, body) = get_json(&state, "/api/ratings/history?month=2026-10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"date": "2026-10-15", "breakfast": 2.0, "lunch": null, "snacks": null, "dinner": null},
                {"date": "2026-10-14", "breakfast": null, "lunch": 3.5, "snacks": null, "dinner": 4.0},
            ])
        );

        let (status, _) = get_json(&state, "/api/ratings/history?month=October").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn month_bounds_roll_over_the_year() {
        assert_eq!(
            month_bounds("2026-12"),
            Some((date!(2026 - 12 - 01), date!(2027 - 01 - 01)))
        );
        assert_eq!(month_bounds("2026-13"), None);
        assert_eq!(month_bounds("2026-1"), None);
    }
}
