use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;

time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MealRating {
    pub meal: String,
    pub average_rating: f64,
    pub rating_count: i64,
}

impl MealRating {
    pub fn empty(meal: &str) -> Self {
        Self {
            meal: meal.to_string(),
            average_rating: 0.0,
            rating_count: 0,
        }
    }
}

/// A meal's aggregate as it stood when the daily reset closed `date`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RatingHistoryRow {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meal: String,
    pub average_rating: f64,
    pub rating_count: i64,
}
