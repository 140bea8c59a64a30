use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

use crate::ratings::repo_types::{iso_date, MealRating};

/// Body of `POST /api/ratings/update`. `newRating` is kept raw so malformed
/// values get the rating message instead of a generic JSON rejection.
#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    #[serde(default)]
    pub meal: String,
    #[serde(rename = "newRating", default)]
    pub new_rating: Value,
}

#[derive(Debug, Serialize)]
pub struct UpdateRatingResponse {
    pub message: &'static str,
    pub rating: MealRating,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// `YYYY-MM`
    pub month: String,
}

/// One row of the history table: each meal's closing average for `date`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyHistory {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub breakfast: Option<f64>,
    pub lunch: Option<f64>,
    pub snacks: Option<f64>,
    pub dinner: Option<f64>,
}

impl DailyHistory {
    pub fn new(date: Date) -> Self {
        Self {
            date,
            breakfast: None,
            lunch: None,
            snacks: None,
            dinner: None,
        }
    }
}
