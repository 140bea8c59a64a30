use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The fixed daily meal categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Snacks,
    Dinner,
}

/// Inclusive local-time range, in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingWindow {
    pub start: u16,
    pub end: u16,
}

impl RatingWindow {
    const fn hm(start_h: u16, start_m: u16, end_h: u16, end_m: u16) -> Self {
        Self {
            start: start_h * 60 + start_m,
            end: end_h * 60 + end_m,
        }
    }

    pub fn contains(&self, minute_of_day: u16) -> bool {
        minute_of_day >= self.start && minute_of_day <= self.end
    }
}

impl Meal {
    pub const ALL: [Meal; 4] = [Meal::Breakfast, Meal::Lunch, Meal::Snacks, Meal::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Snacks => "snacks",
            Meal::Dinner => "dinner",
        }
    }

    pub fn window(&self) -> RatingWindow {
        match self {
            Meal::Breakfast => RatingWindow::hm(7, 15, 9, 45),
            Meal::Lunch => RatingWindow::hm(11, 45, 15, 30),
            Meal::Snacks => RatingWindow::hm(17, 30, 19, 30),
            Meal::Dinner => RatingWindow::hm(19, 15, 21, 45),
        }
    }

    /// Display position; names outside the fixed set sort after all four.
    pub fn display_rank(name: &str) -> usize {
        name.parse::<Meal>()
            .map(|m| m as usize)
            .unwrap_or(Meal::ALL.len())
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown meal: {0}")]
pub struct UnknownMeal(pub String);

impl FromStr for Meal {
    type Err = UnknownMeal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(Meal::Breakfast),
            "lunch" => Ok(Meal::Lunch),
            "snacks" => Ok(Meal::Snacks),
            "dinner" => Ok(Meal::Dinner),
            other => Err(UnknownMeal(other.to_string())),
        }
    }
}

/// Whether `meal` may be rated at local time `now`. Unknown meals are never eligible.
pub fn is_within_window(meal: &str, now: OffsetDateTime) -> bool {
    let Ok(meal) = meal.parse::<Meal>() else {
        return false;
    };
    let minute_of_day = u16::from(now.hour()) * 60 + u16::from(now.minute());
    meal.window().contains(minute_of_day)
}
