use serde_json::Value;

use crate::ratings::repo_types::MealRating;

/// A validated star rating, 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stars(u8);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Rating must be a number between 1 and 5")]
pub struct InvalidRating;

impl Stars {
    pub fn get(self) -> u8 {
        self.0
    }

    /// Accepts a JSON number that is a whole value in 1..=5 (`4` and `4.0` both pass).
    pub fn from_json(value: &Value) -> Result<Self, InvalidRating> {
        let n = value.as_f64().ok_or(InvalidRating)?;
        if n.fract() != 0.0 {
            return Err(InvalidRating);
        }
        Self::try_from(n as i64)
    }
}

impl TryFrom<i64> for Stars {
    type Error = InvalidRating;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (1..=5).contains(&value) {
            Ok(Stars(value as u8))
        } else {
            Err(InvalidRating)
        }
    }
}

/// Folds one rating into a running mean. `current` is `None` before the meal's first rating.
pub fn fold(meal: &str, current: Option<&MealRating>, stars: Stars) -> MealRating {
    let (average, count) = current
        .map(|r| (r.average_rating, r.rating_count))
        .unwrap_or((0.0, 0));
    let total = average * count as f64 + f64::from(stars.get());
    let count = count + 1;
    MealRating {
        meal: meal.to_string(),
        average_rating: total / count as f64,
        rating_count: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(meal: &str, average_rating: f64, rating_count: i64) -> MealRating {
        MealRating {
            meal: meal.into(),
            average_rating,
            rating_count,
        }
    }

    #[test]
    fn lunch_example_from_menu_board() {
        let before = row("lunch", 4.0, 3);
        let after = fold("lunch", Some(&before), Stars::try_from(2).unwrap());
        assert_eq!(after.rating_count, 4);
        assert!((after.average_rating - 3.5).abs() < 1e-9);
    }

    #[test]
    fn first_rating_creates_row() {
        let after = fold("dinner", None, Stars::try_from(5).unwrap());
        assert_eq!(after, row("dinner", 5.0, 1));
    }

    #[test]
    fn running_mean_tracks_arithmetic_mean() {
        let ratings = [5, 3, 4, 1, 2, 5, 5, 3, 4, 4, 1];
        let mut current: Option<MealRating> = None;
        for (i, r) in ratings.iter().enumerate() {
            let next = fold("snacks", current.as_ref(), Stars::try_from(*r).unwrap());
            assert_eq!(next.rating_count, i as i64 + 1);
            let seen = &ratings[..=i];
            let mean = seen.iter().sum::<i64>() as f64 / seen.len() as f64;
            assert!((next.average_rating - mean).abs() < 1e-9);
            current = Some(next);
        }
    }

    #[test]
    fn stored_average_is_not_rounded() {
        let after = fold("lunch", Some(&row("lunch", 5.0, 2)), Stars::try_from(4).unwrap());
        assert!((after.average_rating - 14.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_and_non_numeric() {
        for bad in [json!(0), json!(6), json!(-1), json!(4.5), json!("4"), json!(null), json!(true)] {
            assert_eq!(Stars::from_json(&bad), Err(InvalidRating), "{bad}");
        }
    }

    #[test]
    fn accepts_whole_numbers_in_range() {
        assert_eq!(Stars::from_json(&json!(1)).unwrap().get(), 1);
        assert_eq!(Stars::from_json(&json!(5.0)).unwrap().get(), 5);
    }
}
