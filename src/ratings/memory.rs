use std::collections::{BTreeMap, HashMap};

use axum::async_trait;
use time::Date;
use tokio::sync::Mutex;

use crate::ratings::{
    aggregator::{fold, Stars},
    repo::{sort_for_display, AppliedRating, MealRecordStore},
    repo_types::{MealRating, RatingHistoryRow},
    window::Meal,
};

#[derive(Default)]
struct Tables {
    ratings: HashMap<String, MealRating>,
    history: BTreeMap<(Date, String), RatingHistoryRow>,
}

/// Process-local store. One lock guards every table, so each operation is
/// trivially atomic with respect to the others.
#[derive(Default)]
pub struct InMemoryMealRecordStore {
    tables: Mutex<Tables>,
}

impl InMemoryMealRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the four fixed meals at `(0, 0)`, like a freshly migrated database.
    pub fn seeded() -> Self {
        let ratings = Meal::ALL
            .iter()
            .map(|m| (m.as_str().to_string(), MealRating::empty(m.as_str())))
            .collect();
        Self {
            tables: Mutex::new(Tables {
                ratings,
                history: BTreeMap::new(),
            }),
        }
    }
}

#[async_trait]
impl MealRecordStore for InMemoryMealRecordStore {
    async fn get(&self, meal: &str) -> anyhow::Result<Option<MealRating>> {
        Ok(self.tables.lock().await.ratings.get(meal).cloned())
    }

    async fn upsert(
        &self,
        meal: &str,
        average_rating: f64,
        rating_count: i64,
    ) -> anyhow::Result<()> {
        self.tables.lock().await.ratings.insert(
            meal.to_string(),
            MealRating {
                meal: meal.to_string(),
                average_rating,
                rating_count,
            },
        );
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<MealRating>> {
        let mut rows: Vec<MealRating> =
            self.tables.lock().await.ratings.values().cloned().collect();
        sort_for_display(&mut rows);
        Ok(rows)
    }

    async fn apply_rating(&self, meal: &str, stars: Stars) -> anyhow::Result<AppliedRating> {
        let mut tables = self.tables.lock().await;
        let current = tables.ratings.get(meal);
        let created = current.is_none();
        let next = fold(meal, current, stars);
        tables.ratings.insert(meal.to_string(), next.clone());
        Ok(AppliedRating {
            rating: next,
            created,
        })
    }

    async fn reset_all(&self, meals: &[Meal]) -> anyhow::Result<Vec<MealRating>> {
        let mut tables = self.tables.lock().await;
        let mut previous = Vec::with_capacity(meals.len());
        for meal in meals {
            let fresh = MealRating::empty(meal.as_str());
            if let Some(old) = tables.ratings.insert(meal.as_str().to_string(), fresh) {
                previous.push(old);
            }
        }
        sort_for_display(&mut previous);
        Ok(previous)
    }

    async fn archive(&self, date: Date, rows: &[MealRating]) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        for row in rows {
            tables.history.insert(
                (date, row.meal.clone()),
                RatingHistoryRow {
                    date,
                    meal: row.meal.clone(),
                    average_rating: row.average_rating,
                    rating_count: row.rating_count,
                },
            );
        }
        Ok(())
    }

    async fn history(&self, from: Date, until: Date) -> anyhow::Result<Vec<RatingHistoryRow>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<RatingHistoryRow> = tables
            .history
            .values()
            .filter(|r| r.date >= from && r.date < until)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.meal.cmp(&b.meal)));
        Ok(rows)
    }
}
