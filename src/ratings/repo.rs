use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use time::Date;
use tracing::debug;

use crate::ratings::{
    aggregator::{fold, Stars},
    repo_types::{MealRating, RatingHistoryRow},
    window::Meal,
};

/// Result of folding one rating into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedRating {
    pub rating: MealRating,
    /// The meal had no row before this rating.
    pub created: bool,
}

/// Owner of the per-meal aggregates.
///
/// `apply_rating` and `reset_all` are the only writers that read first; each
/// implementation runs them as one exclusive unit per meal so concurrent
/// submissions and the midnight reset never lose or resurrect counts.
#[async_trait]
pub trait MealRecordStore: Send + Sync {
    async fn get(&self, meal: &str) -> anyhow::Result<Option<MealRating>>;

    async fn upsert(&self, meal: &str, average_rating: f64, rating_count: i64)
        -> anyhow::Result<()>;

    /// All rows in display order.
    async fn list(&self) -> anyhow::Result<Vec<MealRating>>;

    async fn apply_rating(&self, meal: &str, stars: Stars) -> anyhow::Result<AppliedRating>;

    /// Zeroes `meals` and returns their rows as they were just before.
    async fn reset_all(&self, meals: &[Meal]) -> anyhow::Result<Vec<MealRating>>;

    async fn archive(&self, date: Date, rows: &[MealRating]) -> anyhow::Result<()>;

    /// History rows with `from <= date < until`, newest first.
    async fn history(&self, from: Date, until: Date) -> anyhow::Result<Vec<RatingHistoryRow>>;
}

pub fn sort_for_display(rows: &mut [MealRating]) {
    rows.sort_by(|a, b| {
        Meal::display_rank(&a.meal)
            .cmp(&Meal::display_rank(&b.meal))
            .then_with(|| a.meal.cmp(&b.meal))
    });
}

fn meal_names(meals: &[Meal]) -> Vec<String> {
    meals.iter().map(|m| m.as_str().to_string()).collect()
}

#[derive(Clone)]
pub struct PgMealRecordStore {
    db: PgPool,
}

impl PgMealRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealRecordStore for PgMealRecordStore {
    async fn get(&self, meal: &str) -> anyhow::Result<Option<MealRating>> {
        let row = sqlx::query_as::<_, MealRating>(
            r#"
            SELECT meal, average_rating, rating_count
            FROM ratings
            WHERE meal = $1
            "#,
        )
        .bind(meal)
        .fetch_optional(&self.db)
        .await
        .context("select rating")?;
        Ok(row)
    }

    async fn upsert(
        &self,
        meal: &str,
        average_rating: f64,
        rating_count: i64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ratings (meal, average_rating, rating_count)
            VALUES ($1, $2, $3)
            ON CONFLICT (meal) DO UPDATE
            SET average_rating = EXCLUDED.average_rating,
                rating_count = EXCLUDED.rating_count
            "#,
        )
        .bind(meal)
        .bind(average_rating)
        .bind(rating_count)
        .execute(&self.db)
        .await
        .context("upsert rating")?;
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<MealRating>> {
        let rows = sqlx::query_as::<_, MealRating>(
            r#"
            SELECT meal, average_rating, rating_count
            FROM ratings
            ORDER BY
              CASE meal
                WHEN 'breakfast' THEN 1
                WHEN 'lunch' THEN 2
                WHEN 'snacks' THEN 3
                WHEN 'dinner' THEN 4
                ELSE 5
              END,
              meal
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list ratings")?;
        Ok(rows)
    }

    async fn apply_rating(&self, meal: &str, stars: Stars) -> anyhow::Result<AppliedRating> {
        let mut tx = self.db.begin().await.context("begin rating transaction")?;

        // Make sure a row exists so FOR UPDATE has something to lock even for
        // a meal's very first rating.
        let inserted = sqlx::query(
            r#"
            INSERT INTO ratings (meal, average_rating, rating_count)
            VALUES ($1, 0, 0)
            ON CONFLICT (meal) DO NOTHING
            "#,
        )
        .bind(meal)
        .execute(&mut *tx)
        .await
        .context("seed rating row")?
        .rows_affected();

        let current = sqlx::query_as::<_, MealRating>(
            r#"
            SELECT meal, average_rating, rating_count
            FROM ratings
            WHERE meal = $1
            FOR UPDATE
            "#,
        )
        .bind(meal)
        .fetch_one(&mut *tx)
        .await
        .context("lock rating row")?;

        let next = fold(meal, Some(&current), stars);

        sqlx::query(
            r#"
            UPDATE ratings
            SET average_rating = $2, rating_count = $3
            WHERE meal = $1
            "#,
        )
        .bind(meal)
        .bind(next.average_rating)
        .bind(next.rating_count)
        .execute(&mut *tx)
        .await
        .context("update rating")?;

        tx.commit().await.context("commit rating transaction")?;
        debug!(meal, rating_count = next.rating_count, "rating folded");

        Ok(AppliedRating {
            rating: next,
            created: inserted == 1,
        })
    }

    async fn reset_all(&self, meals: &[Meal]) -> anyhow::Result<Vec<MealRating>> {
        let names = meal_names(meals);
        let mut tx = self.db.begin().await.context("begin reset transaction")?;

        let mut previous = sqlx::query_as::<_, MealRating>(
            r#"
            SELECT meal, average_rating, rating_count
            FROM ratings
            WHERE meal = ANY($1)
            ORDER BY meal
            FOR UPDATE
            "#,
        )
        .bind(&names)
        .fetch_all(&mut *tx)
        .await
        .context("lock ratings for reset")?;

        sqlx::query(
            r#"
            INSERT INTO ratings (meal, average_rating, rating_count)
            SELECT name, 0, 0 FROM UNNEST($1::text[]) AS name
            ON CONFLICT (meal) DO UPDATE
            SET average_rating = 0, rating_count = 0
            "#,
        )
        .bind(&names)
        .execute(&mut *tx)
        .await
        .context("zero ratings")?;

        tx.commit().await.context("commit reset transaction")?;

        sort_for_display(&mut previous);
        Ok(previous)
    }

    async fn archive(&self, date: Date, rows: &[MealRating]) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin archive transaction")?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO rating_history (date, meal, average_rating, rating_count)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (date, meal) DO UPDATE
                SET average_rating = EXCLUDED.average_rating,
                    rating_count = EXCLUDED.rating_count
                "#,
            )
            .bind(date)
            .bind(&row.meal)
            .bind(row.average_rating)
            .bind(row.rating_count)
            .execute(&mut *tx)
            .await
            .context("insert rating history")?;
        }
        tx.commit().await.context("commit archive transaction")?;
        Ok(())
    }

    async fn history(&self, from: Date, until: Date) -> anyhow::Result<Vec<RatingHistoryRow>> {
        let rows = sqlx::query_as::<_, RatingHistoryRow>(
            r#"
            SELECT date, meal, average_rating, rating_count
            FROM rating_history
            WHERE date >= $1 AND date < $2
            ORDER BY date DESC, meal
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await
        .context("select rating history")?;
        Ok(rows)
    }
}
