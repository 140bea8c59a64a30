use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub meal: String,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl Comment {
    /// Newest first, optionally only for one meal.
    pub async fn list(db: &PgPool, meal: Option<&str>) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, meal, comment, date
            FROM comments
            WHERE $1::text IS NULL OR meal = $1
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(meal)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(db: &PgPool, meal: &str, comment: &str) -> anyhow::Result<Comment> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (meal, comment)
            VALUES ($1, $2)
            RETURNING id, meal, comment, date
            "#,
        )
        .bind(meal)
        .bind(comment)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}
