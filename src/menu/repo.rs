use serde::Serialize;
use sqlx::{FromRow, PgPool};

/// All items served for one meal on a given day of a rotation week.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MealMenu {
    pub meal: String,
    pub items: Vec<String>,
}

pub async fn menu_for_day(db: &PgPool, day: &str, week: i32) -> anyhow::Result<Vec<MealMenu>> {
    let rows = sqlx::query_as::<_, MealMenu>(
        r#"
        SELECT meal, array_agg(item ORDER BY position, item) AS items
        FROM menu
        WHERE lower(day) = lower($1) AND week = $2
        GROUP BY meal
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
    .bind(day)
    .bind(week)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    #[ignore = "needs PostgreSQL via DATABASE_URL"]
    async fn seeded_week_is_served_in_meal_order(db: PgPool) {
        let menu = menu_for_day(&db, "monday", 1).await.unwrap();
        let meals: Vec<&str> = menu.iter().map(|m| m.meal.as_str()).collect();
        assert_eq!(meals, ["breakfast", "lunch", "snacks", "dinner"]);
        assert_eq!(menu[0].items, ["Poha", "Boiled eggs", "Tea"]);

        assert!(menu_for_day(&db, "Monday", 2).await.unwrap().is_empty());
    }
}
