use anyhow::Result;
use sqlx::{migrate::Migrator, Pool, Sqlite};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run(pool: &Pool<Sqlite>) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_apply_cleanly() {
        let pool = crate::db::connect("sqlite::memory:").await.unwrap();
        run(&pool).await.unwrap();

        sqlx::query("SELECT run_id FROM runs LIMIT 1")
            .fetch_optional(&pool)
            .await
            .unwrap();
        sqlx::query("SELECT image_url FROM approved_samples LIMIT 1")
            .fetch_optional(&pool)
            .await
            .unwrap();
        sqlx::query("SELECT image_url FROM rejected_samples LIMIT 1")
            .fetch_optional(&pool)
            .await
            .unwrap();
    }
}
