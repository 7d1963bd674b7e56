use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>> {
    // Every pooled connection to `:memory:` opens its own database, so an
    // in-memory url is pinned to a single connection.
    let max_connections = if database_url.contains(":memory:") {
        1
    } else {
        10
    };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn check_ready(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_and_check_ready_on_memory_db() {
        let pool = connect("sqlite::memory:").await.unwrap();
        check_ready(&pool).await.unwrap();
    }
}
