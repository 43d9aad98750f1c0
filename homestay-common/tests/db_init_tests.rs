//! Database initialization tests

use homestay_common::db::init_database;
use tempfile::TempDir;

#[tokio::test]
async fn test_creates_database_file_and_schema() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("data").join("homestay.db");

    let pool = init_database(&db_path).await.unwrap();
    assert!(db_path.exists(), "Database file should be created");

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('homes', 'users', 'sessions')",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_reopen_preserves_rows() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("homestay.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query(
        "INSERT INTO homes (guid, house_name, price, location, rating, photo) VALUES ('h1', 'Lake Cabin', 120.0, 'Tahoe', 4.5, 'uploads/a.jpg')",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;

    // Second init must be idempotent and keep data
    let pool = init_database(&db_path).await.unwrap();
    let name: String = sqlx::query_scalar("SELECT house_name FROM homes WHERE guid = 'h1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(name, "Lake Cabin");
}
