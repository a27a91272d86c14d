//! Tests for local database initialization

use mdt_common::db::init::init_database;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("nested").join("mdt.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing_and_keeps_rows() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("mdt.db");

    let pool = init_database(&db_path).await.expect("first open");
    sqlx::query("INSERT INTO debtors (id, name, identification) VALUES (1, 'Petrenko Ivan', '1234567890')")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.expect("second open");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM debtors")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(count, 1, "Existing rows must survive re-initialization");
}

#[tokio::test]
async fn test_phone_records_schema() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let pool = init_database(&dir.path().join("mdt.db")).await.unwrap();

    let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('phone_records')")
        .fetch_all(&pool)
        .await
        .unwrap();

    for expected in [
        "id",
        "batch_id",
        "client_id",
        "name",
        "identification",
        "phone",
        "has_number",
        "checked",
        "created_at",
    ] {
        assert!(
            columns.iter().any(|c| c == expected),
            "phone_records should have column '{}'",
            expected
        );
    }
}
