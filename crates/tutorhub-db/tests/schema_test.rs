//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    tutorhub_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    for table in [
        "teacher_profile",
        "subject",
        "availability",
        "booking",
        "booking_history",
        "teaching_session",
        "booking_modification",
        "booking_draft",
        "_migration",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    tutorhub_db::run_migrations(&db).await.unwrap();
    tutorhub_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 2, "expected one record per migration");
}

#[tokio::test]
async fn one_session_per_booking_is_enforced() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tutorhub_db::run_migrations(&db).await.unwrap();

    let insert = "CREATE teaching_session SET \
         booking_id = 'b-1', teacher_id = 't-1', student_id = 's-1', \
         subject_id = 'sub-1', session_date = '2030-03-11', \
         start_time = '18:00', end_time = '19:00', status = 'Scheduled'";

    db.query(insert).await.unwrap().check().unwrap();
    let second = db.query(insert).await.unwrap().check();
    assert!(second.is_err(), "duplicate session should be rejected");
}

#[tokio::test]
async fn unknown_history_action_is_rejected() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tutorhub_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE booking_history SET booking_id = 'b-1', \
             action = 'deleted', performed_by_id = 'u-1'",
        )
        .await
        .unwrap()
        .check();
    assert!(result.is_err(), "history actions are a closed set");
}

#[tokio::test]
async fn one_pending_modification_per_booking_is_enforced() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tutorhub_db::run_migrations(&db).await.unwrap();

    let insert = "CREATE booking_modification SET \
         booking_id = 'b-1', requested_by_id = 'u-1', kind = 'Reschedule', \
         proposed_date = '2030-03-13', proposed_start_time = '10:00', \
         proposed_end_time = '11:00', status = 'Pending', pending_guard = 'b-1'";

    db.query(insert).await.unwrap().check().unwrap();
    let second = db.query(insert).await.unwrap().check();
    assert!(second.is_err(), "second pending request should be rejected");
}
