//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs, dates and times of day are stored as strings. Enums are
//! stored as strings with ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "single_pending_modification",
        sql: SCHEMA_V2,
    },
];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Teacher profiles (record key = teacher id)
-- =======================================================================
DEFINE TABLE teacher_profile SCHEMAFULL;
DEFINE FIELD teacher_id ON TABLE teacher_profile TYPE string;
DEFINE FIELD hourly_rate_ngn ON TABLE teacher_profile TYPE option<float>;
DEFINE FIELD hourly_rate_usd ON TABLE teacher_profile TYPE option<float>;
DEFINE FIELD preferred_currency ON TABLE teacher_profile TYPE string \
    ASSERT $value IN ['NGN', 'USD'];
DEFINE FIELD holiday_mode ON TABLE teacher_profile TYPE bool DEFAULT false;
DEFINE FIELD time_zone ON TABLE teacher_profile TYPE string;
DEFINE FIELD subjects ON TABLE teacher_profile TYPE array<string> \
    DEFAULT [];
DEFINE FIELD specializations ON TABLE teacher_profile \
    TYPE array<string> DEFAULT [];
DEFINE FIELD created_at ON TABLE teacher_profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE teacher_profile TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_teacher_profile_teacher ON TABLE teacher_profile \
    COLUMNS teacher_id UNIQUE;

-- =======================================================================
-- Subjects
-- =======================================================================
DEFINE TABLE subject SCHEMAFULL;
DEFINE FIELD name ON TABLE subject TYPE string;
DEFINE FIELD is_active ON TABLE subject TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE subject TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_subject_name ON TABLE subject COLUMNS name UNIQUE;

-- =======================================================================
-- Weekly availability windows (0 = Sunday ... 6 = Saturday)
-- =======================================================================
DEFINE TABLE availability SCHEMAFULL;
DEFINE FIELD teacher_id ON TABLE availability TYPE string;
DEFINE FIELD day_of_week ON TABLE availability TYPE int \
    ASSERT $value >= 0 AND $value <= 6;
DEFINE FIELD start_time ON TABLE availability TYPE string;
DEFINE FIELD end_time ON TABLE availability TYPE string;
DEFINE FIELD is_active ON TABLE availability TYPE bool DEFAULT true;
DEFINE FIELD time_zone ON TABLE availability TYPE string;
DEFINE FIELD created_at ON TABLE availability TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE availability TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_availability_teacher ON TABLE availability \
    COLUMNS teacher_id;

-- =======================================================================
-- Bookings (rate fields are READONLY once written)
-- =======================================================================
DEFINE TABLE booking SCHEMAFULL;
DEFINE FIELD booking_uuid ON TABLE booking TYPE string READONLY;
DEFINE FIELD student_id ON TABLE booking TYPE string;
DEFINE FIELD teacher_id ON TABLE booking TYPE string;
DEFINE FIELD subject_id ON TABLE booking TYPE string;
DEFINE FIELD booking_date ON TABLE booking TYPE string;
DEFINE FIELD start_time ON TABLE booking TYPE string;
DEFINE FIELD end_time ON TABLE booking TYPE string;
DEFINE FIELD duration_minutes ON TABLE booking TYPE int;
DEFINE FIELD status ON TABLE booking TYPE string \
    ASSERT $value IN ['Pending', 'Approved', 'Confirmed', 'Declined', \
    'Rejected', 'Cancelled', 'Completed'];
DEFINE FIELD hourly_rate_ngn ON TABLE booking TYPE float READONLY;
DEFINE FIELD hourly_rate_usd ON TABLE booking TYPE float READONLY;
DEFINE FIELD rate_currency ON TABLE booking TYPE string READONLY \
    ASSERT $value IN ['NGN', 'USD'];
DEFINE FIELD exchange_rate_used ON TABLE booking TYPE float READONLY;
DEFINE FIELD rate_locked_at ON TABLE booking TYPE datetime READONLY;
DEFINE FIELD created_by_id ON TABLE booking TYPE string READONLY;
DEFINE FIELD notes ON TABLE booking TYPE option<string>;
DEFINE FIELD approved_at ON TABLE booking TYPE option<datetime>;
DEFINE FIELD rejection_reason ON TABLE booking TYPE option<string>;
DEFINE FIELD rejected_at ON TABLE booking TYPE option<datetime>;
DEFINE FIELD cancelled_by_id ON TABLE booking TYPE option<string>;
DEFINE FIELD cancelled_at ON TABLE booking TYPE option<datetime>;
DEFINE FIELD cancellation_reason ON TABLE booking TYPE option<string>;
DEFINE FIELD completed_at ON TABLE booking TYPE option<datetime>;
DEFINE FIELD version ON TABLE booking TYPE int DEFAULT 1;
DEFINE FIELD created_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_booking_uuid ON TABLE booking \
    COLUMNS booking_uuid UNIQUE;
DEFINE INDEX idx_booking_teacher_date ON TABLE booking \
    COLUMNS teacher_id, booking_date;
DEFINE INDEX idx_booking_student ON TABLE booking COLUMNS student_id;
DEFINE INDEX idx_booking_status_date ON TABLE booking \
    COLUMNS status, booking_date;

-- =======================================================================
-- Booking history (append-only)
-- =======================================================================
DEFINE TABLE booking_history SCHEMAFULL;
DEFINE FIELD booking_id ON TABLE booking_history TYPE string;
DEFINE FIELD action ON TABLE booking_history TYPE string \
    ASSERT $value IN ['created', 'approved', 'rejected', 'rescheduled', \
    'cancelled', 'confirmed', 'completed'];
DEFINE FIELD previous_data ON TABLE booking_history \
    TYPE option<object> FLEXIBLE;
DEFINE FIELD new_data ON TABLE booking_history \
    TYPE option<object> FLEXIBLE;
DEFINE FIELD performed_by_id ON TABLE booking_history TYPE string;
DEFINE FIELD notes ON TABLE booking_history TYPE option<string>;
DEFINE FIELD ip_address ON TABLE booking_history TYPE option<string>;
DEFINE FIELD user_agent ON TABLE booking_history TYPE option<string>;
DEFINE FIELD created_at ON TABLE booking_history TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_booking_history_booking ON TABLE booking_history \
    COLUMNS booking_id;

-- =======================================================================
-- Teaching sessions (record key = booking id)
-- =======================================================================
DEFINE TABLE teaching_session SCHEMAFULL;
DEFINE FIELD booking_id ON TABLE teaching_session TYPE string;
DEFINE FIELD teacher_id ON TABLE teaching_session TYPE string;
DEFINE FIELD student_id ON TABLE teaching_session TYPE string;
DEFINE FIELD subject_id ON TABLE teaching_session TYPE string;
DEFINE FIELD session_date ON TABLE teaching_session TYPE string;
DEFINE FIELD start_time ON TABLE teaching_session TYPE string;
DEFINE FIELD end_time ON TABLE teaching_session TYPE string;
DEFINE FIELD status ON TABLE teaching_session TYPE string \
    ASSERT $value IN ['Scheduled', 'Completed', 'Cancelled'];
DEFINE FIELD meeting_link ON TABLE teaching_session TYPE option<string>;
DEFINE FIELD teacher_notes ON TABLE teaching_session TYPE option<string>;
DEFINE FIELD student_rating ON TABLE teaching_session TYPE option<int> \
    ASSERT $value = NONE OR ($value >= 1 AND $value <= 5);
DEFINE FIELD created_at ON TABLE teaching_session TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE teaching_session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_teaching_session_booking ON TABLE teaching_session \
    COLUMNS booking_id UNIQUE;

-- =======================================================================
-- Booking modification requests
-- =======================================================================
DEFINE TABLE booking_modification SCHEMAFULL;
DEFINE FIELD booking_id ON TABLE booking_modification TYPE string;
DEFINE FIELD requested_by_id ON TABLE booking_modification TYPE string;
DEFINE FIELD kind ON TABLE booking_modification TYPE string \
    ASSERT $value IN ['Reschedule', 'Rebook'];
DEFINE FIELD proposed_date ON TABLE booking_modification TYPE string;
DEFINE FIELD proposed_start_time ON TABLE booking_modification \
    TYPE string;
DEFINE FIELD proposed_end_time ON TABLE booking_modification TYPE string;
DEFINE FIELD reason ON TABLE booking_modification TYPE option<string>;
DEFINE FIELD status ON TABLE booking_modification TYPE string \
    ASSERT $value IN ['Pending', 'Approved', 'Rejected', 'Withdrawn'];
DEFINE FIELD responded_by_id ON TABLE booking_modification \
    TYPE option<string>;
DEFINE FIELD response_note ON TABLE booking_modification \
    TYPE option<string>;
DEFINE FIELD responded_at ON TABLE booking_modification \
    TYPE option<datetime>;
DEFINE FIELD resulting_booking_id ON TABLE booking_modification \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE booking_modification TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE booking_modification TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_booking_modification_booking \
    ON TABLE booking_modification COLUMNS booking_id, status;

-- =======================================================================
-- Booking drafts (multi-step form state)
-- =======================================================================
DEFINE TABLE booking_draft SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE booking_draft TYPE string;
DEFINE FIELD student_id ON TABLE booking_draft TYPE option<string>;
DEFINE FIELD teacher_id ON TABLE booking_draft TYPE option<string>;
DEFINE FIELD subject_id ON TABLE booking_draft TYPE option<string>;
DEFINE FIELD dates ON TABLE booking_draft TYPE array<string> DEFAULT [];
DEFINE FIELD availability_ids ON TABLE booking_draft TYPE array<string> \
    DEFAULT [];
DEFINE FIELD notes ON TABLE booking_draft TYPE option<string>;
DEFINE FIELD version ON TABLE booking_draft TYPE int DEFAULT 1;
DEFINE FIELD expires_at ON TABLE booking_draft TYPE datetime;
DEFINE FIELD created_at ON TABLE booking_draft TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE booking_draft TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_booking_draft_expires ON TABLE booking_draft \
    COLUMNS expires_at;
";

// -----------------------------------------------------------------------
// Schema v2: one pending modification request per booking
// -----------------------------------------------------------------------

// `pending_guard` holds the booking id while a request is Pending and the
// request's own id otherwise, so the unique index admits one pending
// request per booking.
const SCHEMA_V2: &str = "\
DEFINE FIELD pending_guard ON TABLE booking_modification TYPE string;
UPDATE booking_modification SET pending_guard = booking_id \
    WHERE status = 'Pending';
UPDATE booking_modification SET pending_guard = meta::id(id) \
    WHERE status != 'Pending';
DEFINE INDEX idx_booking_modification_pending \
    ON TABLE booking_modification COLUMNS pending_guard UNIQUE;
";

/// Run all pending migrations against the database.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
