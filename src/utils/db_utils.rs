use sqlx::mysql::MySqlDatabaseError;

use crate::error::AttendanceError;

/// MySQL error number for a duplicate unique key.
const ER_DUP_ENTRY: u16 = 1062;

/// SQLSTATE class for integrity constraint violations.
const INTEGRITY_VIOLATION: &str = "23000";

/// True when `err` is the database rejecting a duplicate key.
pub fn is_duplicate_entry(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => match db_err.try_downcast_ref::<MySqlDatabaseError>() {
            Some(mysql_err) => mysql_err.number() == ER_DUP_ENTRY,
            None => db_err.code().as_deref() == Some(INTEGRITY_VIOLATION),
        },
        _ => false,
    }
}

/// Maps an insert failure: duplicate keys become `Conflict(conflict_msg)`,
/// everything else stays a storage error.
pub fn map_insert_error(err: sqlx::Error, conflict_msg: impl Into<String>) -> AttendanceError {
    if is_duplicate_entry(&err) {
        AttendanceError::Conflict(conflict_msg.into())
    } else {
        AttendanceError::Storage(err)
    }
}
