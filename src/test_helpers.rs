use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::MigrationHarness;
use tempfile::TempDir;

use crate::{DbPool, MIGRATIONS};

#[derive(QueryableByName)]
pub struct TestResult {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub test: i32,
}

/// Create a test database with a temporary file
pub fn create_test_db() -> (TempDir, DbPool) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let manager = ConnectionManager::<SqliteConnection>::new(db_path.display().to_string());
    let pool = r2d2::Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");

    (temp_dir, pool)
}

/// Create an in-memory test database connection
pub fn get_test_db_connection() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:")
        .unwrap_or_else(|_| panic!("Error connecting to in-memory SQLite database"));

    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_db() {
        let (_temp_dir, pool) = create_test_db();
        let mut conn = pool.get().expect("Failed to get connection");

        let result: i32 = diesel::sql_query("SELECT 1 as test")
            .get_result::<TestResult>(&mut conn)
            .map(|r| r.test)
            .expect("Failed to query test database");

        assert_eq!(result, 1);
    }

    #[test]
    fn test_migrations_create_empty_tables() {
        let mut conn = get_test_db_connection();
        let count: i64 = crate::schema::users::table
            .count()
            .get_result(&mut conn)
            .expect("Failed to count users");
        assert_eq!(count, 0);
    }
}
