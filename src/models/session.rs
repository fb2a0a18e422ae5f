use crate::schema::sessions;
use diesel::{prelude::*, result::Error as DieselError, SqliteConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::now_ts;

pub const SESSION_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Queryable, Identifiable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = sessions)]
pub struct Session {
    pub id: i32,
    pub session_id: String,
    pub user_id: i32,
    pub expires_at: i64,
    pub created_at: i64,
    pub last_accessed: i64,
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub session_id: String,
    pub user_id: i32,
    pub expires_at: i64,
    pub created_at: i64,
    pub last_accessed: i64,
}

impl Session {
    /// Create a new session for a user
    pub fn create(conn: &mut SqliteConnection, user_id: i32) -> Result<Self, DieselError> {
        let now = now_ts();
        let new_session = NewSession {
            session_id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + SESSION_LIFETIME_SECS,
            created_at: now,
            last_accessed: now,
        };

        diesel::insert_into(sessions::table)
            .values(&new_session)
            .returning(Session::as_returning())
            .get_result(conn)
    }

    /// Get session by session_id if not expired
    pub fn get_valid(conn: &mut SqliteConnection, session_id: &str) -> Option<Self> {
        sessions::table
            .filter(sessions::session_id.eq(session_id))
            .filter(sessions::expires_at.gt(now_ts()))
            .first(conn)
            .ok()
    }

    pub fn touch(&self, conn: &mut SqliteConnection) -> Result<(), DieselError> {
        diesel::update(sessions::table.find(self.id))
            .set(sessions::last_accessed.eq(now_ts()))
            .execute(conn)
            .map(|_| ())
    }

    pub fn delete(conn: &mut SqliteConnection, session_id: &str) -> Result<(), DieselError> {
        diesel::delete(sessions::table.filter(sessions::session_id.eq(session_id)))
            .execute(conn)
            .map(|_| ())
    }

    /// Password changes log every device out.
    pub fn delete_all_for_user(conn: &mut SqliteConnection, user_id: i32) -> Result<(), DieselError> {
        diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id)))
            .execute(conn)
            .map(|_| ())
    }

    pub fn cleanup_expired(conn: &mut SqliteConnection) -> Result<usize, DieselError> {
        diesel::delete(sessions::table.filter(sessions::expires_at.le(now_ts()))).execute(conn)
    }
}
