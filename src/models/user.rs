use crate::schema::*;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use diesel::prelude::*;
use serde::Serialize;

use super::now_ts;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Serialize, Queryable, Identifiable, Selectable, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
struct NewUser<'a> {
    username: &'a str,
    password_hash: &'a str,
    created_at: i64,
}

#[derive(Debug, PartialEq)]
pub enum UserError {
    PasswordTooShort,
    PasswordHashError,
    DatabaseError,
}

impl User {
    /// The dashboard has one user; this is it, if it has been set up.
    pub fn get_owner(conn: &mut SqliteConnection) -> Option<User> {
        use crate::schema::users::dsl::{id, users};
        match users.order(id.asc()).first::<User>(conn) {
            Ok(user) => Some(user),
            Err(diesel::result::Error::NotFound) => None,
            Err(e) => {
                log::warn!("Error getting user: {e:?}");
                None
            }
        }
    }

    pub fn get_by_id(conn: &mut SqliteConnection, user_id: i32) -> Option<User> {
        use crate::schema::users::dsl::users;
        users.find(user_id).first::<User>(conn).ok()
    }

    /// Create the owner account, or replace the owner's name and password.
    pub fn set_password(
        conn: &mut SqliteConnection,
        name: &str,
        password: &str,
    ) -> Result<User, UserError> {
        use crate::schema::users::dsl::{password_hash, username, users};

        let hash = Self::hash_password(password)?;
        let result: QueryResult<User> = match Self::get_owner(conn) {
            Some(owner) => diesel::update(users.find(owner.id))
                .set((username.eq(name), password_hash.eq(&hash)))
                .get_result(conn),
            None => diesel::insert_into(users)
                .values(&NewUser {
                    username: name,
                    password_hash: &hash,
                    created_at: now_ts(),
                })
                .get_result(conn),
        };

        result.map_err(|e| {
            log::error!("Failed to store user: {e:?}");
            UserError::DatabaseError
        })
    }

    fn hash_password(password: &str) -> Result<String, UserError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(UserError::PasswordTooShort);
        }
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| UserError::PasswordHashError)
    }

    pub fn check_password(&self, password: &str) -> Result<bool, UserError> {
        let parsed = PasswordHash::new(&self.password_hash).map_err(|_| {
            log::error!("Failed to parse password hash");
            UserError::PasswordHashError
        })?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}
