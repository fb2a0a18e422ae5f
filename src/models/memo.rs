use crate::schema::*;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::now_ts;

#[derive(Debug, Clone, Serialize, Queryable, Identifiable, Selectable, PartialEq)]
#[diesel(table_name = memos)]
pub struct Memo {
    pub id: i32,
    pub content: String,
    pub pinned: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = memos)]
pub struct NewMemo<'a> {
    pub content: &'a str,
    pub pinned: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl<'a> NewMemo<'a> {
    pub fn new(content: &'a str, pinned: bool) -> Self {
        let now = now_ts();
        NewMemo {
            content,
            pinned,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn insert(&self, conn: &mut SqliteConnection) -> QueryResult<Memo> {
        use crate::schema::memos::dsl::memos;
        diesel::insert_into(memos).values(self).get_result(conn)
    }
}

#[derive(Debug, Default, Deserialize, AsChangeset)]
#[diesel(table_name = memos)]
pub struct PartialMemo {
    pub content: Option<String>,
    pub pinned: Option<bool>,
    #[serde(skip)]
    pub updated_at: Option<i64>,
}

impl PartialMemo {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.pinned.is_none()
    }
}

impl Memo {
    /// Pinned first, then most recently edited.
    pub fn get_all(conn: &mut SqliteConnection) -> QueryResult<Vec<Memo>> {
        use crate::schema::memos::dsl::{memos, pinned, updated_at};
        memos
            .order((pinned.desc(), updated_at.desc()))
            .load::<Memo>(conn)
    }

    pub fn update(
        conn: &mut SqliteConnection,
        memo_id: i32,
        mut update: PartialMemo,
    ) -> QueryResult<Memo> {
        use crate::schema::memos::dsl::memos;
        update.updated_at = Some(now_ts());
        diesel::update(memos.find(memo_id))
            .set(&update)
            .get_result(conn)
    }

    pub fn delete(conn: &mut SqliteConnection, memo_id: i32) -> QueryResult<bool> {
        use crate::schema::memos::dsl::memos;
        diesel::delete(memos.find(memo_id))
            .execute(conn)
            .map(|deleted| deleted > 0)
    }
}
