use crate::schema::*;
use diesel::{dsl::max, prelude::*};
use serde::{Deserialize, Serialize};

use super::now_ts;

#[derive(Debug, Clone, Serialize, Queryable, Identifiable, Selectable, PartialEq)]
#[diesel(table_name = bookmarks)]
pub struct Bookmark {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub favicon: Option<String>,
    pub position: i32,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = bookmarks)]
pub struct NewBookmark<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub favicon: Option<&'a str>,
    pub position: i32,
    pub created_at: i64,
}

impl<'a> NewBookmark<'a> {
    pub fn new(title: &'a str, url: &'a str, favicon: Option<&'a str>) -> Self {
        NewBookmark {
            title,
            url,
            favicon,
            position: 0,
            created_at: now_ts(),
        }
    }

    /// Inserts at the end, or returns the existing bookmark for the same URL.
    pub fn insert_if_not_present(mut self, conn: &mut SqliteConnection) -> QueryResult<Bookmark> {
        use crate::schema::bookmarks::dsl::{bookmarks, position};
        if let Some(existing) = Bookmark::get_by_url(conn, self.url)? {
            log::debug!("Bookmark already exists: {}", self.url);
            return Ok(existing);
        }
        let last: Option<i32> = bookmarks.select(max(position)).first(conn)?;
        self.position = last.map(|p| p + 1).unwrap_or(0);
        diesel::insert_into(bookmarks).values(&self).get_result(conn)
    }
}

#[derive(Debug, Default, Deserialize, AsChangeset)]
#[diesel(table_name = bookmarks)]
pub struct PartialBookmark {
    pub title: Option<String>,
    pub url: Option<String>,
    pub favicon: Option<String>,
    pub position: Option<i32>,
}

impl PartialBookmark {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none() && self.favicon.is_none() && self.position.is_none()
    }
}

impl Bookmark {
    pub fn get_all(conn: &mut SqliteConnection) -> QueryResult<Vec<Bookmark>> {
        use crate::schema::bookmarks::dsl::{bookmarks, id, position};
        bookmarks.order((position.asc(), id.asc())).load(conn)
    }

    pub fn get_by_url(conn: &mut SqliteConnection, target: &str) -> QueryResult<Option<Bookmark>> {
        use crate::schema::bookmarks::dsl::{bookmarks, url};
        bookmarks.filter(url.eq(target)).first(conn).optional()
    }

    pub fn update(
        conn: &mut SqliteConnection,
        bookmark_id: i32,
        update: &PartialBookmark,
    ) -> QueryResult<Bookmark> {
        use crate::schema::bookmarks::dsl::bookmarks;
        diesel::update(bookmarks.find(bookmark_id))
            .set(update)
            .get_result(conn)
    }

    pub fn delete(conn: &mut SqliteConnection, bookmark_id: i32) -> QueryResult<bool> {
        use crate::schema::bookmarks::dsl::bookmarks;
        diesel::delete(bookmarks.find(bookmark_id))
            .execute(conn)
            .map(|deleted| deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::get_test_db_connection;

    #[test]
    fn test_duplicate_url_returns_existing() {
        let mut conn = get_test_db_connection();
        let first = NewBookmark::new("Rust", "https://www.rust-lang.org", None)
            .insert_if_not_present(&mut conn)
            .unwrap();
        let again = NewBookmark::new("Rust again", "https://www.rust-lang.org", None)
            .insert_if_not_present(&mut conn)
            .unwrap();
        assert_eq!(first, again);
        assert_eq!(Bookmark::get_all(&mut conn).unwrap().len(), 1);
    }

    #[test]
    fn test_positions_and_update() {
        let mut conn = get_test_db_connection();
        let a = NewBookmark::new("A", "https://a.example", None)
            .insert_if_not_present(&mut conn)
            .unwrap();
        let b = NewBookmark::new("B", "https://b.example", Some("https://b.example/favicon.ico"))
            .insert_if_not_present(&mut conn)
            .unwrap();
        assert_eq!((a.position, b.position), (0, 1));

        let moved = PartialBookmark {
            position: Some(-1),
            ..Default::default()
        };
        Bookmark::update(&mut conn, b.id, &moved).unwrap();
        let order: Vec<i32> = Bookmark::get_all(&mut conn)
            .unwrap()
            .iter()
            .map(|bm| bm.id)
            .collect();
        assert_eq!(order, vec![b.id, a.id]);
    }
}
