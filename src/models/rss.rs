use crate::feeds::ParsedArticle;
use crate::schema::*;
use diesel::{dsl::max, prelude::*};
use serde::{Deserialize, Serialize};

use super::now_ts;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Selectable, PartialEq)]
#[diesel(table_name = rss_categories)]
pub struct RssCategory {
    pub id: i32,
    pub name: String,
    pub position: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = rss_categories)]
struct NewRssCategory<'a> {
    name: &'a str,
    position: i32,
}

#[derive(Debug, Clone, Serialize, Queryable, Identifiable, Selectable, PartialEq)]
#[diesel(table_name = rss_feeds)]
pub struct RssFeed {
    pub id: i32,
    pub url: String,
    pub title: String,
    pub category_id: Option<i32>,
    /// zero if never fetched
    pub last_fetched: i64,
    /// set while the last fetch failed
    pub error_message: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = rss_feeds)]
pub struct NewRssFeed<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub category_id: Option<i32>,
    pub last_fetched: i64,
    pub error_message: Option<&'a str>,
    pub created_at: i64,
}

impl<'a> NewRssFeed<'a> {
    pub fn new(url: &'a str, title: &'a str, category_id: Option<i32>) -> Self {
        NewRssFeed {
            url,
            title,
            category_id,
            last_fetched: 0,
            error_message: None,
            created_at: now_ts(),
        }
    }

    pub fn insert(&self, conn: &mut SqliteConnection) -> QueryResult<RssFeed> {
        use crate::schema::rss_feeds::dsl::rss_feeds;
        diesel::insert_into(rss_feeds).values(self).get_result(conn)
    }
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = rss_feeds)]
pub struct PartialRssFeed {
    pub title: Option<String>,
    /// `Some(None)` detaches the feed from its category.
    pub category_id: Option<Option<i32>>,
    pub last_fetched: Option<i64>,
    pub error_message: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Queryable, Identifiable, Associations, Selectable, PartialEq)]
#[diesel(belongs_to(RssFeed, foreign_key = feed_id))]
#[diesel(table_name = rss_articles)]
pub struct RssArticle {
    pub id: i32,
    pub feed_id: i32,
    pub guid: String,
    pub title: String,
    pub link: String,
    pub author: Option<String>,
    pub published_at: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = rss_articles)]
pub struct NewRssArticle<'a> {
    pub feed_id: i32,
    pub guid: &'a str,
    pub title: &'a str,
    pub link: &'a str,
    pub author: Option<&'a str>,
    pub published_at: Option<i64>,
    pub created_at: i64,
}

impl<'a> NewRssArticle<'a> {
    pub fn from_parsed(feed_id: i32, parsed: &'a ParsedArticle) -> Self {
        NewRssArticle {
            feed_id,
            guid: &parsed.guid,
            title: &parsed.title,
            link: &parsed.link,
            author: parsed.author.as_deref(),
            published_at: parsed.published_timestamp(),
            created_at: now_ts(),
        }
    }
}

/// An article as the RSS widget shows it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ArticleView {
    pub id: i32,
    pub feed_id: i32,
    pub feed_title: String,
    pub category_id: Option<i32>,
    pub title: String,
    pub link: String,
    pub author: Option<String>,
    pub published_at: Option<i64>,
}

impl RssCategory {
    pub fn create(conn: &mut SqliteConnection, name: &str) -> QueryResult<RssCategory> {
        use crate::schema::rss_categories::dsl::{position, rss_categories};
        let last: Option<i32> = rss_categories.select(max(position)).first(conn)?;
        diesel::insert_into(rss_categories)
            .values(&NewRssCategory {
                name,
                position: last.map(|p| p + 1).unwrap_or(0),
            })
            .get_result(conn)
    }

    pub fn get_all(conn: &mut SqliteConnection) -> QueryResult<Vec<RssCategory>> {
        use crate::schema::rss_categories::dsl::{id, position, rss_categories};
        rss_categories.order((position.asc(), id.asc())).load(conn)
    }

    pub fn exists(conn: &mut SqliteConnection, category_id: i32) -> QueryResult<bool> {
        use crate::schema::rss_categories::dsl::rss_categories;
        rss_categories
            .find(category_id)
            .first::<RssCategory>(conn)
            .optional()
            .map(|found| found.is_some())
    }

    /// Deletes the category; its feeds stay, without a category.
    pub fn delete(conn: &mut SqliteConnection, category_id: i32) -> QueryResult<bool> {
        conn.transaction(|conn| {
            diesel::update(rss_feeds::table.filter(rss_feeds::category_id.eq(category_id)))
                .set(rss_feeds::category_id.eq(None::<i32>))
                .execute(conn)?;
            diesel::delete(rss_categories::table.find(category_id))
                .execute(conn)
                .map(|deleted| deleted > 0)
        })
    }
}

impl RssFeed {
    pub fn get_all(conn: &mut SqliteConnection) -> QueryResult<Vec<RssFeed>> {
        use crate::schema::rss_feeds::dsl::{id, rss_feeds};
        rss_feeds.order(id.asc()).load(conn)
    }

    pub fn get_by_id(conn: &mut SqliteConnection, feed_id: i32) -> QueryResult<RssFeed> {
        use crate::schema::rss_feeds::dsl::rss_feeds;
        rss_feeds.find(feed_id).first(conn)
    }

    pub fn get_by_url(conn: &mut SqliteConnection, feed_url: &str) -> QueryResult<Option<RssFeed>> {
        use crate::schema::rss_feeds::dsl::{rss_feeds, url};
        rss_feeds.filter(url.eq(feed_url)).first(conn).optional()
    }

    pub fn update(
        conn: &mut SqliteConnection,
        feed_id: i32,
        update: &PartialRssFeed,
    ) -> QueryResult<RssFeed> {
        use crate::schema::rss_feeds::dsl::rss_feeds;
        diesel::update(rss_feeds.find(feed_id))
            .set(update)
            .get_result(conn)
    }

    pub fn record_fetch(
        conn: &mut SqliteConnection,
        feed_id: i32,
        error: Option<String>,
    ) -> QueryResult<RssFeed> {
        let update = PartialRssFeed {
            last_fetched: Some(now_ts()),
            error_message: Some(error),
            ..Default::default()
        };
        Self::update(conn, feed_id, &update)
    }

    /// Deletes the feed and prunes its articles.
    pub fn delete(conn: &mut SqliteConnection, feed_id: i32) -> QueryResult<bool> {
        conn.transaction(|conn| {
            diesel::delete(rss_articles::table.filter(rss_articles::feed_id.eq(feed_id)))
                .execute(conn)?;
            diesel::delete(rss_feeds::table.find(feed_id))
                .execute(conn)
                .map(|deleted| deleted > 0)
        })
    }
}

impl RssArticle {
    /// Stores the usable articles of one feed, skipping `(feed_id, guid)`
    /// pairs that already exist. Returns how many were new.
    pub fn insert_new(
        conn: &mut SqliteConnection,
        feed_id: i32,
        parsed: &[ParsedArticle],
    ) -> QueryResult<usize> {
        use crate::schema::rss_articles::dsl::rss_articles;
        conn.transaction(|conn| {
            let mut added = 0;
            for article in parsed.iter().filter(|a| a.is_usable()) {
                added += diesel::insert_or_ignore_into(rss_articles)
                    .values(&NewRssArticle::from_parsed(feed_id, article))
                    .execute(conn)?;
            }
            Ok(added)
        })
    }

    pub fn get_by_feed(conn: &mut SqliteConnection, feed_id: i32) -> QueryResult<Vec<RssArticle>> {
        use crate::schema::rss_articles::dsl::{feed_id as fid, id, rss_articles};
        rss_articles.filter(fid.eq(feed_id)).order(id.asc()).load(conn)
    }

    /// Newest articles across all feeds; undated articles sort last.
    pub fn recent(conn: &mut SqliteConnection, limit: i64) -> QueryResult<Vec<ArticleView>> {
        let rows = rss_articles::table
            .inner_join(rss_feeds::table)
            .select((
                RssArticle::as_select(),
                rss_feeds::title,
                rss_feeds::category_id,
            ))
            .order((rss_articles::published_at.desc(), rss_articles::id.desc()))
            .limit(limit)
            .load::<(RssArticle, String, Option<i32>)>(conn)?;

        Ok(rows
            .into_iter()
            .map(|(article, feed_title, category_id)| ArticleView {
                id: article.id,
                feed_id: article.feed_id,
                feed_title,
                category_id,
                title: article.title,
                link: article.link,
                author: article.author,
                published_at: article.published_at,
            })
            .collect())
    }
}
