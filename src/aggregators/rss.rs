use std::future::Future;
use std::time::Instant;

use futures_util::future::join_all;
use reqwest::Client;

use super::BATCH_SIZE;
use crate::feeds::{self, ParsedArticle};
use crate::models::rss::{ArticleView, RssArticle, RssFeed};
use crate::sources::SourceError;
use crate::DbPool;

/// Articles kept in the RSS cache.
pub const ARTICLE_LIMIT: i64 = 200;

pub async fn load_articles(pool: DbPool, client: Client) -> Result<Vec<ArticleView>, SourceError> {
    let client = &client;
    refresh_feeds(&pool, |url| async move { feeds::fetch_articles(client, &url).await }).await
}

/// Fetches every subscribed feed in batches, stores new articles and each
/// feed's fetch outcome, then reads back the newest articles. A failing feed
/// only marks that feed.
pub async fn refresh_feeds<F, Fut>(pool: &DbPool, fetch: F) -> Result<Vec<ArticleView>, SourceError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<ParsedArticle>, SourceError>>,
{
    let started = Instant::now();
    let subscribed = {
        let mut conn = pool.get()?;
        RssFeed::get_all(&mut conn)?
    };

    let mut added = 0;
    let mut failed = 0;
    for batch in subscribed.chunks(BATCH_SIZE) {
        let results = join_all(batch.iter().map(|feed| fetch(feed.url.clone()))).await;

        let mut conn = pool.get()?;
        for (feed, result) in batch.iter().zip(results) {
            let error = match result {
                Ok(articles) => match RssArticle::insert_new(&mut conn, feed.id, &articles) {
                    Ok(count) => {
                        added += count;
                        None
                    }
                    Err(e) => {
                        log::error!("Failed to store articles for feed {}: {e}", feed.url);
                        Some(format!("storage error: {e}"))
                    }
                },
                Err(e) => {
                    tracing::warn!(feed = %feed.url, error = %e, "Feed fetch failed");
                    failed += 1;
                    Some(e.to_string())
                }
            };
            if let Err(e) = RssFeed::record_fetch(&mut conn, feed.id, error) {
                log::error!("Failed to record fetch for feed {}: {e}", feed.url);
            }
        }
    }

    let mut conn = pool.get()?;
    let articles = RssArticle::recent(&mut conn, ARTICLE_LIMIT)?;

    tracing::info!(
        feeds = subscribed.len(),
        failed,
        added,
        articles = articles.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "RSS feeds refreshed"
    );
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rss::NewRssFeed;
    use crate::test_helpers::create_test_db;

    fn article(guid: &str, title: &str, published: &str) -> ParsedArticle {
        ParsedArticle {
            guid: guid.to_string(),
            title: title.to_string(),
            link: format!("https://example.com/{guid}"),
            published_at: Some(published.to_string()),
            author: None,
        }
    }

    #[actix_rt::test]
    async fn test_failing_feed_is_marked_and_others_are_stored() {
        let (_dir, pool) = create_test_db();
        {
            let mut conn = pool.get().unwrap();
            NewRssFeed::new("https://good.example/feed", "Good", None)
                .insert(&mut conn)
                .unwrap();
            NewRssFeed::new("https://bad.example/feed", "Bad", None)
                .insert(&mut conn)
                .unwrap();
        }

        let fetch = |url: String| async move {
            if url.contains("good") {
                Ok(vec![
                    article("a", "Older", "Mon, 01 Jan 2024 00:00:00 GMT"),
                    article("b", "Newer", "Tue, 02 Jan 2024 00:00:00 GMT"),
                    article("", "No guid", "Tue, 02 Jan 2024 00:00:00 GMT"),
                ])
            } else {
                Err(SourceError::Timeout)
            }
        };

        let articles = refresh_feeds(&pool, fetch).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Newer");
        assert_eq!(articles[0].feed_title, "Good");

        let mut conn = pool.get().unwrap();
        let feeds = RssFeed::get_all(&mut conn).unwrap();
        assert_eq!(feeds[0].error_message, None);
        assert!(feeds[0].last_fetched > 0);
        assert_eq!(feeds[1].error_message.as_deref(), Some("request timed out"));
    }

    #[actix_rt::test]
    async fn test_refetch_does_not_duplicate_articles() {
        let (_dir, pool) = create_test_db();
        {
            let mut conn = pool.get().unwrap();
            NewRssFeed::new("https://good.example/feed", "Good", None)
                .insert(&mut conn)
                .unwrap();
        }
        let fetch = |_url: String| async move {
            Ok::<_, SourceError>(vec![article("a", "Only", "Mon, 01 Jan 2024 00:00:00 GMT")])
        };

        refresh_feeds(&pool, fetch).await.unwrap();
        let articles = refresh_feeds(&pool, fetch).await.unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[actix_rt::test]
    async fn test_no_feeds_is_empty() {
        let (_dir, pool) = create_test_db();
        let fetch = |_url: String| async move { Ok::<_, SourceError>(Vec::new()) };
        assert!(refresh_feeds(&pool, fetch).await.unwrap().is_empty());
    }
}
