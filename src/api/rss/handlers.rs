use actix_web::{delete, get, patch, post, web, HttpResponse};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use super::types::{CategoryCreate, FeedCreate, FeedUpdate};
use crate::{
    api::{LimitQuery, RqId, RqState},
    errors::{AppError, AppResult},
    feeds::{discover_title, parse_feed},
    models::rss::{NewRssFeed, PartialRssFeed, RssArticle, RssCategory, RssFeed},
    security::validation::{self, MAX_TEXT_LENGTH},
    session::SessionClaims,
    sources::http,
    RqDbPool,
};

const MAX_CATEGORY_LENGTH: usize = 100;

#[get("")]
pub async fn get_articles(
    state: RqState,
    query: web::Query<LimitQuery>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let articles = state.rss.get_limited(query.limit).await?;
    Ok(HttpResponse::Ok().json(articles))
}

#[post("/refresh")]
pub async fn refresh_articles(
    state: RqState,
    query: web::Query<LimitQuery>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let articles = state.rss.refresh().await?;
    let limit = query.limit.unwrap_or(articles.len());
    let articles: Vec<_> = articles.iter().take(limit).cloned().collect();
    Ok(HttpResponse::Ok().json(articles))
}

#[get("/feeds")]
pub async fn get_feeds(pool: RqDbPool, _claims: SessionClaims) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    let feeds = RssFeed::get_all(&mut conn)?;
    Ok(HttpResponse::Ok().json(feeds))
}

#[post("/feeds")]
pub async fn create_feed(
    pool: RqDbPool,
    state: RqState,
    feed_req: web::Json<FeedCreate>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let url = feed_req.url.trim();
    validation::validate_url(url).map_err(|e| AppError::invalid_input("url", &e))?;
    if let Some(title) = &feed_req.title {
        validation::validate_text(title, MAX_TEXT_LENGTH)
            .map_err(|e| AppError::invalid_input("title", &e))?;
    }

    {
        let mut conn = pool.get()?;
        if RssFeed::get_by_url(&mut conn, url)?.is_some() {
            return Err(AppError::duplicate_resource("Feed"));
        }
        if let Some(category_id) = feed_req.category_id {
            if !RssCategory::exists(&mut conn, category_id)? {
                return Err(AppError::resource_not_found("Category"));
            }
        }
    }

    let body = http::fetch_text(&state.client, url).await.map_err(|e| {
        tracing::warn!(url = %url, error = %e, "New feed could not be fetched");
        AppError::FeedUnreachable
    })?;

    let articles = parse_feed(&body);
    let discovered = discover_title(&body);
    if articles.is_empty() && discovered.is_none() {
        tracing::warn!(url = %url, "New feed is not RSS or Atom");
        return Err(AppError::FeedParseError);
    }

    let title = feed_req
        .title
        .as_deref()
        .map(str::trim)
        .map(str::to_string)
        .or(discovered)
        .unwrap_or_else(|| url.to_string());

    let mut conn = pool.get()?;
    let feed = NewRssFeed::new(url, &title, feed_req.category_id).insert(&mut conn)?;
    let added = RssArticle::insert_new(&mut conn, feed.id, &articles)?;
    let feed = RssFeed::record_fetch(&mut conn, feed.id, None)?;

    state.rss.revalidate();
    tracing::info!(feed_id = feed.id, url = %feed.url, articles = added, "Feed added");

    Ok(HttpResponse::Created().json(feed))
}

#[patch("/feeds/{id}")]
pub async fn update_feed(
    pool: RqDbPool,
    state: RqState,
    path: RqId,
    update_req: web::Json<FeedUpdate>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let update_req = update_req.into_inner();
    if update_req.title.is_none() && update_req.category_id.is_none() {
        return Err(AppError::invalid_input("body", "Nothing to update"));
    }
    if let Some(title) = &update_req.title {
        validation::validate_text(title, MAX_TEXT_LENGTH)
            .map_err(|e| AppError::invalid_input("title", &e))?;
    }

    let mut conn = pool.get()?;
    RssFeed::get_by_id(&mut conn, path.id).map_err(|_| AppError::resource_not_found("Feed"))?;
    if let Some(Some(category_id)) = update_req.category_id {
        if !RssCategory::exists(&mut conn, category_id)? {
            return Err(AppError::resource_not_found("Category"));
        }
    }

    let update = PartialRssFeed {
        title: update_req.title.map(|title| title.trim().to_string()),
        category_id: update_req.category_id,
        ..Default::default()
    };
    let feed = RssFeed::update(&mut conn, path.id, &update)?;
    state.rss.revalidate();

    Ok(HttpResponse::Ok().json(feed))
}

#[delete("/feeds/{id}")]
pub async fn delete_feed(
    pool: RqDbPool,
    state: RqState,
    path: RqId,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    if !RssFeed::delete(&mut conn, path.id)? {
        return Err(AppError::resource_not_found("Feed"));
    }
    state.rss.revalidate();
    tracing::info!(feed_id = path.id, "Feed deleted");

    Ok(HttpResponse::NoContent().finish())
}

#[get("/categories")]
pub async fn get_categories(pool: RqDbPool, _claims: SessionClaims) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    let categories = RssCategory::get_all(&mut conn)?;
    Ok(HttpResponse::Ok().json(categories))
}

#[post("/categories")]
pub async fn create_category(
    pool: RqDbPool,
    category_req: web::Json<CategoryCreate>,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let name = category_req.name.trim();
    validation::validate_text(name, MAX_CATEGORY_LENGTH)
        .map_err(|e| AppError::invalid_input("name", &e))?;

    let mut conn = pool.get()?;
    let category = RssCategory::create(&mut conn, name).map_err(|e| match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            AppError::duplicate_resource("Category")
        }
        other => AppError::from(other),
    })?;

    Ok(HttpResponse::Created().json(category))
}

#[delete("/categories/{id}")]
pub async fn delete_category(
    pool: RqDbPool,
    state: RqState,
    path: RqId,
    _claims: SessionClaims,
) -> AppResult<HttpResponse> {
    let mut conn = pool.get()?;
    if !RssCategory::delete(&mut conn, path.id)? {
        return Err(AppError::resource_not_found("Category"));
    }
    state.rss.revalidate();

    Ok(HttpResponse::NoContent().finish())
}
