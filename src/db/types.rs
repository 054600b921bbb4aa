//! Row types and the error enum shared across the database layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("no home directory to place the database in")]
    HomeDirNotFound,

    #[error("could not create the database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("migration: {0}")]
    Migration(String),
}

/// A row from the `articles` table. For bestseller sources `section` carries
/// the chart rank as text; for news sources it is the paper section name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub source: String,
    pub section: String,
    pub image_url: String,
    pub scraped_at: String,
    pub created_at: String,
}

/// One scraped item heading into [`articles`](crate::db::DashboardDb)
/// storage. The scraping itself happens outside this crate; ingest only
/// applies the retention policy. Chart items carry `rank`, news items a
/// `section` name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedArticle {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
}

/// A row from the `books` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub my_rating: i64,
    pub shelf: String,
    pub date_read: String,
    pub goodreads_id: String,
}

/// A row from the `recommendations` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecommendation {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub reason: String,
    pub category: String,
}

/// Aggregate numbers for the books dashboard. `avg_rating` is already
/// rounded to one decimal; rated books on any shelf count toward it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_read: i64,
    pub rated_count: i64,
    pub avg_rating: f64,
}
