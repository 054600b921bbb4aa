// Article ingest and read marking, plus the newsletter backlog sweep.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::db::{Article, DashboardDb, DbError, ScrapedArticle};

/// Sources the dashboard accepts scraped items for. Anything else is a
/// scraper misconfiguration and must be rejected before it reaches the db.
pub const SCRAPE_SOURCES: [&str; 6] = [
    "mk",
    "irobot",
    "robotreport",
    "aicompanies",
    "bestseller",
    "bestseller_kr",
];

/// Newsletter sources the backlog sweep drains, oldest sites last. The
/// order fixes how the combined backlog is assembled.
pub const BACKLOG_SOURCES: [&str; 3] = ["the_decoder", "dl_batch", "geek_weekly"];

/// How many backlog articles one sweep marks read.
pub const BACKLOG_CHUNK: usize = 100;

#[derive(Debug, Error)]
pub enum ArticlesError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("unknown source: {0}")]
    UnknownSource(String),
}

/// Bestseller charts are snapshots, not feeds; they replace instead of
/// accumulate.
pub fn is_bestseller_source(source: &str) -> bool {
    source == "bestseller" || source == "bestseller_kr"
}

/// Store one scrape batch under its source's policy: charts replace the
/// stored set wholesale, news feeds append unseen URLs under the retention
/// cap. Returns how many rows were written.
pub fn ingest(
    db: &DashboardDb,
    source: &str,
    items: &[ScrapedArticle],
    max_per_source: usize,
) -> Result<usize, ArticlesError> {
    if !SCRAPE_SOURCES.contains(&source) {
        return Err(ArticlesError::UnknownSource(source.to_string()));
    }
    if is_bestseller_source(source) {
        Ok(db.replace_source_articles(source, items)?)
    } else {
        Ok(db.ingest_articles(source, items, max_per_source)?)
    }
}

/// Unread articles for a news source, newest first.
pub fn articles(db: &DashboardDb, source: &str) -> Result<Vec<Article>, DbError> {
    db.get_articles(source)
}

/// A bestseller chart in rank order.
pub fn bestsellers(db: &DashboardDb, source: &str) -> Result<Vec<Article>, DbError> {
    db.get_bestsellers(source)
}

/// Mark one article read. Returns false when the id does not exist.
pub fn mark_read(db: &DashboardDb, article_id: i64) -> Result<bool, DbError> {
    db.mark_article_read(article_id)
}

/// Dismiss a source's whole unread list at once.
pub fn mark_all_read(db: &DashboardDb, source: &str) -> Result<usize, DbError> {
    let cleared = db.mark_source_read(source)?;
    log::info!("Marked {cleared} {source} articles read");
    Ok(cleared)
}

/// Forget read history matching a URL keyword so a source can be
/// re-imported from scratch.
pub fn clear_read_history(db: &DashboardDb, keyword: &str) -> Result<usize, DbError> {
    let removed = db.clear_read_history(keyword)?;
    log::info!("Cleared {removed} read-history rows matching {keyword:?}");
    Ok(removed)
}

/// Unread counts per source for the dashboard header.
pub fn dashboard_counts(db: &DashboardDb) -> Result<Vec<(String, i64)>, DbError> {
    db.unread_counts()
}

// ---------------------------------------------------------------------------
// Newsletter backlog
// ---------------------------------------------------------------------------

fn re_issue() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/issue-(\d+)/").unwrap())
}

/// Issue number embedded in a newsletter URL, 0 when absent.
fn issue_number(url: &str) -> i64 {
    re_issue()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// The combined newsletter backlog, newest issues first within each source.
///
/// Each source carries its edition order differently: geek_weekly stores a
/// week label in `section`, dl_batch embeds an issue number in the URL, and
/// the_decoder has nothing beyond insertion order. The per-source sorts put
/// the newest editions at the front, so the tail of the combined list is
/// always the oldest unread material.
pub fn backlog_articles(db: &DashboardDb) -> Result<Vec<Article>, DbError> {
    let mut decoder = db.get_articles("the_decoder")?;
    decoder.sort_by(|a, b| b.id.cmp(&a.id));

    let mut batch = db.get_articles("dl_batch")?;
    batch.sort_by(|a, b| {
        issue_number(&b.url)
            .cmp(&issue_number(&a.url))
            .then(a.id.cmp(&b.id))
    });

    let mut geek = db.get_articles("geek_weekly")?;
    geek.sort_by(|a, b| b.section.cmp(&a.section).then(a.id.cmp(&b.id)));

    let mut combined = decoder;
    combined.append(&mut batch);
    combined.append(&mut geek);
    Ok(combined)
}

/// Mark the oldest `count` backlog articles read and drop their rows.
pub fn mark_backlog_read(db: &DashboardDb, count: usize) -> Result<usize, DbError> {
    let backlog = backlog_articles(db)?;
    let start = backlog.len().saturating_sub(count);
    let mut marked = 0usize;
    for article in &backlog[start..] {
        db.mark_article_read(article.id)?;
        marked += 1;
    }
    log::info!("Marked {marked} articles as read");
    Ok(marked)
}
