use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::*;

fn article_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        source: row.get(3)?,
        section: row.get(4)?,
        image_url: row.get(5)?,
        scraped_at: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const ARTICLE_COLUMNS: &str =
    "id, title, url, source, section, image_url, scraped_at, created_at";

impl DashboardDb {
    // =========================================================================
    // Ingest
    // =========================================================================

    /// Store freshly scraped news items for one source.
    ///
    /// URLs already marked read are skipped (the reader dismissed them once;
    /// they must not come back), as are URLs already stored. Afterwards the
    /// per-source retention cap is enforced by deleting the oldest rows.
    pub fn ingest_articles(
        &self,
        source: &str,
        items: &[ScrapedArticle],
        max_per_source: usize,
    ) -> Result<usize, DbError> {
        let now = Utc::now().to_rfc3339();
        let mut added = 0usize;
        for item in items {
            if self.is_url_read(&item.url)? || self.article_url_exists(&item.url)? {
                continue;
            }
            self.conn.execute(
                "INSERT INTO articles (title, url, source, section, image_url, scraped_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![item.title, item.url, source, item.section, item.image_url, now],
            )?;
            added += 1;
        }
        log::info!("Added {} new articles for {}", added, source);
        self.prune_source(source, max_per_source)?;
        Ok(added)
    }

    /// Replace a bestseller source wholesale. Charts rotate weekly or
    /// monthly, so the stored set always mirrors the latest scrape; the
    /// chart rank is stored in `section`.
    pub fn replace_source_articles(
        &self,
        source: &str,
        items: &[ScrapedArticle],
    ) -> Result<usize, DbError> {
        let count = self.with_transaction(|tx| {
            tx.conn
                .execute("DELETE FROM articles WHERE source = ?1", params![source])?;
            let now = Utc::now().to_rfc3339();
            for item in items {
                let section = match item.rank {
                    Some(rank) => rank.to_string(),
                    None => item.section.clone(),
                };
                tx.conn.execute(
                    "INSERT INTO articles (title, url, source, section, image_url, scraped_at, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![item.title, item.url, source, section, item.image_url, now],
                )?;
            }
            Ok(items.len())
        })?;
        log::info!("Replaced {} list with {} items", source, count);
        Ok(count)
    }

    fn prune_source(&self, source: &str, max_per_source: usize) -> Result<usize, DbError> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE source = ?1",
            params![source],
            |row| row.get(0),
        )?;
        let excess = total - max_per_source as i64;
        if excess <= 0 {
            return Ok(0);
        }
        let removed = self.conn.execute(
            "DELETE FROM articles WHERE id IN (
                SELECT id FROM articles WHERE source = ?1
                ORDER BY scraped_at ASC, id ASC
                LIMIT ?2
             )",
            params![source, excess],
        )?;
        log::info!(
            "Removed {} old {} articles (limit: {})",
            removed,
            source,
            max_per_source
        );
        Ok(removed)
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Unread articles for a news source, newest scrape first.
    pub fn get_articles(&self, source: &str) -> Result<Vec<Article>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE source = ?1
             ORDER BY scraped_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![source], article_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Bestseller chart for a source in rank order. `section` is text, so
    /// the rank must be compared numerically or #10 would sort before #2.
    pub fn get_bestsellers(&self, source: &str) -> Result<Vec<Article>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE source = ?1
             ORDER BY CAST(section AS INTEGER) ASC"
        ))?;
        let rows = stmt.query_map(params![source], article_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Unread row count for one source.
    pub fn unread_count(&self, source: &str) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE source = ?1",
            params![source],
            |row| row.get(0),
        )?)
    }

    /// Unread row counts for every source with at least one row.
    pub fn unread_counts(&self) -> Result<Vec<(String, i64)>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT source, COUNT(*) FROM articles GROUP BY source ORDER BY source",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // =========================================================================
    // Read marking
    // =========================================================================

    /// Mark one article read: record its URL in the read-history, then drop
    /// the row. Returns false when no such article exists.
    pub fn mark_article_read(&self, article_id: i64) -> Result<bool, DbError> {
        let url: Option<String> = self
            .conn
            .query_row(
                "SELECT url FROM articles WHERE id = ?1",
                params![article_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(url) = url else {
            return Ok(false);
        };
        self.record_read_url(&url)?;
        self.conn
            .execute("DELETE FROM articles WHERE id = ?1", params![article_id])?;
        Ok(true)
    }

    /// Mark every stored article of a source read. Returns the number of
    /// rows cleared.
    pub fn mark_source_read(&self, source: &str) -> Result<usize, DbError> {
        self.with_transaction(|tx| {
            let urls: Vec<String> = {
                let mut stmt = tx
                    .conn
                    .prepare("SELECT url FROM articles WHERE source = ?1")?;
                let rows = stmt.query_map(params![source], |row| row.get(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            for url in &urls {
                tx.record_read_url(url)?;
            }
            tx.conn
                .execute("DELETE FROM articles WHERE source = ?1", params![source])?;
            Ok(urls.len())
        })
    }

    /// Remove read-history entries whose URL contains the given keyword.
    /// Used to let a pruned site be re-imported from scratch.
    pub fn clear_read_history(&self, keyword: &str) -> Result<usize, DbError> {
        Ok(self.conn.execute(
            "DELETE FROM read_articles WHERE url LIKE '%' || ?1 || '%'",
            params![keyword],
        )?)
    }

    pub fn is_url_read(&self, url: &str) -> Result<bool, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM read_articles WHERE url = ?1")?;
        Ok(stmt.exists(params![url])?)
    }

    fn article_url_exists(&self, url: &str) -> Result<bool, DbError> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM articles WHERE url = ?1")?;
        Ok(stmt.exists(params![url])?)
    }

    fn record_read_url(&self, url: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO read_articles (url, read_at) VALUES (?1, ?2)",
            params![url, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
