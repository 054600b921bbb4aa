//! Book library queries: the reading shelf, ratings, and the stored
//! recommendation list that the recommender refreshes wholesale.

use rusqlite::params;

use super::*;
use crate::recommender::Recommendation;

const BOOK_COLUMNS: &str = "id, title, author, my_rating, shelf, date_read, goodreads_id";

fn book_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        my_rating: row.get(3)?,
        shelf: row.get(4)?,
        date_read: row.get(5)?,
        goodreads_id: row.get(6)?,
    })
}

impl DashboardDb {
    /// Adds a book unless an identical (title, author) pair already exists.
    /// Returns the stored row, or `None` for a duplicate.
    pub fn add_book(
        &self,
        title: &str,
        author: &str,
        shelf: &str,
    ) -> Result<Option<Book>, DbError> {
        let duplicate = {
            let mut stmt = self
                .conn
                .prepare("SELECT 1 FROM books WHERE title = ?1 AND author = ?2 LIMIT 1")?;
            stmt.exists(params![title, author])?
        };
        if duplicate {
            return Ok(None);
        }

        self.conn.execute(
            "INSERT INTO books (title, author, shelf) VALUES (?1, ?2, ?3)",
            params![title, author, shelf],
        )?;
        let id = self.conn.last_insert_rowid();
        log::info!("Added book {:?} by {}", title, author);
        Ok(Some(Book {
            id,
            title: title.to_string(),
            author: author.to_string(),
            shelf: shelf.to_string(),
            ..Book::default()
        }))
    }

    /// Every book on every shelf, oldest first. This is the recommender's
    /// view of the library, so unread shelves are included on purpose.
    pub fn get_books(&self) -> Result<Vec<Book>, DbError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))?;
        let books = stmt
            .query_map([], book_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }

    /// Finished books, most recently read first.
    pub fn read_shelf(&self) -> Result<Vec<Book>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE shelf = 'read'
             ORDER BY date_read DESC, id DESC"
        ))?;
        let books = stmt
            .query_map([], book_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }

    /// Stores a rating for one book. Returns false when the id is unknown.
    /// Range checks happen in the service layer before we get here.
    pub fn set_rating(&self, book_id: i64, rating: i64) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE books SET my_rating = ?2 WHERE id = ?1",
            params![book_id, rating],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_book(&self, book_id: i64) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE id = ?1", params![book_id])?;
        Ok(changed > 0)
    }

    /// Headline numbers for the books dashboard. Ratings count on any
    /// shelf; only the read shelf counts toward the finished total.
    pub fn library_stats(&self) -> Result<LibraryStats, DbError> {
        let total_read: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM books WHERE shelf = 'read'",
            [],
            |row| row.get(0),
        )?;
        let (rated_count, rating_sum): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(my_rating), 0) FROM books WHERE my_rating > 0",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let avg_rating = if rated_count > 0 {
            let avg = rating_sum as f64 / rated_count as f64;
            (avg * 10.0).round() / 10.0
        } else {
            0.0
        };
        Ok(LibraryStats {
            total_read,
            rated_count,
            avg_rating,
        })
    }

    // ------------------------------------------------------------------
    // Stored recommendations
    // ------------------------------------------------------------------

    /// Swaps the stored recommendation list for a fresh one. The list is
    /// only ever replaced as a whole, never edited in place.
    pub fn replace_recommendations(&self, recs: &[Recommendation]) -> Result<usize, DbError> {
        self.with_transaction(|tx| {
            tx.conn.execute("DELETE FROM recommendations", [])?;
            for rec in recs {
                tx.conn.execute(
                    "INSERT INTO recommendations (title, author, reason, category)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![rec.title, rec.author, rec.reason, rec.category],
                )?;
            }
            Ok(recs.len())
        })
    }

    pub fn get_recommendations(&self) -> Result<Vec<StoredRecommendation>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, author, reason, category FROM recommendations ORDER BY id",
        )?;
        let recs = stmt
            .query_map([], |row| {
                Ok(StoredRecommendation {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    author: row.get(2)?,
                    reason: row.get(3)?,
                    category: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(recs)
    }
}
