// Book library upkeep and the stored recommendation refresh.

use thiserror::Error;

use crate::db::{Book, DashboardDb, DbError, LibraryStats, StoredRecommendation};
use crate::intelligence::IntelligenceProvider;
use crate::recommender::{self, RecommendError};

#[derive(Debug, Error)]
pub enum BooksError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Recommend(#[from] RecommendError),

    #[error("제목과 저자를 모두 입력해 주세요.")]
    MissingTitleOrAuthor,

    #[error("이미 등록된 책입니다.")]
    DuplicateBook,

    #[error("Rating must be 0-5")]
    RatingOutOfRange,

    #[error("책이 없습니다. 먼저 라이브러리에 책을 추가해 주세요.")]
    EmptyLibrary,

    #[error("no book with id {0}")]
    NotFound(i64),
}

/// Add a book by hand. Title and author are both required; the pair must
/// not already be on any shelf.
pub fn add_book(
    db: &DashboardDb,
    title: &str,
    author: &str,
    shelf: Option<&str>,
) -> Result<Book, BooksError> {
    let title = title.trim();
    let author = author.trim();
    if title.is_empty() || author.is_empty() {
        return Err(BooksError::MissingTitleOrAuthor);
    }
    let shelf = shelf.unwrap_or("read");
    db.add_book(title, author, shelf)?
        .ok_or(BooksError::DuplicateBook)
}

/// Finished books, most recently read first.
pub fn library(db: &DashboardDb) -> Result<Vec<Book>, DbError> {
    db.read_shelf()
}

pub fn stats(db: &DashboardDb) -> Result<LibraryStats, DbError> {
    db.library_stats()
}

/// Set a star rating. Zero clears the rating.
pub fn rate_book(db: &DashboardDb, book_id: i64, rating: i64) -> Result<(), BooksError> {
    if !(0..=5).contains(&rating) {
        return Err(BooksError::RatingOutOfRange);
    }
    if !db.set_rating(book_id, rating)? {
        return Err(BooksError::NotFound(book_id));
    }
    Ok(())
}

pub fn delete_book(db: &DashboardDb, book_id: i64) -> Result<(), BooksError> {
    if !db.delete_book(book_id)? {
        return Err(BooksError::NotFound(book_id));
    }
    log::info!("Deleted book {book_id}");
    Ok(())
}

/// The stored recommendation list from the last refresh.
pub fn recommendations(db: &DashboardDb) -> Result<Vec<StoredRecommendation>, DbError> {
    db.get_recommendations()
}

/// Regenerate recommendations from the whole library and replace the stored
/// list. The old list survives any provider or parse failure; it is only
/// dropped once a new one has arrived.
pub async fn refresh_recommendations(
    db: &DashboardDb,
    provider: &dyn IntelligenceProvider,
    count: usize,
) -> Result<Vec<StoredRecommendation>, BooksError> {
    let books = db.get_books()?;
    if books.is_empty() {
        return Err(BooksError::EmptyLibrary);
    }
    let recs = recommender::generate_recommendations(provider, &books, count).await?;
    db.replace_recommendations(&recs)?;
    Ok(db.get_recommendations()?)
}
