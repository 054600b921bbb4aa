//! Book recommendations driven by the intelligence provider.
//!
//! The prompt lists the reader's shelf history (rated books first, highest
//! rating on top) and asks for a bare JSON array back. Parsing here is
//! strict: the model was told exactly what shape to produce, so anything
//! that does not decode as an array is an error for the caller to surface,
//! not something to quietly skip.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::Book;
use crate::intelligence::{ChatMessage, IntelligenceProvider, ProviderError};

pub const DEFAULT_RECOMMENDATION_COUNT: usize = 10;

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("recommendation response was not a JSON array: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One recommended book as the model returns it. Missing fields decode as
/// empty strings rather than failing the whole array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub category: String,
}

/// Build the taste-profile prompt from the library. Only `read`-shelf books
/// appear; rated ones sort highest-first ahead of the unrated.
pub fn build_library_prompt(books: &[Book], count: usize) -> String {
    let mut rated: Vec<&Book> = books
        .iter()
        .filter(|b| b.my_rating > 0 && b.shelf == "read")
        .collect();
    rated.sort_by(|a, b| b.my_rating.cmp(&a.my_rating));
    let unrated: Vec<&Book> = books
        .iter()
        .filter(|b| b.my_rating == 0 && b.shelf == "read")
        .collect();

    let mut lines: Vec<String> = Vec::new();
    lines.push("Here is a reader's book library:\n".to_string());
    if !rated.is_empty() {
        lines.push("## Rated books (highest first):".to_string());
        for book in &rated {
            lines.push(format!(
                "- \"{}\" by {} ({}/5)",
                book.title, book.author, book.my_rating
            ));
        }
    }
    if !unrated.is_empty() {
        lines.push("\n## Read but unrated:".to_string());
        for book in &unrated {
            lines.push(format!("- \"{}\" by {} (read, unrated)", book.title, book.author));
        }
    }
    lines.push(format!(
        "\nBased on this reader's taste, recommend exactly {count} books they would love. \
         Do NOT recommend any book already in their library. \
         Provide diverse recommendations across different categories.\n\
         Respond with ONLY a JSON array, no markdown fences, no extra text:\n\
         [{{\"title\": \"...\", \"author\": \"...\", \"reason\": \"...\", \"category\": \"...\"}}]"
    ));
    lines.join("\n")
}

/// Decode the model response, drop titles already in the library
/// (case-insensitive, any shelf), and cap the list at `count`.
pub fn parse_recommendations(
    response: &str,
    books: &[Book],
    count: usize,
) -> Result<Vec<Recommendation>, serde_json::Error> {
    let stripped = strip_fences(response.trim());
    let decoded: Vec<Recommendation> = serde_json::from_str(stripped)?;
    let owned_titles: HashSet<String> = books.iter().map(|b| b.title.to_lowercase()).collect();
    Ok(decoded
        .into_iter()
        .filter(|rec| !owned_titles.contains(&rec.title.to_lowercase()))
        .take(count)
        .collect())
}

/// One round trip: prompt, complete, strict parse.
pub async fn generate_recommendations(
    provider: &dyn IntelligenceProvider,
    books: &[Book],
    count: usize,
) -> Result<Vec<Recommendation>, RecommendError> {
    let prompt = build_library_prompt(books, count);
    let response = provider
        .complete("", &[ChatMessage::user(prompt)])
        .await?;
    Ok(parse_recommendations(&response, books, count)?)
}

fn strip_fences(text: &str) -> &str {
    static OPEN: OnceLock<Regex> = OnceLock::new();
    static CLOSE: OnceLock<Regex> = OnceLock::new();
    let open = OPEN.get_or_init(|| {
        Regex::new(r"^```(?:json)?\s*").expect("fence-open regex should compile")
    });
    let close =
        CLOSE.get_or_init(|| Regex::new(r"\s*```$").expect("fence-close regex should compile"));

    let mut out = text;
    if let Some(m) = open.find(out) {
        out = &out[m.end()..];
    }
    if let Some(m) = close.find(out) {
        out = &out[..m.start()];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::ScriptedProvider;

    fn book(title: &str, author: &str, rating: i64, shelf: &str) -> Book {
        Book {
            title: title.to_string(),
            author: author.to_string(),
            my_rating: rating,
            shelf: shelf.to_string(),
            ..Default::default()
        }
    }

    fn library() -> Vec<Book> {
        vec![
            book("Snow Crash", "Neal Stephenson", 3, "read"),
            book("Dune", "Frank Herbert", 5, "read"),
            book("Piranesi", "Susanna Clarke", 0, "read"),
            book("The Hobbit", "J.R.R. Tolkien", 4, "to-read"),
        ]
    }

    #[test]
    fn test_prompt_orders_rated_desc_then_unrated() {
        let prompt = build_library_prompt(&library(), 10);
        let dune = prompt.find("\"Dune\" by Frank Herbert (5/5)").unwrap();
        let snow = prompt.find("\"Snow Crash\" by Neal Stephenson (3/5)").unwrap();
        let piranesi = prompt
            .find("\"Piranesi\" by Susanna Clarke (read, unrated)")
            .unwrap();
        assert!(dune < snow && snow < piranesi);
        // Not on the read shelf, so not part of the taste profile.
        assert!(!prompt.contains("The Hobbit"));
        assert!(prompt.contains("recommend exactly 10 books"));
        assert!(prompt.contains("ONLY a JSON array"));
    }

    #[test]
    fn test_parse_plain_array() {
        let response = r#"[{"title": "Hyperion", "author": "Dan Simmons", "reason": "Epic scope", "category": "SF"}]"#;
        let recs = parse_recommendations(response, &library(), 10).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Hyperion");
        assert_eq!(recs[0].category, "SF");
    }

    #[test]
    fn test_parse_strips_code_fences() {
        let response = "```json\n[{\"title\": \"Hyperion\", \"author\": \"Dan Simmons\"}]\n```";
        let recs = parse_recommendations(response, &library(), 10).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].reason, "");
    }

    #[test]
    fn test_owned_titles_filtered_case_insensitively() {
        let response = r#"[
            {"title": "DUNE", "author": "Frank Herbert"},
            {"title": "The Hobbit", "author": "J.R.R. Tolkien"},
            {"title": "Hyperion", "author": "Dan Simmons"}
        ]"#;
        let recs = parse_recommendations(response, &library(), 10).unwrap();
        // Dune is owned; The Hobbit is owned even though unread.
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Hyperion");
    }

    #[test]
    fn test_result_truncated_to_count() {
        let response = r#"[
            {"title": "A"}, {"title": "B"}, {"title": "C"}, {"title": "D"}
        ]"#;
        let recs = parse_recommendations(response, &[], 2).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].title, "B");
    }

    #[test]
    fn test_prose_response_is_an_error() {
        assert!(parse_recommendations("추천해 드릴게요!", &[], 10).is_err());
    }

    #[tokio::test]
    async fn test_generate_round_trip() {
        let provider = ScriptedProvider::with_responses([
            "```json\n[{\"title\": \"Hyperion\", \"author\": \"Dan Simmons\", \"reason\": \"r\", \"category\": \"SF\"}]\n```",
        ]);
        let recs = generate_recommendations(&provider, &library(), 5)
            .await
            .unwrap();
        assert_eq!(recs.len(), 1);
        let (_, messages) = provider.requests().remove(0);
        assert!(messages[0].content.contains("recommend exactly 5 books"));
    }
}
