//! Highlight-export parsers that turn reading notes into flashcard rows.
//!
//! Three formats are recognized:
//!   - Kindle `My Clippings.txt` (`==========` section separators)
//!   - Readwise markdown export (`#` headings + `>` blockquotes)
//!   - 밀리의서재 share text (plain paragraphs, optional `p.N` page marks)
//!
//! PDF extraction happens upstream; by the time text reaches this module it
//! is plain UTF-8.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// One flashcard row. `front` is the prompt side, `back` the highlight
/// itself, `source_ref` a human-readable locator (page, location, chapter).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub deck_name: String,
    pub author: String,
    pub front: String,
    pub back: String,
    pub source_ref: String,
}

// Compile-once regex patterns via OnceLock.
fn re_title_author() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^)]+)\)\s*$").unwrap())
}

fn re_location() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)location\s+([\d-]+)").unwrap())
}

fn re_page_meta() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)page\s+([\d-]+)").unwrap())
}

fn re_heading_hashes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#+\s*").unwrap())
}

fn re_blockquote_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^> .+").unwrap())
}

fn re_paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").unwrap())
}

fn re_page_ref() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)p\.?\s*(\d+)").unwrap())
}

/// Detect the export format and dispatch to the matching parser.
pub fn parse_auto(content: &str) -> Vec<Card> {
    if content.contains("==========") {
        return parse_kindle_clippings(content);
    }
    if re_blockquote_line().is_match(content) {
        return parse_readwise_md(content);
    }
    parse_millie_text(content)
}

/// Parse Kindle `My Clippings.txt`. Only highlight sections become cards;
/// notes and bookmarks are skipped.
pub fn parse_kindle_clippings(content: &str) -> Vec<Card> {
    let mut cards = Vec::new();

    for section in content.split("==========") {
        let section = section.trim();
        if section.is_empty() {
            continue;
        }
        let lines: Vec<&str> = section
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        if lines.len() < 2 {
            continue;
        }

        // Line 0: "Book Title (Author Name)"
        let title_line = lines[0].trim();
        let (deck_name, author) = match re_title_author().captures(title_line) {
            // End-anchored match, so the full match runs to the end of the line.
            Some(caps) => {
                let deck = title_line[..title_line.len() - caps[0].len()].trim();
                (deck.to_string(), caps[1].trim().to_string())
            }
            None => (title_line.to_string(), String::new()),
        };

        // Line 1: metadata with the location or page reference.
        let meta_line = lines[1].trim();
        let meta_lower = meta_line.to_lowercase();
        if !meta_lower.contains("highlight") && !meta_lower.contains("passage") {
            continue;
        }
        let source_ref = if let Some(caps) = re_location().captures(meta_line) {
            format!("Location {}", &caps[1])
        } else if let Some(caps) = re_page_meta().captures(meta_line) {
            format!("p.{}", &caps[1])
        } else {
            String::new()
        };

        let text = lines[2..].join(" ");
        let text = text.trim();
        if text.chars().count() < 5 {
            continue;
        }

        let mut front = format!("\"{deck_name}\"");
        if !source_ref.is_empty() {
            front.push_str(&format!(" | {source_ref}"));
        }

        cards.push(Card {
            deck_name,
            author,
            front,
            back: text.to_string(),
            source_ref,
        });
    }

    cards
}

/// Parse a Readwise markdown export. `#` introduces the book title with an
/// optional `By ` author line directly below; `##`/`###` track the current
/// chapter; each blockquote run becomes one card.
pub fn parse_readwise_md(content: &str) -> Vec<Card> {
    let mut cards = Vec::new();
    let mut deck_name = String::new();
    let mut author = String::new();
    let mut current_chapter = String::new();

    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if let Some(rest) = line.strip_prefix("# ") {
            deck_name = rest.trim().to_string();
            // The author line must sit directly under the title.
            if let Some(next) = lines.get(i + 1) {
                if let Some(by) = next.trim().strip_prefix("By ") {
                    author = by.trim().to_string();
                    i += 1;
                }
            }
        } else if line.starts_with("## ") || line.starts_with("### ") {
            current_chapter = re_heading_hashes().replace(line, "").trim().to_string();
        } else if line.starts_with("> ") {
            let mut highlight = Vec::new();
            while i < lines.len() {
                match lines[i].strip_prefix("> ") {
                    Some(rest) => {
                        highlight.push(rest.trim());
                        i += 1;
                    }
                    None => break,
                }
            }
            // The inner loop already advanced i past the blockquote run.
            let text = highlight.join(" ").trim().to_string();
            if text.chars().count() < 5 {
                continue;
            }

            let mut front_parts = Vec::new();
            if !deck_name.is_empty() {
                front_parts.push(format!("\"{deck_name}\""));
            }
            if !current_chapter.is_empty() {
                front_parts.push(current_chapter.clone());
            }
            let front = if front_parts.is_empty() {
                text.chars().take(60).collect()
            } else {
                front_parts.join(" | ")
            };

            cards.push(Card {
                deck_name: if deck_name.is_empty() {
                    "Unknown".to_string()
                } else {
                    deck_name.clone()
                },
                author: author.clone(),
                front,
                back: text,
                source_ref: current_chapter.clone(),
            });
            continue;
        }

        i += 1;
    }

    cards
}

const EDGE_TRIM: &[char] = &[' ', '\t', '\n', '.', ','];

/// Parse 밀리의서재 share text. The first non-empty line is taken as the
/// book title and each following paragraph becomes a card, with `p.N`
/// markers lifted into the source reference and stripped from the text.
pub fn parse_millie_text(content: &str) -> Vec<Card> {
    let mut cards = Vec::new();

    let deck_name = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("알 수 없는 책")
        .to_string();

    for para in re_paragraph_break().split(content.trim()) {
        let para = para.trim();
        if para.chars().count() < 15 {
            continue;
        }

        let source_ref = match re_page_ref().captures(para) {
            Some(caps) => format!("p.{}", &caps[1]),
            None => String::new(),
        };
        let back = re_page_ref()
            .replace_all(para, "")
            .trim_matches(EDGE_TRIM)
            .to_string();
        if back.chars().count() < 10 {
            continue;
        }

        let mut front = format!("\"{deck_name}\"");
        if !source_ref.is_empty() {
            front.push_str(&format!(" | {source_ref}"));
        }

        cards.push(Card {
            deck_name: deck_name.clone(),
            author: String::new(),
            front,
            back,
            source_ref,
        });
    }

    cards
}
