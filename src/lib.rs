//! Personal growth dashboard core: a scored relationship directory with
//! follow-up escalation, a news/bestseller reader, a book library with
//! model-generated recommendations, e-book highlight parsing, and an agent
//! loop that turns chat into directory actions.
//!
//! Storage is split by ownership: relationship data lives in an external
//! sheet behind [`directory::DirectoryStore`]; articles, books, and
//! recommendations live in a local SQLite file behind [`db::DashboardDb`].
//! [`services`] carries the policy layer on top of both.

pub mod agent;
pub mod cache;
pub mod clippings;
pub mod clock;
pub mod config;
pub mod db;
pub mod directory;
pub mod identity;
pub mod intelligence;
pub mod matching;
pub mod migrations;
pub mod records;
pub mod recommender;
pub mod scoring;
pub mod services;
pub mod tiers;
pub mod validation;
