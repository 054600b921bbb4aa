//! Business-logic layer between the stores and whatever surface calls them.
//!
//! Each service owns the policy for one area: validation, ranking, read
//! marking, rating rules. Storage details stay in [`crate::db`] and
//! [`crate::directory`]; services decide what a request is allowed to do.

pub mod articles;
pub mod books;
pub mod contacts;
pub mod entities;
