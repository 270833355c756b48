//! # treadmill-github
//!
//! Locates the one open treadmill pull request through the GitHub GraphQL
//! search API.
//!
//! [`GithubLocator`] issues the request; [`resolve_treadmill_pr`] applies the
//! title/state filters to a parsed response and is usable on its own.

pub mod error;
pub mod query;

pub use error::QueryError;
pub use query::{resolve_treadmill_pr, search_query, GithubLocator, TreadmillLocator};
