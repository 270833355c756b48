//! Error types for treadmill-github.

use thiserror::Error;

/// Everything that can go wrong between sending the search and having a
/// single PR number in hand. Each ambiguity class is its own variant.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The API answered with a non-200 status.
    #[error("GitHub API returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never got an HTTP answer (DNS, TLS, connection reset).
    #[error("GitHub API request failed: {0}")]
    Transport(String),

    /// The body was not JSON at all.
    #[error("GitHub API response is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is missing from the response body.
    #[error("GitHub API response is missing '{path}'")]
    Malformed { path: String },

    /// The search returned no results whatsoever.
    #[error("no pull requests matched the treadmill search")]
    NoCandidate,

    /// Results came back but none carries the treadmill title.
    #[error("no pull request titled '{title}' (saw: {seen})")]
    TitleMismatch { title: String, seen: String },

    /// The title matched but none of those PRs is open.
    #[error("pull request(s) titled '{title}' exist but none is open: {numbers:?}")]
    NotOpen { title: String, numbers: Vec<u64> },

    /// More than one open PR carries the treadmill title.
    #[error("multiple open pull requests titled '{title}': {numbers:?}")]
    Ambiguous { title: String, numbers: Vec<u64> },
}
