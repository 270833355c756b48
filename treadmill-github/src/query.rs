//! Treadmill PR lookup.
//!
//! One POST to the GraphQL endpoint, no retries. The response must contain
//! `data.search.edges`; the edges are narrowed to the exact treadmill title,
//! then to `OPEN`, and exactly one PR has to survive.

use serde_json::{json, Value};

use treadmill_core::{PrState, Settings, TreadmillPr};

use crate::error::QueryError;

/// Finds the single open treadmill pull request.
pub trait TreadmillLocator {
    fn find_open_treadmill_pr(&self, title: &str) -> Result<u64, QueryError>;
}

// ---------------------------------------------------------------------------
// GitHub GraphQL client
// ---------------------------------------------------------------------------

/// Blocking GraphQL search against GitHub.
pub struct GithubLocator {
    agent: ureq::Agent,
    endpoint: String,
    query: String,
    token: Option<String>,
    user_agent: String,
}

impl GithubLocator {
    pub fn new(settings: &Settings) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            endpoint: settings.graphql_endpoint.clone(),
            query: search_query(&settings.downstream_repo, &settings.product),
            token: settings.token.clone(),
            user_agent: format!("{}/{}", settings.tool_name, settings.tool_version),
        }
    }

    fn search(&self) -> Result<Value, QueryError> {
        let mut request = self
            .agent
            .post(&self.endpoint)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/json");
        match &self.token {
            Some(token) => request = request.set("Authorization", &format!("bearer {token}")),
            None => tracing::debug!("no GITHUB_TOKEN set; request is subject to anonymous rate limits"),
        }

        tracing::debug!(endpoint = %self.endpoint, "graphql: {}", self.query);
        let response = match request.send_json(json!({ "query": self.query })) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let fallback = response.status_text().to_string();
                let message = response
                    .into_string()
                    .ok()
                    .and_then(|body| api_message(&body))
                    .unwrap_or(fallback);
                return Err(QueryError::Http { status, message });
            }
            Err(ureq::Error::Transport(err)) => return Err(QueryError::Transport(err.to_string())),
        };

        if response.status() != 200 {
            return Err(QueryError::Http {
                status: response.status(),
                message: response.status_text().to_string(),
            });
        }
        let body = response
            .into_string()
            .map_err(|e| QueryError::Transport(e.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl TreadmillLocator for GithubLocator {
    fn find_open_treadmill_pr(&self, title: &str) -> Result<u64, QueryError> {
        let body = self.search()?;
        if let Some(errors) = body.get("errors") {
            tracing::warn!("GitHub API reported errors: {errors}");
        }
        let number = resolve_treadmill_pr(&body, title)?;
        tracing::info!("found open treadmill PR #{number}");
        Ok(number)
    }
}

// ---------------------------------------------------------------------------
// Query and resolution
// ---------------------------------------------------------------------------

/// The search request, collapsed onto a single line.
pub fn search_query(repo: &str, product: &str) -> String {
    let query = format!(
        r#"
        {{
          search(
            type: ISSUE,
            first: 10,
            query: "repo:{repo} {product} vendor treadmill"
          ) {{
            edges {{
              node {{
                ... on PullRequest {{
                  number
                  state
                  title
                }}
              }}
            }}
          }}
        }}
        "#
    );
    normalize_whitespace(&query)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce a search response to the one open PR titled `title`.
pub fn resolve_treadmill_pr(body: &Value, title: &str) -> Result<u64, QueryError> {
    let edges = field(body, "data", "data")
        .and_then(|data| field(data, "search", "data.search"))
        .and_then(|search| field(search, "edges", "data.search.edges"))?
        .as_array()
        .ok_or_else(|| QueryError::Malformed {
            path: "data.search.edges".to_string(),
        })?;

    if edges.is_empty() {
        return Err(QueryError::NoCandidate);
    }

    let candidates = edges
        .iter()
        .filter_map(|edge| edge.get("node"))
        .filter(|node| node.is_object())
        .map(|node| serde_json::from_value::<TreadmillPr>(node.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    let titled: Vec<&TreadmillPr> = candidates.iter().filter(|pr| pr.title == title).collect();
    if titled.is_empty() {
        let seen: Vec<String> = candidates
            .iter()
            .filter(|pr| !pr.title.is_empty())
            .map(|pr| format!("#{} '{}'", pr.number, pr.title))
            .collect();
        return Err(QueryError::TitleMismatch {
            title: title.to_string(),
            seen: if seen.is_empty() {
                "nothing".to_string()
            } else {
                seen.join(", ")
            },
        });
    }

    let open: Vec<u64> = titled
        .iter()
        .filter(|pr| pr.state == PrState::Open)
        .map(|pr| pr.number)
        .collect();
    match open.as_slice() {
        [] => Err(QueryError::NotOpen {
            title: title.to_string(),
            numbers: titled.iter().map(|pr| pr.number).collect(),
        }),
        [number] => Ok(*number),
        _ => Err(QueryError::Ambiguous {
            title: title.to_string(),
            numbers: open,
        }),
    }
}

/// `null` counts as missing; GitHub answers `{"data": null, "errors": [...]}`
/// when the query itself fails.
fn field<'v>(value: &'v Value, key: &str, path: &str) -> Result<&'v Value, QueryError> {
    value
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| QueryError::Malformed {
            path: path.to_string(),
        })
}

/// GitHub error bodies look like `{"message": "Bad credentials", ...}`.
fn api_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}
