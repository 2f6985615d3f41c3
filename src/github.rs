//! Hosted repository content API client.
//!
//! Implements [`ContentStore`] over the GitHub "contents" endpoints:
//!
//! ```text
//! GET {api}/repos/{owner}/{repo}/contents/{path}?ref={branch}
//!     200 → {"content": "<base64>", "sha": "<revision>", ...}
//!     404 → not found
//! PUT {api}/repos/{owner}/{repo}/contents/{path}
//!     body {"message", "content", "branch", "sha"?}
//!     409 / 422 → stale or missing sha
//! ```
//!
//! The client is blocking: a publish is three sequential calls and nothing
//! else runs alongside it.

use crate::config::RepositoryConfig;
use crate::store::{ContentStore, EncodedContent, Revision, StoreError, StoredFile};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::fmt;

const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Access token for the content API.
///
/// Held in memory for the life of the process only; `Debug` never prints it.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for an empty or whitespace-only token.
    pub fn new(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    fn header_value(&self) -> Result<HeaderValue, StoreError> {
        let mut value = HeaderValue::from_str(&format!("token {}", self.0))
            .map_err(|_| StoreError::InvalidResponse("token is not a valid header value".into()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Response body of a contents GET (fields we use).
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    sha: String,
}

/// Request body of a contents PUT.
#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

pub struct GitHubStore {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    branch: String,
    credential: Credential,
}

impl GitHubStore {
    pub fn new(repository: &RepositoryConfig, credential: Credential) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("letters/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            api_url: repository.api_url.trim_end_matches('/').to_string(),
            owner: repository.owner.clone(),
            repo: repository.name.clone(),
            branch: repository.branch.clone(),
            credential,
        })
    }

    /// `{api}/repos/{owner}/{repo}/contents/{path}`
    fn contents_url(&self, path: &str) -> String {
        contents_url(&self.api_url, &self.owner, &self.repo, path)
    }
}

pub(crate) fn contents_url(api_url: &str, owner: &str, repo: &str, path: &str) -> String {
    format!(
        "{}/repos/{}/{}/contents/{}",
        api_url.trim_end_matches('/'),
        owner,
        repo,
        path.trim_start_matches('/')
    )
}

/// Map a non-success status to the store's error taxonomy.
pub(crate) fn classify_failure(status: StatusCode, path: &str, body: String) -> StoreError {
    match status {
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => StoreError::Conflict {
            path: path.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized {
            status: status.as_u16(),
        },
        _ => StoreError::Api {
            status: status.as_u16(),
            body: if body.is_empty() {
                "content API error".to_string()
            } else {
                body
            },
        },
    }
}

fn failure(response: Response, path: &str) -> StoreError {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    classify_failure(status, path, body)
}

impl ContentStore for GitHubStore {
    fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let response = self
            .client
            .get(self.contents_url(path))
            .query(&[("ref", self.branch.as_str())])
            .header(AUTHORIZATION, self.credential.header_value()?)
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(path, "file not found in repository");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(failure(response, path));
        }

        let body: ContentsResponse = response.json()?;
        let content = body.content.ok_or_else(|| {
            StoreError::InvalidResponse(format!("{path} has no inline content (is it a directory?)"))
        })?;
        Ok(Some(StoredFile {
            content: EncodedContent::from_encoded(content),
            revision: Revision::new(body.sha),
        }))
    }

    fn put(
        &self,
        path: &str,
        content: &EncodedContent,
        commit_message: &str,
        revision: Option<&Revision>,
    ) -> Result<(), StoreError> {
        let body = PutBody {
            message: commit_message,
            content: content.as_str(),
            branch: &self.branch,
            sha: revision.map(Revision::as_str),
        };
        let response = self
            .client
            .put(self.contents_url(path))
            .header(AUTHORIZATION, self.credential.header_value()?)
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            return Err(failure(response, path));
        }
        tracing::debug!(path, commit_message, "committed file");
        Ok(())
    }
}
