//! GitHub contents API archive
//!
//! Stores files in a repository through the REST contents endpoints:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | get_file | `GET /repos/{repo}/contents/{path}` |
//! | create_or_update_file | `PUT /repos/{repo}/contents/{path}` |
//! | delete_file | `DELETE /repos/{repo}/contents/{path}` |
//! | list_directory | `GET /repos/{repo}/contents/{dir}` |
//!
//! File bodies travel base64-encoded. Files larger than the inline limit
//! come back without content and are fetched from their `download_url`.

use crate::error::{ArchiveError, ArchiveResult};
use crate::traits::{ArchiveEntry, ArchiveFile, RemoteArchive};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Public GitHub API base URL
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ContentsItem {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteBody<'a> {
    message: &'a str,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// [`RemoteArchive`] over a GitHub repository
pub struct GitHubArchive {
    client: reqwest::Client,
    api_base: String,
    repo: String,
    token: String,
    branch: Option<String>,
}

impl std::fmt::Debug for GitHubArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubArchive")
            .field("api_base", &self.api_base)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl GitHubArchive {
    /// Create a client for `repo` (`owner/name`) authenticated with `token`
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> ArchiveResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("kvsnap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: GITHUB_API_BASE.to_string(),
            repo: repo.into(),
            token: token.into(),
            branch: None,
        })
    }

    /// Commit to `branch` instead of the repository default
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    /// Talk to a different API host (GitHub Enterprise)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Repository identity
    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            self.repo,
            path.trim_matches('/')
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    fn with_ref(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.branch {
            Some(branch) => builder.query(&[("ref", branch.as_str())]),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> ArchiveResult<Response> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.message)
            .unwrap_or(text);
        Err(classify_status(status, path, message))
    }

    async fn get_item(&self, path: &str) -> ArchiveResult<serde_json::Value> {
        let builder = self.with_ref(self.client.get(self.contents_url(path)));
        let response = self.send(builder, path).await?;
        response
            .json()
            .await
            .map_err(|e| ArchiveError::Decode(e.to_string()))
    }

    async fn download(&self, url: &str, path: &str) -> ArchiveResult<String> {
        debug!(path, "downloading large archive file");
        let response = self.send(self.client.get(url), path).await?;
        Ok(response.text().await?)
    }
}

fn classify_status(status: StatusCode, path: &str, message: String) -> ArchiveError {
    match status {
        StatusCode::NOT_FOUND => ArchiveError::NotFound {
            path: path.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ArchiveError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::CONFLICT => ArchiveError::Conflict {
            path: path.to_string(),
        },
        StatusCode::UNPROCESSABLE_ENTITY if message.contains("sha") => ArchiveError::Conflict {
            path: path.to_string(),
        },
        _ => ArchiveError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

fn decode_content(encoded: &str) -> ArchiveResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| ArchiveError::Decode(format!("base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ArchiveError::Decode(format!("utf-8: {e}")))
}

#[async_trait]
impl RemoteArchive for GitHubArchive {
    async fn get_file(&self, path: &str) -> ArchiveResult<ArchiveFile> {
        let item: ContentsItem = serde_json::from_value(self.get_item(path).await?)
            .map_err(|_| ArchiveError::Decode(format!("{path} is not a file")))?;
        if item.kind != "file" {
            return Err(ArchiveError::Decode(format!("{path} is a {}", item.kind)));
        }

        let content = match (item.encoding.as_deref(), item.content.as_deref()) {
            (Some("base64"), Some(encoded)) if !encoded.is_empty() => decode_content(encoded)?,
            _ => match item.download_url.as_deref() {
                Some(url) => self.download(url, path).await?,
                None => String::new(),
            },
        };

        Ok(ArchiveFile {
            content,
            sha: item.sha,
        })
    }

    async fn create_or_update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> ArchiveResult<String> {
        let body = PutBody {
            message,
            content: STANDARD.encode(content.as_bytes()),
            sha,
            branch: self.branch.as_deref(),
        };
        let builder = self.client.put(self.contents_url(path)).json(&body);
        let response = self.send(builder, path).await?;
        let put: PutResponse = response
            .json()
            .await
            .map_err(|e| ArchiveError::Decode(e.to_string()))?;
        Ok(put.content.sha)
    }

    async fn delete_file(&self, path: &str, message: &str, sha: &str) -> ArchiveResult<()> {
        let body = DeleteBody {
            message,
            sha,
            branch: self.branch.as_deref(),
        };
        let builder = self.client.delete(self.contents_url(path)).json(&body);
        self.send(builder, path).await?;
        Ok(())
    }

    async fn list_directory(&self, path: &str) -> ArchiveResult<Vec<ArchiveEntry>> {
        let items: Vec<ContentsItem> = serde_json::from_value(self.get_item(path).await?)
            .map_err(|_| ArchiveError::Decode(format!("{path} is not a directory")))?;
        Ok(items
            .into_iter()
            .filter(|item| item.kind == "file")
            .map(|item| ArchiveEntry {
                name: item.name,
                path: item.path,
                sha: item.sha,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_url() {
        let archive = GitHubArchive::new("owner/repo", "t")
            .unwrap()
            .with_api_base("https://ghe.example/api/v3/");
        assert_eq!(
            archive.contents_url("/backups/backup-2026-10-19.json"),
            "https://ghe.example/api/v3/repos/owner/repo/contents/backups/backup-2026-10-19.json"
        );
    }

    #[test]
    fn test_decode_content_ignores_line_breaks() {
        let encoded = STANDARD.encode("{\"version\":\"1.0\"}");
        let (a, b) = encoded.split_at(8);
        assert_eq!(
            decode_content(&format!("{a}\n{b}\n")).unwrap(),
            "{\"version\":\"1.0\"}"
        );
        assert!(decode_content("***").is_err());
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::NOT_FOUND, "p", String::new()).is_not_found());
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "p", "Bad credentials".into()),
            ArchiveError::Unauthorized { status: 401, .. }
        ));
        assert!(matches!(
            classify_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                "p",
                "\"sha\" wasn't supplied".into()
            ),
            ArchiveError::Conflict { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "p", "oops".into()),
            ArchiveError::Status { status: 502, .. }
        ));
    }

    #[test]
    fn test_put_body_omits_missing_sha() {
        let body = PutBody {
            message: "m",
            content: "Yw==".into(),
            sha: None,
            branch: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());
        assert!(json.get("branch").is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let archive = GitHubArchive::new("owner/repo", "ghp_secret").unwrap();
        assert!(!format!("{archive:?}").contains("ghp_secret"));
        assert_eq!(archive.repo(), "owner/repo");
    }
}
