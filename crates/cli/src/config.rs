//! Environment configuration
//!
//! Credentials come only from the environment and are checked before any
//! network I/O. A missing or empty variable is an error; there are no
//! built-in fallbacks.
//!
//! | Variable | Used for |
//! |----------|----------|
//! | `UPSTASH_REDIS_REST_URL` | store REST endpoint (`http`/`https`) |
//! | `UPSTASH_REDIS_REST_TOKEN` | store bearer token |
//! | `GITHUB_TOKEN` | archive token |
//! | `GITHUB_REPO` | archive repository, `owner/repo` |
//! | `GITHUB_BRANCH` | archive branch (optional) |

use kvsnap_archive::GitHubArchive;
use kvsnap_store::RestStore;
use thiserror::Error;

/// Store REST URL variable
pub const STORE_URL_VAR: &str = "UPSTASH_REDIS_REST_URL";
/// Store token variable
pub const STORE_TOKEN_VAR: &str = "UPSTASH_REDIS_REST_TOKEN";
/// Archive token variable
pub const ARCHIVE_TOKEN_VAR: &str = "GITHUB_TOKEN";
/// Archive repository variable
pub const ARCHIVE_REPO_VAR: &str = "GITHUB_REPO";
/// Archive branch variable
pub const ARCHIVE_BRANCH_VAR: &str = "GITHUB_BRANCH";

/// Configuration failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set to an unusable value
    #[error("invalid {var}: {reason}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// What is wrong
        reason: String,
    },
}

/// Result alias for configuration
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

fn required(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> ConfigResult<String> {
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Store connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// REST endpoint
    pub url: String,
    /// Bearer token
    pub token: String,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl StoreConfig {
    /// Read from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Read through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let url = required(&lookup, STORE_URL_VAR)?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                var: STORE_URL_VAR,
                reason: "must be an http or https URL".to_string(),
            });
        }
        let token = required(&lookup, STORE_TOKEN_VAR)?;
        Ok(StoreConfig { url, token })
    }

    /// Build the REST client
    pub fn connect(&self) -> anyhow::Result<RestStore> {
        Ok(RestStore::new(self.url.clone(), self.token.clone())?)
    }
}

/// Archive connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// `owner/repo`
    pub repo: String,
    /// API token
    pub token: String,
    /// Branch, repository default when `None`
    pub branch: Option<String>,
}

impl std::fmt::Debug for ArchiveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveConfig")
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ArchiveConfig {
    /// Read from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Read through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let token = required(&lookup, ARCHIVE_TOKEN_VAR)?;
        let repo = required(&lookup, ARCHIVE_REPO_VAR)?;
        let valid = matches!(
            repo.split_once('/'),
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/')
        );
        if !valid {
            return Err(ConfigError::Invalid {
                var: ARCHIVE_REPO_VAR,
                reason: format!("expected owner/repo, got {repo:?}"),
            });
        }
        let branch = lookup(ARCHIVE_BRANCH_VAR)
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        Ok(ArchiveConfig {
            repo,
            token,
            branch,
        })
    }

    /// Build the GitHub client
    pub fn connect(&self) -> anyhow::Result<GitHubArchive> {
        Ok(GitHubArchive::new(self.repo.clone(), self.token.clone())?
            .with_branch(self.branch.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_store_config() {
        let cfg = StoreConfig::from_lookup(env(&[
            (STORE_URL_VAR, "https://eu1.example.io"),
            (STORE_TOKEN_VAR, "tok"),
        ]))
        .unwrap();
        assert_eq!(cfg.url, "https://eu1.example.io");
        assert!(!format!("{cfg:?}").contains("tok\""));
    }

    #[test]
    fn test_missing_and_empty_fail_closed() {
        assert_eq!(
            StoreConfig::from_lookup(env(&[(STORE_URL_VAR, "https://x")])),
            Err(ConfigError::Missing(STORE_TOKEN_VAR))
        );
        assert_eq!(
            StoreConfig::from_lookup(env(&[(STORE_URL_VAR, " "), (STORE_TOKEN_VAR, "t")])),
            Err(ConfigError::Missing(STORE_URL_VAR))
        );
    }

    #[test]
    fn test_store_url_must_be_http() {
        let err = StoreConfig::from_lookup(env(&[
            (STORE_URL_VAR, "redis://host:6379"),
            (STORE_TOKEN_VAR, "t"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: STORE_URL_VAR, .. }));
    }

    #[test]
    fn test_archive_repo_shape() {
        for bad in ["repo", "/repo", "owner/", "a/b/c"] {
            let err = ArchiveConfig::from_lookup(env(&[
                (ARCHIVE_TOKEN_VAR, "t"),
                (ARCHIVE_REPO_VAR, bad),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{bad}");
        }

        let cfg = ArchiveConfig::from_lookup(env(&[
            (ARCHIVE_TOKEN_VAR, "t"),
            (ARCHIVE_REPO_VAR, "acme/backups"),
            (ARCHIVE_BRANCH_VAR, ""),
        ]))
        .unwrap();
        assert_eq!(cfg.repo, "acme/backups");
        assert_eq!(cfg.branch, None);
    }
}
