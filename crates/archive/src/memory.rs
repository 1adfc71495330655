//! In-memory archive
//!
//! A [`RemoteArchive`] over a path → file map with SHA-256 content handles
//! and the same handle discipline as the GitHub backend: creating over an
//! existing file or writing with a stale handle is a conflict.

use crate::error::{ArchiveError, ArchiveResult};
use crate::traits::{ArchiveEntry, ArchiveFile, RemoteArchive};
use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// A commit recorded by the in-memory archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Path touched
    pub path: String,
    /// Commit message
    pub message: String,
}

/// In-memory [`RemoteArchive`]
#[derive(Debug, Default)]
pub struct MemoryArchive {
    files: Mutex<BTreeMap<String, ArchiveFile>>,
    commits: Mutex<Vec<CommitRecord>>,
    failing_deletes: Mutex<HashSet<String>>,
    offline: AtomicBool,
}

impl MemoryArchive {
    /// Create an empty archive
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without recording a commit
    pub fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        let content = content.into();
        let sha = content_sha(&content);
        self.files.lock().insert(path.into(), ArchiveFile { content, sha });
    }

    /// Current content at `path`
    pub fn content(&self, path: &str) -> Option<String> {
        self.files.lock().get(path).map(|f| f.content.clone())
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }

    /// Commits made through the trait, oldest first
    pub fn commits(&self) -> Vec<CommitRecord> {
        self.commits.lock().clone()
    }

    /// Make deleting `path` fail
    pub fn fail_deletes_for(&self, path: impl Into<String>) {
        self.failing_deletes.lock().insert(path.into());
    }

    /// Make every request fail as if the network were down
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> ArchiveResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ArchiveError::Http("archive unreachable".to_string()));
        }
        Ok(())
    }

    fn record(&self, path: &str, message: &str) {
        self.commits.lock().push(CommitRecord {
            path: path.to_string(),
            message: message.to_string(),
        });
    }
}

/// SHA-256 hex of `content`
fn content_sha(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn parent_and_name(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

#[async_trait]
impl RemoteArchive for MemoryArchive {
    async fn get_file(&self, path: &str) -> ArchiveResult<ArchiveFile> {
        self.check_online()?;
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound {
                path: path.to_string(),
            })
    }

    async fn create_or_update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> ArchiveResult<String> {
        self.check_online()?;
        let mut files = self.files.lock();
        let current = files.get(path).map(|f| f.sha.as_str());
        if current != sha {
            return Err(ArchiveError::Conflict {
                path: path.to_string(),
            });
        }

        let new_sha = content_sha(content);
        files.insert(
            path.to_string(),
            ArchiveFile {
                content: content.to_string(),
                sha: new_sha.clone(),
            },
        );
        drop(files);
        self.record(path, message);
        Ok(new_sha)
    }

    async fn delete_file(&self, path: &str, message: &str, sha: &str) -> ArchiveResult<()> {
        self.check_online()?;
        if self.failing_deletes.lock().contains(path) {
            return Err(ArchiveError::Status {
                status: 500,
                message: format!("injected delete failure for {path}"),
            });
        }

        let mut files = self.files.lock();
        let current = files.get(path).map(|f| f.sha.clone());
        match current {
            None => {
                return Err(ArchiveError::NotFound {
                    path: path.to_string(),
                })
            }
            Some(current) if current != sha => {
                return Err(ArchiveError::Conflict {
                    path: path.to_string(),
                })
            }
            Some(_) => {
                files.remove(path);
            }
        }
        drop(files);
        self.record(path, message);
        Ok(())
    }

    async fn list_directory(&self, path: &str) -> ArchiveResult<Vec<ArchiveEntry>> {
        self.check_online()?;
        let dir = path.trim_matches('/');
        let entries: Vec<ArchiveEntry> = self
            .files
            .lock()
            .iter()
            .filter_map(|(file_path, file)| {
                let (parent, name) = parent_and_name(file_path);
                (parent == dir).then(|| ArchiveEntry {
                    name: name.to_string(),
                    path: file_path.clone(),
                    sha: file.sha.clone(),
                })
            })
            .collect();

        if entries.is_empty() {
            return Err(ArchiveError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(entries)
    }
}
