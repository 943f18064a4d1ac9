//! Hosted Git API client.
//!
//! [`GitRemote`] is the seam between the publisher and the remote: five Git
//! Data calls, each synchronous and fallible. [`GithubClient`] implements it
//! over the GitHub REST API (github.com or GitHub Enterprise `/api/v3`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use vaultpub_core::types::{Identity, RepoUrl};

use crate::error::{remote_err, RemoteCall, SyncError};
use crate::reconcile::TreeMutation;

/// Per-call timeout applied to the whole agent.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// File mode for a regular (non-executable) blob.
const BLOB_MODE: &str = "100644";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The five remote calls a publish sequences. Implementations must not
/// retry internally; a failure aborts the publish and the next one starts
/// over from a fresh ref read.
pub trait GitRemote {
    /// Resolve `branch` to its current commit sha (read-ref).
    fn branch_head(&self, branch: &str) -> Result<String, SyncError>;

    /// Resolve a commit sha to its root tree sha (read-commit).
    fn commit_root_tree(&self, commit_sha: &str) -> Result<String, SyncError>;

    /// Full recursive flat listing of a tree (read-tree).
    fn tree_entries(&self, tree_sha: &str) -> Result<Vec<TreeEntry>, SyncError>;

    /// Write a new tree on top of `base_tree` applying `mutations`; returns
    /// the new tree sha. Deletions are entries with a null object reference.
    fn create_tree(&self, base_tree: &str, mutations: &[TreeMutation])
        -> Result<String, SyncError>;

    /// Write a commit for `tree_sha` with a single parent; returns the new
    /// commit sha.
    fn create_commit(
        &self,
        tree_sha: &str,
        parent: &str,
        message: &str,
        identity: &Identity,
    ) -> Result<String, SyncError>;

    /// Move `branch` to `commit_sha`, non-force: must fail, not overwrite,
    /// if the branch moved concurrently.
    fn update_ref(&self, branch: &str, commit_sha: &str) -> Result<(), SyncError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One entry of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub sha: Option<String>,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.entry_type == "blob"
    }
}

#[derive(Deserialize)]
struct RefResponse {
    object: ShaOnly,
}

#[derive(Deserialize)]
struct ShaOnly {
    sha: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    tree: ShaOnly,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Serialize)]
struct CreateTreeBody<'a> {
    base_tree: &'a str,
    tree: Vec<TreeEntryWire<'a>>,
}

/// Outgoing create-tree entry. Upserts carry inline `content` and omit
/// `sha`; deletions carry an explicit `"sha": null` and omit `content`.
#[derive(Serialize)]
struct TreeEntryWire<'a> {
    path: &'a str,
    mode: &'static str,
    #[serde(rename = "type")]
    entry_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<Option<&'a str>>,
}

impl<'a> From<&'a TreeMutation> for TreeEntryWire<'a> {
    fn from(mutation: &'a TreeMutation) -> Self {
        match mutation {
            TreeMutation::Upsert { path, content } => Self {
                path,
                mode: BLOB_MODE,
                entry_type: "blob",
                content: Some(content),
                sha: None,
            },
            TreeMutation::Delete { path } => Self {
                path,
                mode: BLOB_MODE,
                entry_type: "blob",
                content: None,
                sha: Some(None),
            },
        }
    }
}

#[derive(Serialize)]
struct WireIdentity<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: [&'a str; 1],
    author: WireIdentity<'a>,
    committer: WireIdentity<'a>,
}

#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// ureq-backed [`GitRemote`] implementation.
pub struct GithubClient {
    agent: ureq::Agent,
    base: String,
    token: String,
}

impl GithubClient {
    pub fn new(repo: &RepoUrl, token: String) -> Self {
        Self::with_timeout(repo, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(repo: &RepoUrl, token: String, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base: format!("{}/repos/{}/{}", api_root(&repo.host), repo.owner, repo.repo),
            token,
        }
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "vaultpub")
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        call: RemoteCall,
        url: &str,
    ) -> Result<T, SyncError> {
        let response = self.request("GET", url).call().map_err(|e| map_err(call, e))?;
        response
            .into_json()
            .map_err(|e| remote_err(call, None, format!("invalid response body: {e}")))
    }

    fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        call: RemoteCall,
        method: &str,
        url: &str,
        body: impl Serialize,
    ) -> Result<T, SyncError> {
        let response = self
            .request(method, url)
            .send_json(body)
            .map_err(|e| map_err(call, e))?;
        response
            .into_json()
            .map_err(|e| remote_err(call, None, format!("invalid response body: {e}")))
    }
}

/// github.com uses a dedicated API host; Enterprise serves under `/api/v3`.
fn api_root(host: &str) -> String {
    if host == "github.com" {
        "https://api.github.com".to_owned()
    } else {
        format!("https://{host}/api/v3")
    }
}

/// Reject truncated recursive listings: a partial listing would turn every
/// unseen remote entry into a spurious delete.
fn entries_from(resp: TreeResponse) -> Result<Vec<TreeEntry>, SyncError> {
    if resp.truncated {
        return Err(SyncError::TreeTruncated);
    }
    Ok(resp.tree)
}

/// 409/422 on the non-force ref update means the branch moved concurrently;
/// everything else passes through unchanged.
fn mark_ref_conflict(branch: &str, err: SyncError) -> SyncError {
    match err {
        SyncError::Remote {
            status: Some(409 | 422),
            ..
        } => SyncError::RefConflict {
            branch: branch.to_owned(),
        },
        other => other,
    }
}

fn map_err(call: RemoteCall, err: ureq::Error) -> SyncError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_string()
                .unwrap_or_else(|_| "<unreadable body>".to_owned());
            remote_err(call, Some(status), message)
        }
        ureq::Error::Transport(transport) => remote_err(call, None, transport.to_string()),
    }
}

impl GitRemote for GithubClient {
    fn branch_head(&self, branch: &str) -> Result<String, SyncError> {
        let url = format!("{}/git/ref/heads/{branch}", self.base);
        let resp: RefResponse = self.get_json(RemoteCall::GetRef, &url)?;
        Ok(resp.object.sha)
    }

    fn commit_root_tree(&self, commit_sha: &str) -> Result<String, SyncError> {
        let url = format!("{}/git/commits/{commit_sha}", self.base);
        let resp: CommitResponse = self.get_json(RemoteCall::GetCommit, &url)?;
        Ok(resp.tree.sha)
    }

    fn tree_entries(&self, tree_sha: &str) -> Result<Vec<TreeEntry>, SyncError> {
        let url = format!("{}/git/trees/{tree_sha}?recursive=1", self.base);
        entries_from(self.get_json(RemoteCall::GetTree, &url)?)
    }

    fn create_tree(
        &self,
        base_tree: &str,
        mutations: &[TreeMutation],
    ) -> Result<String, SyncError> {
        let url = format!("{}/git/trees", self.base);
        let body = CreateTreeBody {
            base_tree,
            tree: mutations.iter().map(TreeEntryWire::from).collect(),
        };
        let resp: ShaOnly = self.send_json(RemoteCall::CreateTree, "POST", &url, body)?;
        Ok(resp.sha)
    }

    fn create_commit(
        &self,
        tree_sha: &str,
        parent: &str,
        message: &str,
        identity: &Identity,
    ) -> Result<String, SyncError> {
        let url = format!("{}/git/commits", self.base);
        let body = CreateCommitBody {
            message,
            tree: tree_sha,
            parents: [parent],
            author: WireIdentity {
                name: &identity.name,
                email: &identity.email,
            },
            committer: WireIdentity {
                name: &identity.name,
                email: &identity.email,
            },
        };
        let resp: ShaOnly = self.send_json(RemoteCall::CreateCommit, "POST", &url, body)?;
        Ok(resp.sha)
    }

    fn update_ref(&self, branch: &str, commit_sha: &str) -> Result<(), SyncError> {
        let url = format!("{}/git/refs/heads/{branch}", self.base);
        let body = UpdateRefBody {
            sha: commit_sha,
            force: false,
        };
        self.request("PATCH", &url)
            .send_json(body)
            .map_err(|e| mark_ref_conflict(branch, map_err(RemoteCall::UpdateRef, e)))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
