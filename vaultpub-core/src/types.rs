//! Domain types for the vaultpub target registry.
//!
//! All local path fields use `PathBuf`; remote paths are `String` because
//! the remote side always uses `/` separators regardless of platform.
//! All types are serializable/deserializable via serde + serde_yaml.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable consulted before the stored token.
pub const TOKEN_ENV: &str = "VAULTPUB_TOKEN";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a configured mirror target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetName(pub String);

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TargetName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TargetName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Repository coordinates
// ---------------------------------------------------------------------------

/// Parsed repository coordinates: host, owner, repository name.
///
/// Parsed from `https://host/owner/repo[.git]`, `host/owner/repo[.git]`, or
/// bare `owner/repo` (host defaults to `github.com`). Anything else fails
/// validation before a single network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoUrl {
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl FromStr for RepoUrl {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ConfigError::MalformedRepoUrl { url: s.to_owned() };

        let trimmed = s
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');

        let parts: Vec<&str> = trimmed.split('/').collect();
        let (host, owner, repo) = match parts.as_slice() {
            [owner, repo] => ("github.com", *owner, *repo),
            [host, owner, repo] => (*host, *owner, *repo),
            _ => return Err(malformed()),
        };

        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if host.is_empty() || owner.is_empty() || repo.is_empty() {
            return Err(malformed());
        }
        if [host, owner, repo].iter().any(|p| p.contains(char::is_whitespace)) {
            return Err(malformed());
        }

        Ok(Self {
            host: host.to_owned(),
            owner: owner.to_owned(),
            repo: repo.to_owned(),
        })
    }
}

impl fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.owner, self.repo)
    }
}

// ---------------------------------------------------------------------------
// Commit identity
// ---------------------------------------------------------------------------

/// Fixed author/committer identity stamped on every published commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: "vaultpub".to_owned(),
            email: "vaultpub@localhost".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// One configured mirror: a local vault selection published into a folder of
/// a remote repository branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: TargetName,
    pub repo: RepoUrl,
    pub branch: String,
    /// Remote folder prefix the mirror lives under. Empty means the branch
    /// root itself is the mirrored region: a publish then deletes any remote
    /// file not in the local selection, including files vaultpub never wrote.
    #[serde(default)]
    pub folder: String,
    /// Absolute path of the local vault root on disk.
    pub vault: PathBuf,
    /// Vault-relative files and folders to mirror. Folders expand
    /// recursively at publish time.
    #[serde(default)]
    pub selection: Vec<PathBuf>,
    /// Stored access token. `VAULTPUB_TOKEN` takes precedence when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Commit message override; a summary message is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    #[serde(default)]
    pub identity: Identity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Target {
    /// Resolve the access token: environment first, stored token second.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        if let Ok(tok) = std::env::var(TOKEN_ENV) {
            if !tok.is_empty() {
                return Ok(tok);
            }
        }
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(TargetName::from("notes").to_string(), "notes");
    }

    #[test]
    fn repo_url_full_https_form() {
        let url: RepoUrl = "https://github.com/alice/notes.git".parse().unwrap();
        assert_eq!(url.host, "github.com");
        assert_eq!(url.owner, "alice");
        assert_eq!(url.repo, "notes");
    }

    #[test]
    fn repo_url_bare_owner_repo_defaults_host() {
        let url: RepoUrl = "alice/notes".parse().unwrap();
        assert_eq!(url.host, "github.com");
        assert_eq!(url.to_string(), "github.com/alice/notes");
    }

    #[test]
    fn repo_url_host_owner_repo() {
        let url: RepoUrl = "ghe.corp.example/team/wiki".parse().unwrap();
        assert_eq!(url.host, "ghe.corp.example");
        assert_eq!(url.owner, "team");
        assert_eq!(url.repo, "wiki");
    }

    #[test]
    fn repo_url_rejects_malformed_shapes() {
        for bad in ["", "notes", "a/b/c/d", "alice//", "https://", "a b/repo"] {
            assert!(
                bad.parse::<RepoUrl>().is_err(),
                "'{bad}' should fail validation"
            );
        }
    }

    #[test]
    fn target_serde_roundtrip() {
        let now = Utc::now();
        let target = Target {
            name: TargetName::from("notes"),
            repo: "alice/notes".parse().unwrap(),
            branch: "main".to_owned(),
            folder: "docs".to_owned(),
            vault: PathBuf::from("/home/alice/vault"),
            selection: vec![PathBuf::from("journal"), PathBuf::from("todo.md")],
            token: None,
            commit_message: None,
            identity: Identity::default(),
            created_at: now,
            updated_at: now,
        };
        let yaml = serde_yaml::to_string(&target).expect("serialize");
        let back: Target = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back, target);
    }

    #[test]
    fn resolve_token_prefers_stored_when_env_unset() {
        // Tests never set VAULTPUB_TOKEN; process env is assumed clean here.
        let mut target = Target {
            name: TargetName::from("t"),
            repo: "alice/notes".parse().unwrap(),
            branch: "main".to_owned(),
            folder: String::new(),
            vault: PathBuf::from("/v"),
            selection: vec![],
            token: Some("ghp_stored".to_owned()),
            commit_message: None,
            identity: Identity::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(target.resolve_token().unwrap(), "ghp_stored");

        target.token = None;
        assert!(matches!(
            target.resolve_token(),
            Err(ConfigError::MissingToken)
        ));
    }
}
