//! Work items and input handling.
//!
//! The work source is a stream of lines, each an `owner/repo` token. Lines
//! are normalized by [`prepare_tokens`] (trimmed, blanks and `#` comments
//! dropped, duplicates removed) and parsed into [`WorkItem`]s.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tokio::io::AsyncReadExt;

use crate::error::WorkItemError;

/// One repository to migrate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    owner: String,
    repo: String,
}

impl WorkItem {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Canonical `owner/repo` key used for bookkeeping.
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Clone URL under the given source base (e.g. `https://github.com`).
    pub fn source_url(&self, source_base: &str) -> String {
        format!(
            "{}/{}/{}",
            source_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }

    /// Name of the repository created at the destination.
    pub fn dest_repo_name(&self) -> String {
        format!("{}-{}", self.owner, self.repo)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for WorkItem {
    type Err = WorkItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || WorkItemError {
            line: s.to_string(),
        };

        let mut parts = s.split('/');
        let (Some(owner), Some(repo), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        let invalid = |part: &str| part.is_empty() || part == "." || part == "..";
        if invalid(owner) || invalid(repo) {
            return Err(malformed());
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

/// Normalize raw input lines into unique tokens, keeping first-seen order.
pub fn prepare_tokens<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for line in lines {
        let token = line.as_ref().trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }
        if seen.insert(token.to_string()) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Split text into lines.
pub fn read_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Read every input file in order; `-` reads standard input.
///
/// # Errors
/// Returns the first I/O error, annotated with the offending path.
pub async fn read_input_files(paths: &[PathBuf]) -> std::io::Result<Vec<String>> {
    let mut lines = Vec::new();
    for path in paths {
        let text = if path == Path::new("-") {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        } else {
            tokio::fs::read_to_string(path).await.map_err(|e| {
                std::io::Error::new(e.kind(), format!("{}: {e}", path.display()))
            })?
        };
        lines.extend(read_lines(&text));
    }
    Ok(lines)
}
