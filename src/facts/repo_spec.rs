use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::bail;
use serde::{Deserialize, Serialize};
use url::Url;

/// Identifies a hosted repository as `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSpec {
    owner: Box<str>,
    repo: Box<str>,
}

impl RepoSpec {
    #[must_use]
    pub fn new(owner: impl AsRef<str>, repo: impl AsRef<str>) -> Self {
        Self {
            owner: Box::from(owner.as_ref()),
            repo: Box::from(repo.as_ref().trim_end_matches(".git")),
        }
    }

    /// Parse a repository reference.
    ///
    /// Accepts a bare `repo` (qualified with `default_owner`), `owner/repo`, or a
    /// `https://github.com/owner/repo` URL.
    pub fn parse(text: &str, default_owner: &str) -> Result<Self> {
        let text = text.trim();

        if text.starts_with("http://") || text.starts_with("https://") {
            let url = Url::parse(text)?;
            return Self::from_url(&url);
        }

        let segments: Vec<_> = text.split('/').collect();
        match segments.as_slice() {
            [repo] if !repo.is_empty() => {
                if default_owner.is_empty() {
                    bail!("repository '{text}' has no owner and no default owner is configured");
                }
                Ok(Self::new(default_owner, repo))
            }
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => Ok(Self::new(owner, repo)),
            _ => bail!("invalid repository reference: '{text}'"),
        }
    }

    fn from_url(url: &Url) -> Result<Self> {
        if url.host_str() != Some("github.com") {
            bail!("not a GitHub URL: {url}");
        }

        let path_segments: Vec<_> = url.path_segments().map(Iterator::collect).unwrap_or_default();

        if path_segments.len() < 2 {
            bail!("invalid repository URL format: {url}");
        }

        if path_segments[0].is_empty() || path_segments[1].is_empty() {
            bail!("invalid repository URL: empty owner or repo name: {url}");
        }

        Ok(Self::new(path_segments[0], path_segments[1]))
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
