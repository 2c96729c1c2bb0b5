//! Git repository operations.

use anyhow::{Context, Result};
use git2::Repository;

/// Git repository wrapper.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Opens the repository at the current directory.
    pub fn open() -> Result<Self> {
        let repo = Repository::open(".").context("Not in a git repository")?;

        Ok(Self { repo })
    }

    /// Opens the repository at the specified path.
    pub fn open_at<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let repo = Repository::open(path).context("Failed to open git repository")?;

        Ok(Self { repo })
    }

    /// Collects `"<short-hash> <summary>"` log lines for a commit range.
    ///
    /// Walks from `to` back to `from` (exclusive) when given, otherwise the
    /// full history reachable from `to`. Lines come back newest first, the
    /// order `git log` emits; merge commits are skipped.
    pub fn log_text(&self, from: Option<&str>, to: &str) -> Result<String> {
        let end_obj = self
            .repo
            .revparse_single(to)
            .with_context(|| format!("Failed to parse commit: {to}"))?;
        let end_commit = end_obj
            .peel_to_commit()
            .context("Failed to peel end object to commit")?;

        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .push(end_commit.id())
            .context("Failed to push end commit")?;

        if let Some(from) = from {
            let start_obj = self
                .repo
                .revparse_single(from)
                .with_context(|| format!("Failed to parse commit: {from}"))?;
            let start_commit = start_obj
                .peel_to_commit()
                .context("Failed to peel start object to commit")?;
            walker
                .hide(start_commit.id())
                .context("Failed to hide start commit")?;
        }

        let mut lines = Vec::new();
        for oid in walker {
            let oid = oid.context("Failed to get commit OID from walker")?;
            let commit = self
                .repo
                .find_commit(oid)
                .context("Failed to find commit")?;

            // Skip merge commits
            if commit.parent_count() > 1 {
                continue;
            }

            let mut short = oid.to_string();
            short.truncate(7);
            lines.push(format!("{short} {}", commit.summary().unwrap_or("")));
        }

        Ok(lines.join("\n"))
    }
}
