//! The narrow slice of a version-control system the rewriter depends on.
//!
//! [`DateRewriter`](crate::rewriter::DateRewriter) only ever talks to the
//! repository through [`Vcs`], so the date and replay logic can be exercised
//! against an in-memory fake. [`GitCli`](crate::git::GitCli) is the real
//! implementation.

use chrono::NaiveDateTime;
use std::fmt;

use crate::error::VcsError;

/// Content hash identifying an existing commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        CommitId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capabilities needed to enumerate and replay history.
///
/// Implementations are driven strictly sequentially; every call blocks until
/// the underlying operation has finished.
pub trait Vcs {
    /// Every commit reachable from the current tip, oldest first.
    fn enumerate_history(&mut self) -> Result<Vec<CommitId>, VcsError>;

    /// Parents of `commit` as recorded in the original history.
    fn parents(&mut self, commit: &CommitId) -> Result<Vec<CommitId>, VcsError>;

    /// Name of the checked-out branch, or `None` when `HEAD` is detached.
    fn current_branch(&mut self) -> Result<Option<String>, VcsError>;

    /// Points `name` at the current tip, overwriting any existing branch.
    fn create_backup(&mut self, name: &str) -> Result<(), VcsError>;

    /// Replaces any existing `name` with a fresh orphan branch and checks it out.
    fn create_branch(&mut self, name: &str) -> Result<(), VcsError>;

    /// Discards index and working-tree state carried over from the previous branch.
    fn reset_hard(&mut self) -> Result<(), VcsError>;

    /// Stages the changes `commit` introduced without committing them.
    ///
    /// With `first_parent_only` the diff is taken against the first parent
    /// and content contributed by other parents is dropped.
    fn stage_commit_content(
        &mut self,
        commit: &CommitId,
        first_parent_only: bool,
    ) -> Result<(), VcsError>;

    /// Commits the staged content reusing `commit`'s author and message, with
    /// author and committer dates both set to `date`.
    ///
    /// Returns [`VcsError::NothingToCommit`] when nothing is staged and
    /// `allow_empty` is false.
    fn finalize_commit(
        &mut self,
        commit: &CommitId,
        date: NaiveDateTime,
        allow_empty: bool,
    ) -> Result<(), VcsError>;
}

#[cfg(test)]
mod tests {
    use super::CommitId;

    #[test]
    fn displays_full_id() {
        let id = CommitId::new("0123456789abcdef");
        assert_eq!(id.to_string(), "0123456789abcdef");
        assert_eq!(id.as_str(), "0123456789abcdef");
    }
}
