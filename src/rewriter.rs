//! The date-rewrite procedure.
//!
//! A run walks a small state machine:
//!
//! ```text
//! Pending -> BackedUp -> BranchReset -> Replaying { index } -> Done
//!                                                           \-> Halted { index, .. }
//! ```
//!
//! The original history is preserved under a backup branch before anything
//! is touched. Commits are then replayed one by one onto a fresh orphan
//! branch with synthesized dates. The first commit that cannot be replayed
//! halts the run and leaves the partial branch in place for inspection.

use chrono::NaiveDateTime;
use rand::Rng;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{ConfigError, RewriteError, VcsError};
use crate::schedule::{CommitDateAssignment, DateRange, assign_dates};
use crate::vcs::{CommitId, Vcs};

/// Longest failure detail surfaced for a halted commit, in characters.
pub const DETAIL_LIMIT: usize = 200;

/// How many parents make a commit a merge for replay purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Only commits with more than two parents (octopus merges).
    ///
    /// Ordinary two-parent merges take the single-parent path and will
    /// usually fail to stage.
    #[default]
    Octopus,
    /// Any commit with two or more parents.
    AnyMerge,
}

impl MergePolicy {
    pub fn is_merge(self, parent_count: usize) -> bool {
        match self {
            MergePolicy::Octopus => parent_count > 2,
            MergePolicy::AnyMerge => parent_count >= 2,
        }
    }
}

impl FromStr for MergePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "octopus" => Ok(MergePolicy::Octopus),
            "any" => Ok(MergePolicy::AnyMerge),
            other => Err(ConfigError::UnknownMergePolicy {
                value: other.to_string(),
            }),
        }
    }
}

/// Immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub range: DateRange,
    /// Branch the rewritten history is built on.
    pub branch: String,
    /// Branch left pointing at the original tip.
    pub backup_branch: String,
    pub merge_policy: MergePolicy,
}

impl RunConfig {
    pub fn new(
        range: DateRange,
        branch: impl Into<String>,
        backup_branch: impl Into<String>,
        merge_policy: MergePolicy,
    ) -> Result<Self, ConfigError> {
        let branch = branch.into().trim().to_string();
        let backup_branch = backup_branch.into().trim().to_string();

        if branch.is_empty() {
            return Err(ConfigError::EmptyBranch {
                which: "the replay branch",
            });
        }
        if backup_branch.is_empty() {
            return Err(ConfigError::EmptyBranch {
                which: "the backup branch",
            });
        }
        if branch == backup_branch {
            return Err(ConfigError::BranchClash { name: branch });
        }

        Ok(RunConfig {
            range,
            branch,
            backup_branch,
            merge_policy,
        })
    }
}

/// Where a run currently stands.
///
/// Indexes are 1-based positions in the original commit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Pending,
    BackedUp,
    BranchReset,
    Replaying {
        index: usize,
    },
    Done,
    Halted {
        index: usize,
        commit: CommitId,
        reason: String,
    },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Halted { .. })
    }
}

/// How a commit ended up on the replay branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    Normal,
    /// Replayed against its first parent only.
    Merge,
    /// Nothing changed relative to the parent; committed with `--allow-empty`.
    Empty,
}

/// A commit that was successfully finalized on the replay branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedCommit {
    pub index: usize,
    pub total: usize,
    pub commit: CommitId,
    pub timestamp: NaiveDateTime,
    pub kind: CommitKind,
}

/// Outcome of [`DateRewriter::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub state: RunState,
    pub replayed: Vec<ReplayedCommit>,
    pub assignment: CommitDateAssignment,
}

impl RunReport {
    pub fn completed(&self) -> bool {
        self.state == RunState::Done
    }
}

/// Cuts `detail` down to at most `limit` characters.
pub fn truncate_detail(detail: &str, limit: usize) -> String {
    match detail.char_indices().nth(limit) {
        Some((i, _)) => detail[..i].to_string(),
        None => detail.to_string(),
    }
}

/// Drives one rewrite against a [`Vcs`].
pub struct DateRewriter<'a, V: Vcs> {
    vcs: &'a mut V,
    config: &'a RunConfig,
    state: RunState,
}

impl<'a, V: Vcs> DateRewriter<'a, V> {
    pub fn new(vcs: &'a mut V, config: &'a RunConfig) -> Self {
        DateRewriter {
            vcs,
            config,
            state: RunState::Pending,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }

    /// Lists the history to rewrite, oldest first.
    ///
    /// # Errors
    ///
    /// [`RewriteError::RepositoryAccess`] if the history cannot be listed or
    /// is empty. Nothing has been modified at that point.
    pub fn enumerate(&mut self) -> Result<Vec<CommitId>, RewriteError> {
        let commits = self
            .vcs
            .enumerate_history()
            .map_err(|e| RewriteError::RepositoryAccess(e.to_string()))?;
        if commits.is_empty() {
            return Err(RewriteError::RepositoryAccess(String::from(
                "repository has no commits",
            )));
        }
        Ok(commits)
    }

    /// Backs up the current tip and checks out an empty replay branch.
    ///
    /// # Errors
    ///
    /// [`RewriteError::OnReplayBranch`] when `HEAD` is on the replay branch,
    /// e.g. after an earlier run. Nothing is modified in that case, so the
    /// existing backup keeps pointing at the original tip.
    pub fn prepare(&mut self) -> Result<(), RewriteError> {
        let current = self
            .vcs
            .current_branch()
            .map_err(|source| RewriteError::Setup {
                step: "reading the current branch",
                source,
            })?;
        if current.as_deref() == Some(self.config.branch.as_str()) {
            return Err(RewriteError::OnReplayBranch {
                branch: self.config.branch.clone(),
            });
        }

        let backup = self.config.backup_branch.clone();
        self.vcs
            .create_backup(&backup)
            .map_err(|source| RewriteError::Setup {
                step: "creating the backup branch",
                source,
            })?;
        self.transition(RunState::BackedUp);

        let branch = self.config.branch.clone();
        self.vcs
            .create_branch(&branch)
            .map_err(|source| RewriteError::Setup {
                step: "creating the replay branch",
                source,
            })?;
        self.vcs.reset_hard().map_err(|source| RewriteError::Setup {
            step: "resetting the replay branch",
            source,
        })?;
        self.transition(RunState::BranchReset);
        Ok(())
    }

    /// Replays every commit in order, stopping at the first failure.
    ///
    /// `on_commit` is called after each commit is finalized, so callers can
    /// stream progress. The returned report's state is always terminal.
    pub fn replay<F>(
        &mut self,
        commits: &[CommitId],
        assignment: CommitDateAssignment,
        mut on_commit: F,
    ) -> RunReport
    where
        F: FnMut(&ReplayedCommit),
    {
        let total = commits.len();
        let mut replayed = Vec::with_capacity(total);

        for (i, commit) in commits.iter().enumerate() {
            let index = i + 1;
            self.transition(RunState::Replaying { index });

            let Some(timestamp) = assignment.get(i) else {
                self.halt(index, commit, "no date was assigned to this commit");
                break;
            };

            match self.replay_one(commit, timestamp) {
                Ok(kind) => {
                    let done = ReplayedCommit {
                        index,
                        total,
                        commit: commit.clone(),
                        timestamp,
                        kind,
                    };
                    on_commit(&done);
                    replayed.push(done);
                }
                Err(e) => {
                    self.halt(index, commit, &e.detail());
                    break;
                }
            }
        }

        if !self.state.is_terminal() {
            self.transition(RunState::Done);
        }

        RunReport {
            state: self.state.clone(),
            replayed,
            assignment,
        }
    }

    fn halt(&mut self, index: usize, commit: &CommitId, detail: &str) {
        let reason = truncate_detail(detail, DETAIL_LIMIT);
        warn!(index, commit = %commit, %reason, "replay halted");
        self.transition(RunState::Halted {
            index,
            commit: commit.clone(),
            reason,
        });
    }

    fn replay_one(
        &mut self,
        commit: &CommitId,
        timestamp: NaiveDateTime,
    ) -> Result<CommitKind, VcsError> {
        let parents = self.vcs.parents(commit)?;
        let is_merge = self.config.merge_policy.is_merge(parents.len());

        self.vcs.stage_commit_content(commit, is_merge)?;

        match self.vcs.finalize_commit(commit, timestamp, false) {
            Ok(()) if is_merge => Ok(CommitKind::Merge),
            Ok(()) => Ok(CommitKind::Normal),
            Err(VcsError::NothingToCommit) => {
                debug!(commit = %commit, "nothing staged, committing empty");
                self.vcs.finalize_commit(commit, timestamp, true)?;
                Ok(CommitKind::Empty)
            }
            Err(e) => Err(e),
        }
    }

    /// Enumerates, assigns dates, prepares branches and replays.
    ///
    /// Returns `Err` only for failures before replay starts; a failure on an
    /// individual commit is reported through [`RunState::Halted`].
    pub fn run<R, F>(&mut self, rng: &mut R, on_commit: F) -> Result<RunReport, RewriteError>
    where
        R: Rng,
        F: FnMut(&ReplayedCommit),
    {
        let commits = self.enumerate()?;
        let assignment = assign_dates(commits.len(), &self.config.range, rng);
        self.prepare()?;
        Ok(self.replay(&commits, assignment, on_commit))
    }
}
