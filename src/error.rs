use thiserror::Error;

/// Failures reported by a [`Vcs`](crate::vcs::Vcs) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VcsError {
    /// The version-control executable could not be started.
    #[error("failed to run `{command}`: {detail}")]
    Spawn { command: String, detail: String },

    /// The command ran but exited non-zero.
    #[error("`{command}` failed: {detail}")]
    Failed { command: String, detail: String },

    /// Finalisation found nothing staged.
    #[error("nothing to commit")]
    NothingToCommit,

    /// The command succeeded but printed something we could not interpret.
    #[error("unexpected output from `{command}`: {detail}")]
    Parse { command: String, detail: String },
}

impl VcsError {
    /// Human-readable detail without the command prefix.
    pub fn detail(&self) -> String {
        match self {
            VcsError::Spawn { detail, .. }
            | VcsError::Failed { detail, .. }
            | VcsError::Parse { detail, .. } => detail.clone(),
            VcsError::NothingToCommit => String::from("nothing to commit"),
        }
    }
}

/// Invalid run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid date `{value}` (expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)")]
    InvalidDate { value: String },

    #[error("start date {start} is not before end date {end}")]
    EmptyRange { start: String, end: String },

    #[error("branch name for {which} must not be empty")]
    EmptyBranch { which: &'static str },

    #[error("replay branch and backup branch are both `{name}`")]
    BranchClash { name: String },

    #[error("unknown merge policy `{value}` (expected `octopus` or `any`)")]
    UnknownMergePolicy { value: String },
}

/// Fatal errors that stop a run before replay begins.
///
/// A failure while replaying an individual commit is not an error: it ends
/// the run in [`RunState::Halted`](crate::rewriter::RunState::Halted).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("cannot read repository history: {0}")]
    RepositoryAccess(String),

    /// `HEAD` is already on the replay branch, so its tip is not the history
    /// to back up.
    #[error("`{branch}` is checked out; switch back to the original branch before rewriting")]
    OnReplayBranch { branch: String },

    #[error("{step} failed: {source}")]
    Setup {
        step: &'static str,
        #[source]
        source: VcsError,
    },
}
