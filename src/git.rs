use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::error::VcsError;
use crate::vcs::{CommitId, Vcs};

/// Date layout passed to `git commit --date` and the `GIT_*_DATE` variables.
pub const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a timestamp the way git expects it for an offset-less local date.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use git_backdate::git::format_git_date;
///
/// let t = NaiveDate::from_ymd_opt(2025, 8, 26).unwrap().and_hms_opt(9, 5, 0).unwrap();
/// assert_eq!(format_git_date(t), "2025-08-26 09:05:00");
/// ```
pub fn format_git_date(t: NaiveDateTime) -> String {
    t.format(GIT_DATE_FORMAT).to_string()
}

/// Renders a command as `git arg1 arg2 ...` for messages and logs.
fn describe(cmd: &Command) -> String {
    let mut s = cmd.get_program().to_string_lossy().into_owned();
    for arg in cmd.get_args() {
        s.push(' ');
        s.push_str(&arg.to_string_lossy());
    }
    s
}

/// Picks the most useful text from a failed command's output.
///
/// Standard error is preferred; standard output is the fallback because some
/// git commands (notably `commit`) report problems there.
pub(crate) fn failure_detail(stdout: &[u8], stderr: &[u8]) -> String {
    let err = String::from_utf8_lossy(stderr).trim().to_string();
    if !err.is_empty() {
        return err;
    }
    let out = String::from_utf8_lossy(stdout).trim().to_string();
    if !out.is_empty() {
        return out;
    }
    String::from("unknown error")
}

/// Runs a command and returns only whether it succeeded.
///
/// # Returns
///
/// * `Ok(())` if the command exited with status `0`.
/// * `Err(VcsError::Failed)` carrying the captured output otherwise.
/// * `Err(VcsError::Spawn)` if the process could not be started.
fn run_status(mut cmd: Command) -> Result<(), VcsError> {
    run_output(&mut cmd).map(|_| ())
}

/// Runs a command and returns its trimmed standard output on success.
///
/// Both streams are captured. On a non-zero exit the error carries the
/// trimmed standard error, falling back to standard output.
fn run_output(cmd: &mut Command) -> Result<String, VcsError> {
    let command = describe(cmd);
    debug!(%command, "running git");

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    match cmd.output() {
        Ok(out) => {
            if out.status.success() {
                Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
            } else {
                let detail = failure_detail(&out.stdout, &out.stderr);
                debug!(%command, status = ?out.status.code(), %detail, "git failed");
                Err(VcsError::Failed { command, detail })
            }
        }
        Err(e) => Err(VcsError::Spawn {
            command,
            detail: e.to_string(),
        }),
    }
}

/// Splits `git rev-list` output into commit ids, one per line.
pub(crate) fn parse_rev_list(out: &str) -> Vec<CommitId> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(CommitId::new)
        .collect()
}

/// Parses one line of `git rev-list --parents -n 1 <commit>`.
///
/// The line starts with the commit itself followed by its parents; only the
/// parents are returned.
pub(crate) fn parse_parent_line(line: &str, commit: &CommitId) -> Result<Vec<CommitId>, VcsError> {
    let mut fields = line.split_whitespace();
    match fields.next() {
        Some(first) if commit.as_str().starts_with(first) || first.starts_with(commit.as_str()) => {
            Ok(fields.map(CommitId::new).collect())
        }
        _ => Err(VcsError::Parse {
            command: format!("git rev-list --parents -n 1 {commit}"),
            detail: format!("expected a line starting with the commit, got `{line}`"),
        }),
    }
}

/// [`Vcs`] backed by the `git` command line, run inside one working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        GitCli {
            workdir: workdir.into(),
        }
    }

    /// A `git` command rooted at the working directory.
    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.workdir);
        cmd
    }

    /// Runs `git rev-parse <flag>` and returns its output.
    ///
    /// Used to locate the repository root (`--show-toplevel`).
    pub fn rev_parse(&self, flag: &str) -> Result<String, VcsError> {
        let mut cmd = self.git();
        cmd.arg("rev-parse").arg(flag);
        run_output(&mut cmd)
    }

    /// Runs `git config --get <key>`.
    ///
    /// Missing keys, empty values and failures all come back as `None`; the
    /// caller falls through to its next configuration source.
    pub fn config_get(&self, key: &str) -> Option<String> {
        let mut cmd = self.git();
        cmd.arg("config").arg("--get").arg(key);
        match run_output(&mut cmd) {
            Ok(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// True when the index matches `HEAD` (or is empty on an unborn branch).
    fn index_is_clean(&self) -> bool {
        let mut cmd = self.git();
        cmd.arg("diff").arg("--cached").arg("--quiet");
        run_status(cmd).is_ok()
    }
}

impl Vcs for GitCli {
    fn enumerate_history(&mut self) -> Result<Vec<CommitId>, VcsError> {
        let mut cmd = self.git();
        cmd.arg("rev-list").arg("--reverse").arg("HEAD");
        run_output(&mut cmd).map(|out| parse_rev_list(&out))
    }

    fn parents(&mut self, commit: &CommitId) -> Result<Vec<CommitId>, VcsError> {
        let mut cmd = self.git();
        cmd.arg("rev-list")
            .arg("--parents")
            .arg("-n")
            .arg("1")
            .arg(commit.as_str());
        let out = run_output(&mut cmd)?;
        parse_parent_line(&out, commit)
    }

    fn current_branch(&mut self) -> Result<Option<String>, VcsError> {
        let mut cmd = self.git();
        cmd.arg("symbolic-ref").arg("--quiet").arg("--short").arg("HEAD");
        match run_output(&mut cmd) {
            Ok(name) if !name.is_empty() => Ok(Some(name)),
            Ok(_) => Ok(None),
            // Exits non-zero when HEAD is detached.
            Err(VcsError::Failed { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_backup(&mut self, name: &str) -> Result<(), VcsError> {
        let mut cmd = self.git();
        cmd.arg("branch").arg("-f").arg(name).arg("HEAD");
        run_status(cmd)
    }

    fn create_branch(&mut self, name: &str) -> Result<(), VcsError> {
        // A leftover branch from an earlier run is discarded; absence is fine.
        let mut delete = self.git();
        delete.arg("branch").arg("-D").arg(name);
        if let Err(e) = run_status(delete) {
            debug!(branch = name, error = %e, "no previous replay branch removed");
        }

        let mut cmd = self.git();
        cmd.arg("checkout").arg("--orphan").arg(name);
        run_status(cmd)
    }

    fn reset_hard(&mut self) -> Result<(), VcsError> {
        let mut cmd = self.git();
        cmd.arg("reset").arg("--hard");
        run_status(cmd)
    }

    fn stage_commit_content(
        &mut self,
        commit: &CommitId,
        first_parent_only: bool,
    ) -> Result<(), VcsError> {
        let mut cmd = self.git();
        cmd.arg("cherry-pick");
        if first_parent_only {
            cmd.arg("-m").arg("1");
        }
        cmd.arg("-n").arg(commit.as_str());
        run_status(cmd)
    }

    fn finalize_commit(
        &mut self,
        commit: &CommitId,
        date: NaiveDateTime,
        allow_empty: bool,
    ) -> Result<(), VcsError> {
        let date = format_git_date(date);

        let mut cmd = self.git();
        cmd.arg("commit");
        if allow_empty {
            cmd.arg("--allow-empty");
        }
        cmd.arg("-C")
            .arg(commit.as_str())
            .arg("--date")
            .arg(&date)
            .env("GIT_AUTHOR_DATE", &date)
            .env("GIT_COMMITTER_DATE", &date);

        match run_status(cmd) {
            Ok(()) => Ok(()),
            Err(VcsError::Failed { .. }) if !allow_empty && self.index_is_clean() => {
                Err(VcsError::NothingToCommit)
            }
            Err(e) => Err(e),
        }
    }
}
