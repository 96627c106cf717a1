use crate::{
    banner::print_banner,
    config::{self, Overrides},
    git::{GitCli, format_git_date},
    prompt::{self, AssumeYes, ConfirmPrompter, DialoguerConfirmPrompter},
    rewriter::{CommitKind, DateRewriter, ReplayedCommit, RunConfig, RunReport, RunState},
    schedule::assign_dates,
};

use clap::Parser;
use console::style;
use rand::{SeedableRng, rngs::StdRng};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the `tracing` filter directive.
const LOG_ENV: &str = "GIT_BACKDATE_LOG";

/// Rewrite commit dates across a date range onto a fresh branch.
///
/// The current history is kept under a backup branch; every commit is
/// replayed onto an orphan branch with a new, monotonically increasing date.
#[derive(Parser, Debug)]
#[command(name = "git-backdate", version)]
pub struct Args {
    /// First date of the range (YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS").
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// Last date of the range (YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS").
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,

    /// Branch the rewritten history is built on.
    #[arg(long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Branch that keeps the original history.
    #[arg(long, value_name = "NAME")]
    pub backup_branch: Option<String>,

    /// Which commits replay against their first parent only: `octopus` or `any`.
    #[arg(long, value_name = "POLICY")]
    pub merge_policy: Option<String>,

    /// Seed for the date jitter, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not ask for confirmation.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Run as if started in DIR.
    #[arg(short = 'C', value_name = "DIR")]
    pub repo: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            start: self.start.clone(),
            end: self.end.clone(),
            branch: self.branch.clone(),
            backup_branch: self.backup_branch.clone(),
            merge_policy: self.merge_policy.clone(),
        }
    }
}

/// Installs the stderr `tracing` subscriber, filtered by `GIT_BACKDATE_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Verifies git is available and opens the repository containing `dir`.
fn verify_environment(dir: PathBuf) -> Result<GitCli, ()> {
    if which::which("git").is_err() {
        eprintln!("{}", style("Error: `git` not found in PATH.").red().bold());
        return Err(());
    }

    match GitCli::new(dir).rev_parse("--show-toplevel") {
        Ok(root) => Ok(GitCli::new(root)),
        Err(e) => {
            eprintln!(
                "{}",
                style(format!("Error: not inside a git repo ({})", e.detail()))
                    .red()
                    .bold()
            );
            Err(())
        }
    }
}

/// Text of the per-commit progress line.
pub(crate) fn progress_text(done: &ReplayedCommit) -> String {
    let label = match done.kind {
        CommitKind::Normal => "",
        CommitKind::Merge => " (merge)",
        CommitKind::Empty => " (empty)",
    };
    format!(
        "✓ Commit {}/{}: {}{}",
        done.index,
        done.total,
        format_git_date(done.timestamp),
        label
    )
}

/// Closing instructions. The follow-up commands are printed, never run.
pub(crate) fn summary_lines(report: &RunReport, config: &RunConfig) -> Vec<String> {
    let rule = "=".repeat(60);
    let mut lines = vec![String::new(), rule.clone()];

    match &report.state {
        RunState::Done => {
            lines.push(format!(
                "Done! {} commits rewritten on `{}`.",
                report.replayed.len(),
                config.branch
            ));
        }
        RunState::Halted { index, .. } => {
            lines.push(format!(
                "Stopped at commit {index}; `{}` holds the {} commits replayed so far.",
                config.branch,
                report.replayed.len()
            ));
            lines.push(format!(
                "The original history is untouched on `{}`.",
                config.backup_branch
            ));
        }
        other => lines.push(format!("Run ended in state {other:?}.")),
    }

    lines.push(String::from(
        "Review with: git log --pretty=format:'%h %ad | %s' --date=short",
    ));
    lines.push(String::from("If satisfied, run:"));
    lines.push(String::from("  git branch -M main"));
    lines.push(String::from("  git push -f origin main"));
    lines.push(rule);
    lines
}

/// Main CLI entry point for `git-backdate`.
///
/// This function:
/// 1. Parses flags.
/// 2. Verifies that `git` is installed and locates the repository.
/// 3. Resolves the run configuration (flags, then `backdate.*` git config, then built-ins).
/// 4. Lists the history to rewrite.
/// 5. Shows the banner and asks for confirmation (unless `--yes`).
/// 6. Backs up the tip, creates the orphan branch and replays every commit.
/// 7. Prints the follow-up instructions.
///
/// # Exit Codes
///
/// * `0` – The run finished, halted mid-replay, or was declined at the prompt.
///   A halt is reported on the console only.
/// * `1` – Environment, configuration, repository or branch-setup failure.
pub fn entry() -> Result<i32, ()> {
    run(Args::parse())
}

/// Runs the tool with already-parsed arguments.
pub fn run(args: Args) -> Result<i32, ()> {
    init_tracing();

    let dir = args.repo.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut git = verify_environment(dir)?;

    let config = match config::resolve(&args.overrides(), &git) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", style(format!("Error: {}", e)).red().bold());
            return Err(());
        }
    };
    debug!(?config, "resolved configuration");

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut rewriter = DateRewriter::new(&mut git, &config);

    let commits = match rewriter.enumerate() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", style(format!("Error: {}", e)).red().bold());
            return Err(());
        }
    };

    print_banner(&config, commits.len());

    let mut prompter: Box<dyn ConfirmPrompter> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(DialoguerConfirmPrompter)
    };
    match prompt::confirm_start(prompter.as_mut(), commits.len(), &config.branch) {
        Ok(true) => {}
        Ok(false) => {
            println!(
                "{}",
                style("Canceled by user. No changes made.").yellow().bold()
            );
            return Ok(0);
        }
        Err(e) => {
            eprintln!("{}", style(format!("Prompt error: {}", e)).red().bold());
            return Err(());
        }
    }

    let assignment = assign_dates(commits.len(), &config.range, &mut rng);

    if let Err(e) = rewriter.prepare() {
        eprintln!("{}", style(format!("❌ {}", e)).red().bold());
        return Err(());
    }
    println!(
        "{}",
        style(format!("Created backup branch: {}", config.backup_branch)).green()
    );
    println!();

    let report = rewriter.replay(&commits, assignment, |done| {
        println!("{}", style(progress_text(done)).green());
    });

    if let RunState::Halted { index, reason, .. } = &report.state {
        eprintln!("{}", style(format!("✗ Error on commit {index}")).red().bold());
        eprintln!("   {}", style(reason).red());
    }

    for line in summary_lines(&report, &config) {
        println!("{line}");
    }

    Ok(0)
}
