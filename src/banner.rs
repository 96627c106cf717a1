use console::{measure_text_width, style};
use std::iter;

use crate::git::format_git_date;
use crate::rewriter::{MergePolicy, RunConfig};

/// Prints a colorized, boxed summary of the run about to start.
///
/// The box is sized to the widest **visible** line using
/// [`console::measure_text_width`], so styled content does not throw off the
/// padding. Borders are styled separately from the content.
///
/// # Examples
///
/// ```no_run
/// use chrono::NaiveDate;
/// use git_backdate::banner::print_banner;
/// use git_backdate::rewriter::{MergePolicy, RunConfig};
/// use git_backdate::schedule::DateRange;
///
/// let start = NaiveDate::from_ymd_opt(2025, 8, 26).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let end = NaiveDate::from_ymd_opt(2025, 11, 13).unwrap().and_hms_opt(23, 59, 0).unwrap();
/// let range = DateRange::new(start, end).unwrap();
/// let cfg = RunConfig::new(range, "temp-branch", "backup", MergePolicy::Octopus).unwrap();
/// print_banner(&cfg, 12);
/// ```
pub fn print_banner(config: &RunConfig, commit_count: usize) {
    let lines = banner_lines(config, commit_count);

    let max_width = lines
        .iter()
        .map(|l| measure_text_width(l))
        .max()
        .unwrap_or(0)
        + 2;

    let border = "═".repeat(max_width);
    let top = style(format!("╔{}╗", border)).blue().bold();
    let bottom = style(format!("╚{}╝", border)).blue().bold();
    let left = style("║ ").blue().bold().to_string();
    let right = style("║").blue().bold().to_string();

    println!();
    println!("{top}");
    for line in lines {
        let visible = measure_text_width(&line);
        let pad = max_width - visible;
        println!("{}{}{}{}", left, line, " ".repeat(pad - 1), right);
    }
    println!("{bottom}");
    println!();
}

/// Lines of the pre-run banner, some carrying ANSI styling.
///
/// Order: title, range summary, branch plan, merge-policy note.
fn banner_lines(config: &RunConfig, commit_count: usize) -> Vec<String> {
    let top = ["Rewrite commit dates onto a fresh branch", ""]
        .into_iter()
        .map(|s| s.to_string());

    let range = [
        format!("Commits to rewrite: {commit_count}"),
        format!(
            "Date range: {} to {} ({} days)",
            format_git_date(config.range.start()),
            format_git_date(config.range.end()),
            config.range.span_days()
        ),
    ]
    .into_iter();

    let plan = iter::once(String::new()).chain([
        format!(
            "  1) Back up the current tip as `{}`",
            config.backup_branch
        ),
        format!(
            "  2) Replay every commit onto orphan branch `{}`",
            config.branch
        ),
        String::from("  3) Stop at the first commit that cannot be replayed"),
    ]);

    let policy = match config.merge_policy {
        MergePolicy::Octopus => style("Merges: only octopus merges replay against their first parent.")
            .yellow()
            .to_string(),
        MergePolicy::AnyMerge => style("Merges: every merge replays against its first parent.")
            .cyan()
            .to_string(),
    };

    top.chain(range)
        .chain(plan)
        .chain(iter::once(String::new()))
        .chain(iter::once(policy))
        .collect()
}
