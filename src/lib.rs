//! # git-backdate
//!
//! A CLI tool to spread the dates of an existing Git history across a chosen
//! date range.
//!
//! This crate provides functionality to:
//! - Back up the current tip under a separate branch
//! - Synthesize sorted, lightly jittered dates for every commit
//! - Replay each commit onto a fresh orphan branch with its new date
//! - Stop at the first commit that cannot be replayed, leaving the partial
//!   branch for inspection
//!
//! ## Usage
//!
//! ```bash
//! # Rewrite onto `temp-branch` using the configured or built-in range
//! git-backdate
//!
//! # Explicit range, reproducible jitter, no prompt
//! git-backdate --start 2025-08-26 --end 2025-11-13 --seed 7 --yes
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface and main entry point
//! - [`config`] - Flag / git config / built-in configuration layering
//! - [`rewriter`] - Backup, orphan branch and replay state machine
//! - [`schedule`] - Date assignment
//! - [`vcs`] - Version-control capability trait
//! - [`git`] - `git` command-line implementation of [`vcs::Vcs`]
//! - [`prompt`] - Confirmation prompt abstraction
//! - [`banner`] - Pre-run summary banner
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod prompt;
pub mod rewriter;
pub mod schedule;
pub mod vcs;
