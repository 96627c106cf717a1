//! Run configuration: command-line flags over git config over built-ins.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::ConfigError;
use crate::git::GitCli;
use crate::rewriter::{MergePolicy, RunConfig};
use crate::schedule::DateRange;

pub const DEFAULT_START: &str = "2025-08-26 09:00:00";
pub const DEFAULT_END: &str = "2025-11-13 23:59:00";
pub const DEFAULT_BRANCH: &str = "temp-branch";
pub const DEFAULT_BACKUP_BRANCH: &str = "backup-before-date-change";

pub const KEY_START: &str = "backdate.start";
pub const KEY_END: &str = "backdate.end";
pub const KEY_BRANCH: &str = "backdate.branch";
pub const KEY_BACKUP_BRANCH: &str = "backdate.backupBranch";
pub const KEY_MERGE_POLICY: &str = "backdate.mergePolicy";

/// Which end of the range a bare date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

impl Bound {
    /// Hour and minute implied by a date without a time.
    fn default_time(self) -> (u32, u32) {
        match self {
            Bound::Start => (9, 0),
            Bound::End => (23, 59),
        }
    }
}

/// Parses `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM`
/// or a bare `YYYY-MM-DD`.
pub fn parse_date(value: &str, bound: Bound) -> Result<NaiveDateTime, ConfigError> {
    let value = value.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(t);
        }
    }
    let (hour, minute) = bound.default_time();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| ConfigError::InvalidDate {
            value: value.to_string(),
        })
}

/// A lookup for persisted settings.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

impl ConfigSource for GitCli {
    fn get(&self, key: &str) -> Option<String> {
        self.config_get(key)
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub start: Option<String>,
    pub end: Option<String>,
    pub branch: Option<String>,
    pub backup_branch: Option<String>,
    pub merge_policy: Option<String>,
}

fn pick<S: ConfigSource + ?Sized>(
    flag: &Option<String>,
    source: &S,
    key: &str,
    default: &str,
) -> String {
    flag.clone()
        .or_else(|| source.get(key))
        .unwrap_or_else(|| default.to_string())
}

/// Builds the run configuration, taking each value from the first of: the
/// command-line flag, the git config key, the built-in default.
pub fn resolve<S: ConfigSource + ?Sized>(
    overrides: &Overrides,
    source: &S,
) -> Result<RunConfig, ConfigError> {
    let start = parse_date(
        &pick(&overrides.start, source, KEY_START, DEFAULT_START),
        Bound::Start,
    )?;
    let end = parse_date(
        &pick(&overrides.end, source, KEY_END, DEFAULT_END),
        Bound::End,
    )?;
    let policy: MergePolicy = pick(&overrides.merge_policy, source, KEY_MERGE_POLICY, "octopus")
        .parse()?;

    RunConfig::new(
        DateRange::new(start, end)?,
        pick(&overrides.branch, source, KEY_BRANCH, DEFAULT_BRANCH),
        pick(
            &overrides.backup_branch,
            source,
            KEY_BACKUP_BRANCH,
            DEFAULT_BACKUP_BRANCH,
        ),
        policy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource(HashMap<&'static str, &'static str>);

    impl ConfigSource for MapSource {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    fn empty() -> MapSource {
        MapSource(HashMap::new())
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn parses_full_timestamps() {
        assert_eq!(
            parse_date("2025-08-26 10:11:12", Bound::Start).unwrap(),
            dt("2025-08-26 10:11:12")
        );
        assert_eq!(
            parse_date("2025-08-26T10:11:12", Bound::End).unwrap(),
            dt("2025-08-26 10:11:12")
        );
        assert_eq!(
            parse_date(" 2025-08-26 10:11 ", Bound::End).unwrap(),
            dt("2025-08-26 10:11:00")
        );
    }

    #[test]
    fn bare_dates_get_bound_specific_times() {
        assert_eq!(
            parse_date("2025-08-26", Bound::Start).unwrap(),
            dt("2025-08-26 09:00:00")
        );
        assert_eq!(
            parse_date("2025-11-13", Bound::End).unwrap(),
            dt("2025-11-13 23:59:00")
        );
    }

    #[test]
    fn rejects_garbage_dates() {
        let r = parse_date("next tuesday", Bound::Start);
        assert_eq!(
            r,
            Err(ConfigError::InvalidDate {
                value: String::from("next tuesday")
            })
        );
        assert!(parse_date("2025-02-30", Bound::Start).is_err());
    }

    #[test]
    fn defaults_match_built_in_constants() {
        let cfg = resolve(&Overrides::default(), &empty()).unwrap();
        assert_eq!(cfg.range.start(), dt("2025-08-26 09:00:00"));
        assert_eq!(cfg.range.end(), dt("2025-11-13 23:59:00"));
        assert_eq!(cfg.branch, "temp-branch");
        assert_eq!(cfg.backup_branch, "backup-before-date-change");
        assert_eq!(cfg.merge_policy, MergePolicy::Octopus);
    }

    #[test]
    fn git_config_overrides_defaults() {
        let source = MapSource(HashMap::from([
            (KEY_START, "2024-01-01"),
            (KEY_BRANCH, "rewritten"),
            (KEY_MERGE_POLICY, "any"),
        ]));
        let cfg = resolve(&Overrides::default(), &source).unwrap();
        assert_eq!(cfg.range.start(), dt("2024-01-01 09:00:00"));
        assert_eq!(cfg.branch, "rewritten");
        assert_eq!(cfg.merge_policy, MergePolicy::AnyMerge);
    }

    #[test]
    fn flags_override_git_config() {
        let source = MapSource(HashMap::from([(KEY_BRANCH, "from-config")]));
        let overrides = Overrides {
            branch: Some(String::from("from-flag")),
            end: Some(String::from("2025-12-01")),
            ..Overrides::default()
        };
        let cfg = resolve(&overrides, &source).unwrap();
        assert_eq!(cfg.branch, "from-flag");
        assert_eq!(cfg.range.end(), dt("2025-12-01 23:59:00"));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let overrides = Overrides {
            start: Some(String::from("2025-12-01")),
            end: Some(String::from("2025-01-01")),
            ..Overrides::default()
        };
        let r = resolve(&overrides, &empty());
        assert!(matches!(r, Err(ConfigError::EmptyRange { .. })));
    }

    #[test]
    fn bad_merge_policy_in_config_is_reported() {
        let source = MapSource(HashMap::from([(KEY_MERGE_POLICY, "sometimes")]));
        let r = resolve(&Overrides::default(), &source);
        assert!(matches!(r, Err(ConfigError::UnknownMergePolicy { .. })));
    }
}
