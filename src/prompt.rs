use dialoguer::{Confirm, theme::ColorfulTheme};

/// Abstraction over a boolean (yes/no) confirmation prompt.
///
/// This trait allows interactive confirmation to be injected or mocked,
/// keeping the CLI flow testable.
pub trait ConfirmPrompter {
    /// Prompt the user for a yes/no confirmation.
    ///
    /// # Parameters
    /// - `prompt`: The confirmation message.
    /// - `default`: The default answer if the user presses Enter.
    ///
    /// # Returns
    /// `Ok(true)` if confirmed, `Ok(false)` if declined, or `Err(String)` on input failure.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String>;
}

/// Default implementation of `ConfirmPrompter` using `dialoguer::Confirm`.
///
/// Displays a yes/no dialog with styling from `ColorfulTheme`.
pub struct DialoguerConfirmPrompter;

impl ConfirmPrompter for DialoguerConfirmPrompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String> {
        let theme = ColorfulTheme::default();
        let confirm = Confirm::with_theme(&theme)
            .with_prompt(prompt)
            .default(default);
        match confirm.interact() {
            Ok(v) => Ok(v),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Prompter that answers yes without asking, used for `--yes`.
pub struct AssumeYes;

impl ConfirmPrompter for AssumeYes {
    fn confirm(&mut self, _prompt: &str, _default: bool) -> Result<bool, String> {
        Ok(true)
    }
}

/// Builds the confirmation question for rewriting `commit_count` commits
/// onto `branch`.
pub(crate) fn start_prompt(commit_count: usize, branch: &str) -> String {
    format!("Rewrite dates of {commit_count} commits onto `{branch}` now?")
}

/// Ask the user to confirm whether to begin rewriting commit dates.
///
/// Defaults to "no": the run creates branches and moves `HEAD`.
///
/// # Returns
/// - `Ok(true)` if the user confirmed.
/// - `Ok(false)` if the user declined.
/// - `Err(String)` if input failed.
pub fn confirm_start<P: ConfirmPrompter + ?Sized>(
    prompter: &mut P,
    commit_count: usize,
    branch: &str,
) -> Result<bool, String> {
    let prompt = start_prompt(commit_count, branch);
    prompter.confirm(&prompt, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockConfirmPrompter {
        pub response: Result<bool, String>,
        pub expected_prompt: String,
        pub expected_default: bool,
    }

    impl ConfirmPrompter for MockConfirmPrompter {
        fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String> {
            assert_eq!(prompt, self.expected_prompt);
            assert_eq!(default, self.expected_default);
            self.response.clone()
        }
    }

    fn mock(response: Result<bool, String>) -> MockConfirmPrompter {
        MockConfirmPrompter {
            response,
            expected_prompt: "Rewrite dates of 5 commits onto `temp-branch` now?".to_string(),
            expected_default: false,
        }
    }

    #[test]
    fn test_confirm_start_true() {
        let mut prompter = mock(Ok(true));
        let result = confirm_start(&mut prompter, 5, "temp-branch");
        assert_eq!(result.unwrap(), true);
    }

    #[test]
    fn test_confirm_start_false() {
        let mut prompter = mock(Ok(false));
        let result = confirm_start(&mut prompter, 5, "temp-branch");
        assert_eq!(result.unwrap(), false);
    }

    #[test]
    fn test_confirm_start_error() {
        let mut prompter = mock(Err("confirm failed".to_string()));
        let result = confirm_start(&mut prompter, 5, "temp-branch");
        assert!(result.is_err());
    }

    #[test]
    fn test_assume_yes_never_asks() {
        let result = confirm_start(&mut AssumeYes, 1, "x");
        assert_eq!(result, Ok(true));
    }
}
