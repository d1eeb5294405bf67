//! The prompt fragments Expo renders at its login choice points, and the
//! keystrokes used to answer them.

use anyhow::{Context, Result};
use regex::Regex;

/// Literal terminal fragments that mark an interactive choice point in the
/// Expo CLI. Matched case-insensitively, anywhere in the output.
const PROMPTS: &[&str] = &[
    "It is recommended to log in with your Expo account before proceeding.",
    "Use arrow-keys. Return to submit.",
    "Proceed anonymously",
    "Log in to EAS with email or username",
    "Email or username",
];

/// The input synthesized in response to a recognized prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Ctrl-C, aborting a credential-entry flow the CLI dropped into. The
    /// PTY line discipline turns this into SIGINT; the parent menu prompt
    /// reappears afterwards and is handled on a later cycle.
    Interrupt,
    /// Arrow down plus Return. Picks the menu entry one position below the
    /// default highlight, which in Expo's login menu is "Proceed
    /// anonymously". Positional, not semantic: nothing inspects which entry
    /// is actually highlighted.
    SelectSecondOption,
}

impl Reaction {
    /// The exact bytes written to the child's stdin for this reaction.
    pub fn keys(self) -> &'static [u8] {
        match self {
            Reaction::Interrupt => b"\x03",
            Reaction::SelectSecondOption => b"\x1b[B\r",
        }
    }
}

/// The fixed set of recognizable prompts, compiled into one case-insensitive
/// alternation.
pub struct PromptSet {
    combined: Regex,
}

impl PromptSet {
    pub fn new() -> Result<Self> {
        let alternation = PROMPTS
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let combined = Regex::new(&format!("(?i){alternation}"))
            .context("Failed to compile prompt patterns")?;
        Ok(Self { combined })
    }

    /// Test `buffer` against the prompt set. On a match, drain the buffer
    /// through the end of the last occurrence and classify the drained text;
    /// on no match, leave the buffer untouched and return `None`.
    ///
    /// One menu render contains several overlapping fragments ("Use
    /// arrow-keys…" and "Proceed anonymously"), so consuming through the
    /// last occurrence yields exactly one reaction per render. Prompts
    /// arriving in later chunks still get their own reaction, since drained
    /// text is never rematched.
    pub fn scan(&self, buffer: &mut String) -> Option<Reaction> {
        let end = self.combined.find_iter(buffer).last()?.end();
        let consumed: String = buffer.drain(..end).collect();
        Some(self.classify(&consumed))
    }

    /// Map the text consumed by a match to its reaction. The credential-flow
    /// markers take priority over the generic menu prompt when both appear.
    fn classify(&self, consumed: &str) -> Reaction {
        let lower = consumed.to_lowercase();
        if lower.contains("email or username") || lower.contains("log in to eas") {
            Reaction::Interrupt
        } else {
            Reaction::SelectSecondOption
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts() -> PromptSet {
        PromptSet::new().unwrap()
    }

    #[test]
    fn test_no_match_leaves_buffer() {
        let mut buf = "Starting Metro Bundler\n".to_string();
        assert_eq!(prompts().scan(&mut buf), None);
        assert_eq!(buf, "Starting Metro Bundler\n");
    }

    #[test]
    fn test_menu_prompt_selects_second_option() {
        let mut buf =
            "Use arrow-keys. Return to submit.\n> Log in\n  Proceed anonymously\n".to_string();
        assert_eq!(prompts().scan(&mut buf), Some(Reaction::SelectSecondOption));
    }

    #[test]
    fn test_menu_render_reacts_once() {
        // Both "Use arrow-keys…" and "Proceed anonymously" match, but a
        // single render must produce a single reaction.
        let mut buf =
            "Use arrow-keys. Return to submit.\n> Log in\n  Proceed anonymously\n".to_string();
        let set = prompts();
        assert_eq!(set.scan(&mut buf), Some(Reaction::SelectSecondOption));
        assert_eq!(set.scan(&mut buf), None);
    }

    #[test]
    fn test_recommendation_banner_matches() {
        let mut buf = "It is recommended to log in with your Expo account before proceeding.\n"
            .to_string();
        assert_eq!(prompts().scan(&mut buf), Some(Reaction::SelectSecondOption));
    }

    #[test]
    fn test_email_prompt_interrupts() {
        let mut buf = "Email or username: ".to_string();
        assert_eq!(prompts().scan(&mut buf), Some(Reaction::Interrupt));
    }

    #[test]
    fn test_login_portal_banner_interrupts() {
        let mut buf = "Log in to EAS with email or username\nEmail or username: ".to_string();
        let set = prompts();
        assert_eq!(set.scan(&mut buf), Some(Reaction::Interrupt));
        assert_eq!(set.scan(&mut buf), None);
    }

    #[test]
    fn test_credential_flow_wins_over_menu() {
        let mut buf = "Use arrow-keys. Return to submit.\nEmail or username: ".to_string();
        assert_eq!(prompts().scan(&mut buf), Some(Reaction::Interrupt));
    }

    #[test]
    fn test_case_insensitive() {
        let mut buf = "PROCEED ANONYMOUSLY".to_string();
        assert_eq!(prompts().scan(&mut buf), Some(Reaction::SelectSecondOption));
    }

    #[test]
    fn test_repeated_prompts_in_separate_chunks() {
        let set = prompts();
        let mut buf = String::new();
        for _ in 0..3 {
            buf.push_str("Use arrow-keys. Return to submit.\n");
            assert_eq!(set.scan(&mut buf), Some(Reaction::SelectSecondOption));
            assert_eq!(set.scan(&mut buf), None);
        }
    }

    #[test]
    fn test_text_before_match_is_consumed() {
        let mut buf = "some earlier output\nProceed anonymously\ntrailing".to_string();
        assert_eq!(prompts().scan(&mut buf), Some(Reaction::SelectSecondOption));
        assert_eq!(buf, "\ntrailing");
    }

    #[test]
    fn test_reaction_keys() {
        assert_eq!(Reaction::Interrupt.keys(), b"\x03");
        assert_eq!(Reaction::SelectSecondOption.keys(), b"\x1b[B\r");
    }
}
