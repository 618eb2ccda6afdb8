//! Candidate-facing message texts.
//!
//! Everything a candidate sees is plain language; raw error detail never
//! leaves the service.

use std::path::Path;

use crate::error::ConfigError;

pub const WELCOME: &str = "\u{1F44B} Welcome to our automated job follow-up!\n\n\
    \u{1F50D} Here's what you need to know:\n\
    1. Type /start to begin your follow-up\n\
    2. You'll receive questions one at a time\n\
    3. Take your time to answer thoughtfully\n\
    4. Type /pause to pause the session\n\
    5. Type /resume to continue where you left off\n\
    6. Type /help for assistance\n\n\
    Ready to begin? Type /start when you're ready!";

pub const HELP: &str = "\u{1F198} Need help? Here are the available commands:\n\n\
    /start - Begin your follow-up\n\
    /pause - Pause your session\n\
    /resume - Resume a paused session\n\
    /help - Show this help message\n\n\
    If you're experiencing technical issues, please contact the HR team.";

pub const NOT_REGISTERED: &str = "\u{26A0}\u{FE0F} You're not registered for a follow-up. \
    Please contact the HR team for registration.";

pub const STARTING: &str = "\u{1F3AF} Your follow-up is starting now. \
    Take your time to answer each question thoughtfully.";

pub const PAUSED: &str =
    "\u{23F8}\u{FE0F} Session paused. Type /resume when you're ready to continue.";

pub const NO_ACTIVE_TO_PAUSE: &str =
    "No active session to pause. Type /start to begin your follow-up.";

pub const NO_PAUSED_TO_RESUME: &str =
    "No paused session found. Type /start to begin your follow-up.";

pub const START_WHILE_PAUSED: &str =
    "\u{23F8}\u{FE0F} Your session is paused. Type /resume to continue.";

pub const ALREADY_COMPLETED: &str = "\u{2705} You've already completed this follow-up. \
    Thank you again for your time!";

pub const COMPLETED: &str = "\u{1F389} Congratulations! You've completed the follow-up.\n\n\
    Thank you for your time and thoughtful responses. \
    Our team will review your answers and get back to you soon.\n\n\
    Best of luck! \u{1F340}";

const FIRST_QUESTION: &str = "Thank you for joining. Here's your first question.";

const RESUME_PREAMBLE: &str = "Welcome back! Let's pick up where we left off.";

const DEFAULT_STARTERS: &[&str] = &[
    "Thanks for sharing that. Here's the next one.",
    "Great, let's keep going.",
    "Appreciate the detail. Next up:",
    "Noted! Here's another one for you.",
    "Thanks! Moving on to the next question.",
    "Good to know. Next question:",
    "That helps a lot. Continuing:",
    "Almost there, keep it up!",
];

/// Deterministic transition phrases for question delivery.
///
/// The phrase depends only on the cursor, so a re-sent question always
/// carries the same framing.
#[derive(Debug, Clone)]
pub struct PhraseBook {
    starters: Vec<String>,
}

impl Default for PhraseBook {
    fn default() -> Self {
        Self {
            starters: DEFAULT_STARTERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PhraseBook {
    /// Load starters from a file, one phrase per line, skipping blanks.
    /// An all-blank file falls back to the built-in phrases.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let starters: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        if starters.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self { starters })
    }

    /// Preamble for the question at `cursor`. The first question gets its own
    /// phrase; later ones index the starter list by question number, wrapping.
    pub fn preamble(&self, cursor: usize) -> &str {
        if cursor == 0 {
            return FIRST_QUESTION;
        }
        &self.starters[(cursor + 1) % self.starters.len()]
    }

    /// Preamble used when `/resume` re-sends the current question.
    pub fn resume_preamble(&self) -> &str {
        RESUME_PREAMBLE
    }
}

/// Frame a question for delivery.
pub fn format_question(preamble: &str, question: &str) -> String {
    format!("\u{1F4DD} {preamble}\n\n{question}\n\n(Type /pause if you need a break)")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn first_question_gets_the_fixed_phrase() {
        let book = PhraseBook::default();
        assert_eq!(book.preamble(0), FIRST_QUESTION);
        assert_ne!(book.preamble(1), FIRST_QUESTION);
    }

    #[test]
    fn preamble_is_deterministic_and_wraps() {
        let book = PhraseBook::default();
        for cursor in 1..40 {
            assert_eq!(book.preamble(cursor), book.preamble(cursor));
        }
        let n = DEFAULT_STARTERS.len();
        assert_eq!(book.preamble(1), book.preamble(1 + n));
    }

    #[test]
    fn loads_starters_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "Phrase one.\n\nPhrase two.").expect("write");

        let book = PhraseBook::from_file(file.path()).expect("load");
        assert_eq!(book.starters, vec!["Phrase one.", "Phrase two."]);
    }

    #[test]
    fn blank_starter_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "\n   \n").expect("write");

        let book = PhraseBook::from_file(file.path()).expect("load");
        assert_eq!(book.starters.len(), DEFAULT_STARTERS.len());
    }

    #[test]
    fn question_framing_includes_pause_hint() {
        let text = format_question("Preamble.", "Why Rust?");
        assert!(text.contains("Preamble."));
        assert!(text.contains("Why Rust?"));
        assert!(text.contains("/pause"));
    }
}
