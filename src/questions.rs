//! Ordered question sets for interview sessions.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::QuestionBank;
use crate::error::SessionError;

/// An ordered, non-empty list of question strings.
///
/// Fixed at session creation and immutable thereafter; the session cursor
/// indexes into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionSet(Vec<String>);

impl QuestionSet {
    /// Build a question set, dropping blank entries.
    ///
    /// Fails with `InvalidQuestionSet` when no non-blank question remains.
    pub fn new<I, S>(questions: I) -> Result<Self, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let questions: Vec<String> = questions
            .into_iter()
            .map(|q| q.into().trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();

        if questions.is_empty() {
            return Err(SessionError::InvalidQuestionSet);
        }
        Ok(Self(questions))
    }

    /// Load a question set from a plain-text file, one question per line.
    /// Blank lines are skipped.
    pub fn from_file(path: &Path) -> Result<Self, crate::Error> {
        let text = std::fs::read_to_string(path).map_err(crate::error::ConfigError::Io)?;
        Ok(Self::new(text.lines())?)
    }

    /// Flatten a categorized analyzer question bank into an ordered set.
    ///
    /// Category order is fixed so the resulting sequence is deterministic.
    pub fn from_bank(bank: &QuestionBank) -> Result<Self, SessionError> {
        Self::new(bank.flatten())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            QuestionSet::new(Vec::<String>::new()),
            Err(SessionError::InvalidQuestionSet)
        ));
        assert!(matches!(
            QuestionSet::new(["", "   ", "\t"]),
            Err(SessionError::InvalidQuestionSet)
        ));
    }

    #[test]
    fn trims_and_drops_blanks() {
        let set = QuestionSet::new(["  A?  ", "", "B?"]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0), Some("A?"));
        assert_eq!(set.get(1), Some("B?"));
        assert_eq!(set.get(2), None);
    }

    #[test]
    fn loads_from_file_skipping_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "First question?\n\nSecond question?\n   \n").expect("write");

        let set = QuestionSet::from_file(file.path()).expect("load");
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec!["First question?", "Second question?"]
        );
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let set = QuestionSet::new(["A?", "B?", "C?"]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["A?","B?","C?"]"#);
        let back: QuestionSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
