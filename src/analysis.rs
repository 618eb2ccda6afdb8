//! Typed model of the compatibility analyzer boundary.
//!
//! The analyzer itself is an external LLM pipeline; this module only models
//! its output. LLM-derived text is parsed through a tagged outcome so callers
//! always receive a usable value: either the parsed payload or an explicit
//! fallback with the reason the parse failed.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Compatibility analysis of a candidate profile against a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub compatibility_score: u8,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub potential_concerns: Vec<String>,
    #[serde(default)]
    pub work_style_indicators: Vec<String>,
    #[serde(default)]
    pub culture_fit_aspects: Vec<String>,
    #[serde(default)]
    pub adaptability_signals: Vec<String>,
}

/// Follow-up questions grouped by the dimension they probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    #[serde(default)]
    pub situational: Vec<String>,
    #[serde(default)]
    pub cultural_fit: Vec<String>,
    #[serde(default)]
    pub adaptability: Vec<String>,
    #[serde(default)]
    pub collaboration: Vec<String>,
    #[serde(default)]
    pub growth: Vec<String>,
}

impl QuestionBank {
    /// Flatten all categories into one ordered list.
    /// Category order is fixed: situational, cultural fit, adaptability,
    /// collaboration, growth.
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(
            self.situational.len()
                + self.cultural_fit.len()
                + self.adaptability.len()
                + self.collaboration.len()
                + self.growth.len(),
        );
        out.extend(self.situational.iter().cloned());
        out.extend(self.cultural_fit.iter().cloned());
        out.extend(self.adaptability.iter().cloned());
        out.extend(self.collaboration.iter().cloned());
        out.extend(self.growth.iter().cloned());
        out
    }
}

/// Recommended next action for a candidate, derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    ImmediateFollowUp,
    ScreeningCall,
    ReviewOtherCandidates,
}

impl NextStep {
    /// Score thresholds: 80 and above warrants an immediate follow-up,
    /// 60 to 79 a screening call, anything lower a wider review.
    pub fn for_score(score: u8) -> Self {
        if score >= 80 {
            NextStep::ImmediateFollowUp
        } else if score >= 60 {
            NextStep::ScreeningCall
        } else {
            NextStep::ReviewOtherCandidates
        }
    }
}

impl std::fmt::Display for NextStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            NextStep::ImmediateFollowUp => "Schedule immediate follow-up interview",
            NextStep::ScreeningCall => "Schedule initial screening call",
            NextStep::ReviewOtherCandidates => "Review additional candidates before proceeding",
        };
        f.write_str(text)
    }
}

/// Result of parsing LLM-derived structured output.
///
/// `Fallback` carries a stand-in value plus the parse failure that caused it,
/// so downstream code never branches on a missing payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome<T> {
    Parsed(T),
    Fallback { value: T, reason: String },
}

impl<T> AnalysisOutcome<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, AnalysisOutcome::Fallback { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            AnalysisOutcome::Parsed(v) => v,
            AnalysisOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            AnalysisOutcome::Parsed(v) => v,
            AnalysisOutcome::Fallback { value, .. } => value,
        }
    }
}

/// Parse a compatibility report out of raw analyzer text.
pub fn parse_report(raw: &str) -> AnalysisOutcome<CompatibilityReport> {
    match extract_json_block(raw).and_then(|json| {
        serde_json::from_str::<CompatibilityReport>(&json).map_err(|e| e.to_string())
    }) {
        Ok(report) => AnalysisOutcome::Parsed(report),
        Err(reason) => {
            tracing::warn!(%reason, "Falling back to default compatibility report");
            AnalysisOutcome::Fallback {
                value: fallback_report(),
                reason,
            }
        }
    }
}

/// Parse the categorized question bank out of raw analyzer text.
///
/// Accepts either a bare bank object or one wrapped in a `questions` key.
pub fn parse_question_bank(raw: &str) -> AnalysisOutcome<QuestionBank> {
    #[derive(Deserialize)]
    struct Wrapper {
        questions: QuestionBank,
    }

    match extract_json_block(raw).and_then(|json| {
        serde_json::from_str::<Wrapper>(&json)
            .map(|w| w.questions)
            .or_else(|_| serde_json::from_str::<QuestionBank>(&json))
            .map_err(|e| e.to_string())
    }) {
        Ok(bank) => AnalysisOutcome::Parsed(bank),
        Err(reason) => {
            tracing::warn!(%reason, "Falling back to stock follow-up questions");
            AnalysisOutcome::Fallback {
                value: fallback_question_bank(),
                reason,
            }
        }
    }
}

/// Extract the outermost JSON object from surrounding prose, stripping
/// markdown code fences.
fn extract_json_block(text: &str) -> Result<String, String> {
    let re = Regex::new(r"\{[\s\S]*\}").expect("valid json block pattern");
    let block = re
        .find(text)
        .ok_or_else(|| "no JSON object found in analyzer output".to_string())?;
    Ok(block
        .as_str()
        .replace("```json", "")
        .replace("```", ""))
}

/// Stand-in report used when the analyzer output cannot be parsed.
fn fallback_report() -> CompatibilityReport {
    CompatibilityReport {
        compatibility_score: 50,
        strengths: vec![
            "Candidate shows potential".to_string(),
            "Review needed for specific details".to_string(),
        ],
        potential_concerns: vec!["Further assessment recommended".to_string()],
        work_style_indicators: vec!["Need more information".to_string()],
        culture_fit_aspects: vec!["To be determined".to_string()],
        adaptability_signals: vec!["Requires further evaluation".to_string()],
    }
}

/// Stand-in question bank used when the analyzer output cannot be parsed.
fn fallback_question_bank() -> QuestionBank {
    QuestionBank {
        situational: vec![
            "Could you describe a challenging work situation and how you handled it?".to_string(),
        ],
        cultural_fit: vec![
            "What type of work environment helps you perform your best?".to_string(),
        ],
        adaptability: vec!["How do you handle unexpected changes in priorities?".to_string()],
        collaboration: vec!["How do you prefer to work within a team?".to_string()],
        growth: vec!["What are your learning goals for the next year?".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_report_from_fenced_output() {
        let raw = r#"Here is the analysis you asked for:
```json
{"compatibility_score": 85, "strengths": ["ownership"], "potential_concerns": []}
```
Let me know if you need anything else."#;

        let outcome = parse_report(raw);
        assert!(!outcome.is_fallback());
        let report = outcome.into_value();
        assert_eq!(report.compatibility_score, 85);
        assert_eq!(report.strengths, vec!["ownership".to_string()]);
    }

    #[test]
    fn unparseable_report_falls_back_with_reason() {
        let outcome = parse_report("I could not produce JSON today, sorry.");
        match outcome {
            AnalysisOutcome::Fallback { value, reason } => {
                assert_eq!(value.compatibility_score, 50);
                assert!(!reason.is_empty());
            }
            AnalysisOutcome::Parsed(_) => panic!("expected fallback"),
        }
    }

    #[test]
    fn parses_wrapped_and_bare_question_banks() {
        let wrapped = r#"{"questions": {"situational": ["S1?"], "growth": ["G1?"]}}"#;
        let bank = parse_question_bank(wrapped).into_value();
        assert_eq!(bank.situational, vec!["S1?".to_string()]);
        assert_eq!(bank.growth, vec!["G1?".to_string()]);

        let bare = r#"{"situational": ["S1?"], "collaboration": ["C1?"]}"#;
        let bank = parse_question_bank(bare).into_value();
        assert_eq!(bank.collaboration, vec!["C1?".to_string()]);
    }

    #[test]
    fn fallback_bank_covers_every_category() {
        let outcome = parse_question_bank("no json here");
        assert!(outcome.is_fallback());
        let bank = outcome.into_value();
        assert_eq!(bank.flatten().len(), 5);
    }

    #[test]
    fn flatten_order_is_fixed() {
        let bank = QuestionBank {
            situational: vec!["s".into()],
            cultural_fit: vec!["c".into()],
            adaptability: vec!["a".into()],
            collaboration: vec!["t".into()],
            growth: vec!["g".into()],
        };
        assert_eq!(bank.flatten(), vec!["s", "c", "a", "t", "g"]);
    }

    #[test]
    fn next_step_thresholds() {
        assert_eq!(NextStep::for_score(95), NextStep::ImmediateFollowUp);
        assert_eq!(NextStep::for_score(80), NextStep::ImmediateFollowUp);
        assert_eq!(NextStep::for_score(79), NextStep::ScreeningCall);
        assert_eq!(NextStep::for_score(60), NextStep::ScreeningCall);
        assert_eq!(NextStep::for_score(59), NextStep::ReviewOtherCandidates);
        assert_eq!(NextStep::for_score(0), NextStep::ReviewOtherCandidates);
    }
}
