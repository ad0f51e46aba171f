use std::collections::HashMap;

use serde::Serialize;

use super::signal::{Category, Signal};

/// Tri-valued classification derived from a score against fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Human,
    Suspicious,
    Bot,
}

impl Classification {
    pub fn from_score(score: f64) -> Self {
        if score >= 50.0 {
            Classification::Bot
        } else if score >= 25.0 {
            Classification::Suspicious
        } else {
            Classification::Human
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Human => "human",
            Classification::Suspicious => "suspicious",
            Classification::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        if score >= 50.0 {
            Confidence::High
        } else if score >= 25.0 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    #[serde(rename = "totalChecks")]
    pub total_checks: usize,
    pub flagged: usize,
    pub passed: usize,
}

/// The result of running an evaluator (Header Evaluator or Signal Evaluator)
/// against a single request.
///
/// `signals` and `all_signals` are built from the same rule run: `signals`
/// is the detected subset of `all_signals`, never computed independently.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub verdict: Classification,
    pub score: f64,
    #[serde(rename = "maxScore")]
    pub max_score: f64,
    pub confidence: Confidence,
    pub signals: Vec<Signal>,
    #[serde(rename = "allSignals")]
    pub all_signals: Vec<Signal>,
    #[serde(rename = "signalsByCategory")]
    pub signals_by_category: HashMap<Category, Vec<Signal>>,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    /// Assemble a verdict from the full set of rule outcomes for one
    /// evaluator pass. Score is clamped to 100 here, once, per spec §4.2.
    pub fn from_signals(all_signals: Vec<Signal>) -> Self {
        let raw: f64 = all_signals
            .iter()
            .filter(|s| s.detected)
            .map(|s| s.weight as f64)
            .sum();
        let score = raw.min(100.0);

        let signals: Vec<Signal> = all_signals.iter().filter(|s| s.detected).cloned().collect();

        let mut by_category: HashMap<Category, Vec<Signal>> = HashMap::new();
        for s in &all_signals {
            by_category.entry(s.category).or_default().push(s.clone());
        }

        let total_checks = all_signals.len();
        let flagged = signals.len();
        let passed = total_checks - flagged;

        Self {
            verdict: Classification::from_score(score),
            score,
            max_score: 100.0,
            confidence: Confidence::from_score(score),
            signals,
            all_signals,
            signals_by_category: by_category,
            summary: Summary {
                total_checks,
                flagged,
                passed,
            },
            code: None,
            reason: None,
        }
    }

    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }

    /// The synthetic verdict for the early-reject path (§4.2) and the
    /// deadline timeout path (§4.4) — both are a single full-weight
    /// signal rather than a weighted sum over many rules.
    pub fn synthetic(signal_name: &'static str, category: Category, code: u32, reason: impl Into<String>) -> Self {
        let signal = Signal::new(
            signal_name,
            100,
            true,
            category,
            reason.into(),
            String::new(),
        );
        Self::from_signals(vec![signal]).with_code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// spec §6.1: "Verdict JSON shape exactly"; this must hold over the
    /// actual serialized JSON, not just the Rust field names.
    #[test]
    fn json_shape_matches_spec_exactly() {
        let signal = Signal::new(
            "webdriver",
            30,
            true,
            Category::Automation,
            "navigator.webdriver reports true",
            "navigator.webdriver is false or absent",
        );
        let verdict = Verdict::from_signals(vec![signal]);
        let value = serde_json::to_value(&verdict).unwrap();
        let obj = value.as_object().unwrap();

        for key in [
            "verdict",
            "score",
            "maxScore",
            "confidence",
            "signals",
            "allSignals",
            "signalsByCategory",
            "summary",
        ] {
            assert!(obj.contains_key(key), "missing top-level key '{}'", key);
        }
        assert!(!obj.contains_key("max_score"));
        assert!(!obj.contains_key("all_signals"));
        assert!(!obj.contains_key("signals_by_category"));

        let summary = obj["summary"].as_object().unwrap();
        for key in ["totalChecks", "flagged", "passed"] {
            assert!(summary.contains_key(key), "missing summary key '{}'", key);
        }
        assert!(!summary.contains_key("total_checks"));
    }

    #[test]
    fn code_present_only_when_set() {
        let value = serde_json::to_value(Verdict::from_signals(vec![])).unwrap();
        assert!(!value.as_object().unwrap().contains_key("code"));

        let synthetic = Verdict::synthetic("jsExecutionFailed", Category::Automation, 1005, "missing data");
        let value = serde_json::to_value(&synthetic).unwrap();
        assert_eq!(value["code"], 1005);
    }
}
