use serde::Serialize;

/// Which family of evidence a [`Signal`] belongs to.
///
/// Mirrors the category tags used to group `allSignals` in a [`crate::models::verdict::Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Automation,
    BrowserFeatures,
    Screen,
    Webgl,
    Consistency,
    Timing,
    Headers,
    Fingerprint,
    General,
}

/// A single named, weighted rule outcome.
///
/// Every rule in the Header and Signal Evaluators produces exactly one of
/// these, whether or not it fired — `allSignals` in a verdict always holds
/// one `Signal` per rule that ran, `signals` only the detected subset.
#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub name: &'static str,
    pub weight: u32,
    pub detected: bool,
    pub reason: String,
    pub category: Category,
}

impl Signal {
    /// Build a signal, picking the detected/not-detected reason text.
    ///
    /// `weight` is the full rule weight; it still gets recorded on a
    /// not-detected signal so `allSignals` carries the rule's static shape,
    /// but only detected signals contribute to the score sum.
    pub fn new(
        name: &'static str,
        weight: u32,
        detected: bool,
        category: Category,
        reason_detected: impl Into<String>,
        reason_clear: impl Into<String>,
    ) -> Self {
        Self {
            name,
            weight,
            detected,
            reason: if detected {
                reason_detected.into()
            } else {
                reason_clear.into()
            },
            category,
        }
    }
}
