use tracing::debug;

use crate::models::request::RequestHeaders;
use crate::models::signal::{Category, Signal};
use crate::models::verdict::Verdict;

use super::bot_patterns;

/// Stateless scoring of request headers alone (spec §4.1).
///
/// Applied to every non-static, non-document, non-analysis-endpoint request
/// — a curl or API client hitting an endpoint directly, where there is no
/// browser bundle to run the full Signal Evaluator against.
pub struct HeaderEvaluator;

impl HeaderEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, headers: &RequestHeaders) -> Verdict {
        let ua = headers.user_agent();

        let mut signals = Vec::with_capacity(12);

        signals.push(Signal::new(
            "noUserAgent",
            30,
            ua.is_none(),
            Category::Headers,
            "User-Agent header absent",
            "User-Agent header present",
        ));

        let ua_len = ua.map(str::len).unwrap_or(0);
        signals.push(Signal::new(
            "shortUserAgent",
            15,
            ua_len > 0 && ua_len < 20,
            Category::Headers,
            format!("User-Agent suspiciously short (len={})", ua_len),
            "User-Agent length unremarkable",
        ));

        let bot_match = ua.and_then(bot_patterns::first_match);
        signals.push(Signal::new(
            "botUserAgent",
            30,
            bot_match.is_some(),
            Category::Headers,
            format!(
                "User-Agent matches known bot pattern '{}'",
                bot_match.unwrap_or("")
            ),
            "User-Agent matches no known bot pattern",
        ));

        let headless = ua
            .map(|u| u.to_ascii_lowercase().contains("headless"))
            .unwrap_or(false);
        signals.push(Signal::new(
            "headlessUA",
            25,
            headless,
            Category::Headers,
            "User-Agent contains 'headless'",
            "User-Agent does not mention headless",
        ));

        signals.push(Signal::new(
            "noAcceptHeader",
            10,
            !headers.contains("accept"),
            Category::Headers,
            "Accept header absent",
            "Accept header present",
        ));

        let non_browser_accept = headers
            .get("accept")
            .map(|a| {
                let lower = a.to_ascii_lowercase();
                !lower.contains("text/html") && !lower.contains("*/*")
            })
            .unwrap_or(false);
        signals.push(Signal::new(
            "nonBrowserAccept",
            10,
            non_browser_accept,
            Category::Headers,
            "Accept present but names neither text/html nor */*",
            "Accept header is browser-shaped or absent",
        ));

        signals.push(Signal::new(
            "noAcceptLanguage",
            15,
            !headers.contains("accept-language"),
            Category::Headers,
            "Accept-Language header absent",
            "Accept-Language header present",
        ));

        signals.push(Signal::new(
            "noAcceptEncoding",
            10,
            !headers.contains("accept-encoding"),
            Category::Headers,
            "Accept-Encoding header absent",
            "Accept-Encoding header present",
        ));

        signals.push(Signal::new(
            "noSecFetch",
            15,
            !headers.has_sec_fetch(),
            Category::Headers,
            "All Sec-Fetch-* headers absent",
            "At least one Sec-Fetch-* header present",
        ));

        signals.push(Signal::new(
            "noSecChUa",
            8,
            !headers.contains("sec-ch-ua"),
            Category::Headers,
            "Sec-CH-UA header absent",
            "Sec-CH-UA header present",
        ));

        signals.push(Signal::new(
            "noConnection",
            5,
            !headers.contains("connection"),
            Category::Headers,
            "Connection header absent",
            "Connection header present",
        ));

        signals.push(Signal::new(
            "noUpgradeInsecure",
            5,
            !headers.contains("upgrade-insecure-requests"),
            Category::Headers,
            "Upgrade-Insecure-Requests header absent",
            "Upgrade-Insecure-Requests header present",
        ));

        let detected: Vec<&str> = signals.iter().filter(|s| s.detected).map(|s| s.name).collect();
        if !detected.is_empty() {
            debug!(rules = ?detected, "header evaluator flagged signals");
        }

        Verdict::from_signals(signals)
    }
}

impl Default for HeaderEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_from(pairs: &[(&str, &str)]) -> RequestHeaders {
        let mut h = RequestHeaders::new();
        for (k, v) in pairs {
            h.insert(k, v);
        }
        h
    }

    /// Scenario 1 from spec §8: empty curl request.
    #[test]
    fn empty_curl_scores_100_and_is_bot() {
        let headers = headers_from(&[("user-agent", "curl/8.1.2")]);
        let verdict = HeaderEvaluator::new().evaluate(&headers);
        assert_eq!(verdict.score, 100.0);
        assert_eq!(verdict.verdict, crate::models::verdict::Classification::Bot);
        assert_eq!(verdict.confidence, crate::models::verdict::Confidence::High);

        let names: Vec<&str> = verdict.signals.iter().map(|s| s.name).collect();
        for expected in [
            "botUserAgent",
            "shortUserAgent",
            "noAcceptHeader",
            "noAcceptLanguage",
            "noAcceptEncoding",
            "noSecFetch",
            "noSecChUa",
            "noConnection",
            "noUpgradeInsecure",
        ] {
            assert!(names.contains(&expected), "expected {expected} to fire");
        }
        assert!(!names.contains(&"noUserAgent"));
        assert!(!names.contains(&"headlessUA"));
    }

    #[test]
    fn real_browser_headers_score_low() {
        let headers = headers_from(&[
            ("user-agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36"),
            ("accept", "text/html,application/xhtml+xml"),
            ("accept-language", "en-US,en;q=0.9"),
            ("accept-encoding", "gzip, deflate, br"),
            ("sec-fetch-dest", "document"),
            ("sec-ch-ua", "\"Chromium\";v=\"120\""),
            ("connection", "keep-alive"),
            ("upgrade-insecure-requests", "1"),
        ]);
        let verdict = HeaderEvaluator::new().evaluate(&headers);
        assert_eq!(verdict.verdict, crate::models::verdict::Classification::Human);
    }

    #[test]
    fn all_signals_always_has_twelve_entries() {
        let verdict = HeaderEvaluator::new().evaluate(&RequestHeaders::new());
        assert_eq!(verdict.all_signals.len(), 12);
        assert_eq!(verdict.summary.total_checks, 12);
        assert_eq!(verdict.summary.flagged + verdict.summary.passed, 12);
    }
}
