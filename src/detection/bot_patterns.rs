/// Canonical bot/automation User-Agent substrings, matched case-insensitively.
///
/// Order matters: `first_match` returns the first list entry that matches,
/// and that identifier is what ends up in a signal's reason string.
const BOT_PATTERNS: &[&str] = &[
    "python",
    "curl",
    "wget",
    "axios",
    "node-fetch",
    "go-http",
    "java/",
    "libwww",
    "httpunit",
    "nutch",
    "phpcrawl",
    "msnbot",
    "scrapy",
    "mechanize",
    "phantom",
    "casper",
    "selenium",
    "webdriver",
    "chrome-lighthouse",
    "pingdom",
    "phantomjs",
    "headlesschrome",
    "httpie",
    "postman",
    "insomnia",
    "rest-client",
    "okhttp",
    "apache-http",
    // auxiliary crawler list
    "heritrix",
    "httrack",
    "teoma",
    "gigablast",
    "ia_archiver",
    "ezooms",
    "linkdex",
];

/// Returns the first matching pattern, if any, for use in a signal's reason
/// text (e.g. `"User-Agent matches known bot pattern 'curl'"`).
pub fn first_match(user_agent: &str) -> Option<&'static str> {
    let lower = user_agent.to_ascii_lowercase();
    BOT_PATTERNS.iter().copied().find(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_curl() {
        assert_eq!(first_match("curl/8.1.2"), Some("curl"));
    }

    #[test]
    fn matches_headless_chrome() {
        assert_eq!(
            first_match("Mozilla/5.0 HeadlessChrome/120.0.0.0"),
            Some("headlesschrome")
        );
    }

    #[test]
    fn returns_first_entry_in_list_order() {
        // "webdriver" and "selenium" both appear; selenium precedes webdriver
        // in BOT_PATTERNS, so a UA containing both must report selenium.
        assert_eq!(
            first_match("selenium/4.1 webdriver"),
            Some("selenium")
        );
    }

    #[test]
    fn real_browser_does_not_match() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";
        assert_eq!(first_match(ua), None);
    }
}
