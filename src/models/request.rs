use std::collections::HashMap;

/// Normalised view of the headers of one inbound request.
///
/// Header names are lower-cased on insert so lookups never have to guess
/// casing. Built once per request by the HTTP layer and handed to both the
/// Header Evaluator and the header-family rules of the Signal Evaluator.
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    pub headers: HashMap<String, String>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.get("user-agent").filter(|ua| !ua.is_empty())
    }

    /// True if any of the three Sec-Fetch-* headers is present.
    pub fn has_sec_fetch(&self) -> bool {
        self.contains("sec-fetch-dest") || self.contains("sec-fetch-mode") || self.contains("sec-fetch-site")
    }

    /// Per §4.5: a document request is a GET whose Sec-Fetch-Dest is
    /// "document", or whose Accept contains "text/html".
    pub fn looks_like_document_request(&self) -> bool {
        if self.get("sec-fetch-dest") == Some("document") {
            return true;
        }
        self.get("accept")
            .map(|a| a.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false)
    }
}
