use serde_json::Value;

/// Tagged accessor over the untyped browser-environment bundle a client
/// POSTs to `/api/bot`.
///
/// The bundle's shape is fixed by the client-side collector, not by this
/// crate, and every field is optional — a rule that reads through
/// [`Bundle`] always gets a well-defined default instead of matching on
/// `Option<Value>` by hand. Every rule in the Signal Evaluator is a pure
/// function of one of these accessors plus its own constants.
pub struct Bundle {
    root: Value,
}

impl Bundle {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Dotted-path lookup, e.g. `"screen.width"` or `"webgl.unmaskedRenderer"`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut cur = &self.root;
        for part in path.split('.') {
            cur = cur.get(part)?;
        }
        Some(cur)
    }

    pub fn has_object(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Value::Object(_)))
    }

    pub fn get_string(&self, path: &str, default: &str) -> String {
        self.get(path)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_str_opt(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_number(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// True only when the value at `path` is a bool `true` — absence or any
    /// other shape is not truthy. Used for `features.*` flags.
    pub fn is_true(&self, path: &str) -> bool {
        self.get_bool(path).unwrap_or(false)
    }

    pub fn array_len(&self, path: &str) -> Option<usize> {
        self.get(path).and_then(Value::as_array).map(Vec::len)
    }

    pub fn is_missing(&self, path: &str) -> bool {
        self.get(path).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_path_resolves() {
        let b = Bundle::new(json!({"screen": {"width": 1920, "height": 1080}}));
        assert_eq!(b.get_number("screen.width"), Some(1920.0));
        assert_eq!(b.get_number("screen.depth"), None);
    }

    #[test]
    fn missing_root_key_is_none_not_panic() {
        let b = Bundle::new(json!({}));
        assert_eq!(b.get_number("webgl.unmaskedRenderer"), None);
        assert_eq!(b.get_string("navigator.userAgent", "?"), "?");
    }

    #[test]
    fn is_true_requires_literal_bool() {
        let b = Bundle::new(json!({"navigator": {"webdriver": "true"}}));
        assert!(!b.is_true("navigator.webdriver"));
        let b2 = Bundle::new(json!({"navigator": {"webdriver": true}}));
        assert!(b2.is_true("navigator.webdriver"));
    }
}
