//! Placeholder substitution for fragments.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

/// Ordered mapping from placeholder name to replacement text.
///
/// Insertion order is the substitution order. Re-inserting an existing key
/// replaces its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementSet {
    values: IndexMap<String, String>,
}

impl ReplacementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a placeholder value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Insert a JSON value using its display form.
    pub fn insert_value(&mut self, key: impl Into<String>, value: &Value) {
        self.insert(key, display_value(value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReplacementSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ReplacementSet::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

/// Display form of a JSON value used as placeholder text.
///
/// Strings are used verbatim. Booleans and `null` are spelled `True`,
/// `False` and `None` so existing bundles render unchanged. Numbers, arrays
/// and objects use their compact JSON form.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Renders `{key}` placeholders in fragment text.
pub struct TemplateRenderer {
    placeholder_pattern: Regex,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self {
            // Match {identifier} tokens that survived rendering
            placeholder_pattern: Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
                .expect("placeholder pattern is a valid regex"),
        }
    }

    /// Replace every `{key}` in `content` with its value.
    ///
    /// Keys are applied one after another in set order, each rewriting the
    /// output of the previous one. A value that itself contains a `{token}`
    /// is therefore rewritten again if that token's key comes later in the
    /// set. Tokens without a matching key stay as they are.
    pub fn render_content(&self, content: &str, replacements: &ReplacementSet) -> String {
        let mut result = content.to_string();
        for (key, value) in replacements.iter() {
            let placeholder = format!("{{{}}}", key);
            if result.contains(&placeholder) {
                result = result.replace(&placeholder, value);
            }
        }
        result
    }

    /// Identifiers still written as `{identifier}` in `text`, first-seen order.
    pub fn unresolved_placeholders(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for caps in self.placeholder_pattern.captures_iter(text) {
            let name = &caps[1];
            if !found.iter().any(|f| f == name) {
                found.push(name.to_string());
            }
        }
        found
    }
}
