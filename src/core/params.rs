//! Purpose: Model request parameters and their wire encoding.
//! Exports: `ParamValue`, `FilePart`, `Params`, `TokenType`.
//! Role: Shared request vocabulary for typed shapes, the pager, and transports.
//! Invariants: `Params` is never mutated after a request is built; `overlay` copies.
//! Invariants: `Flag(false)` is omitted on the wire; `Flag(true)` is sent as an empty value.
//! Invariants: Lists join with `|`, or with U+001F when any element contains `|`.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const LIST_SEPARATOR: char = '|';
const ALT_LIST_SEPARATOR: char = '\u{1f}';

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Createaccount,
    Csrf,
    Deleteglobalaccount,
    Login,
    Patrol,
    Rollback,
    Setglobalaccountstatus,
    Userrights,
    Watch,
}

impl TokenType {
    pub const ALL: [TokenType; 9] = [
        TokenType::Createaccount,
        TokenType::Csrf,
        TokenType::Deleteglobalaccount,
        TokenType::Login,
        TokenType::Patrol,
        TokenType::Rollback,
        TokenType::Setglobalaccountstatus,
        TokenType::Userrights,
        TokenType::Watch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Createaccount => "createaccount",
            TokenType::Csrf => "csrf",
            TokenType::Deleteglobalaccount => "deleteglobalaccount",
            TokenType::Login => "login",
            TokenType::Patrol => "patrol",
            TokenType::Rollback => "rollback",
            TokenType::Setglobalaccountstatus => "setglobalaccountstatus",
            TokenType::Userrights => "userrights",
            TokenType::Watch => "watch",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|token| token.as_str() == value)
    }

    /// Key the token is returned under by `meta=tokens` (e.g. `csrftoken`).
    pub fn response_key(self) -> String {
        format!("{}token", self.as_str())
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File contents sent as a multipart part.
#[derive(Clone, Eq, PartialEq)]
pub struct FilePart {
    pub filename: String,
    pub contents: Vec<u8>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("filename", &self.filename)
            .field("len", &self.contents.len())
            .finish()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Flag(bool),
    List(Vec<String>),
    File(FilePart),
}

impl ParamValue {
    /// Wire text for this value, or `None` when it is not sent as a form field.
    pub fn encode(&self) -> Option<String> {
        match self {
            ParamValue::Text(text) => Some(text.clone()),
            ParamValue::Int(value) => Some(value.to_string()),
            ParamValue::Flag(true) => Some(String::new()),
            ParamValue::Flag(false) => None,
            ParamValue::List(items) => Some(encode_list(items)),
            ParamValue::File(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

fn encode_list(items: &[String]) -> String {
    if items.iter().any(|item| item.contains(LIST_SEPARATOR)) {
        let mut out = String::new();
        for item in items {
            out.push(ALT_LIST_SEPARATOR);
            out.push_str(item);
        }
        out
    } else {
        items.join("|")
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Flag(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(value) => ParamValue::Int(value),
            Err(_) => ParamValue::Text(value.to_string()),
        }
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

impl From<&[&str]> for ParamValue {
    fn from(value: &[&str]) -> Self {
        ParamValue::List(value.iter().map(|item| item.to_string()).collect())
    }
}

impl From<&[u64]> for ParamValue {
    fn from(value: &[u64]) -> Self {
        ParamValue::List(value.iter().map(u64::to_string).collect())
    }
}

impl From<&[i64]> for ParamValue {
    fn from(value: &[i64]) -> Self {
        ParamValue::List(value.iter().map(i64::to_string).collect())
    }
}

impl From<FilePart> for ParamValue {
    fn from(value: FilePart) -> Self {
        ParamValue::File(value)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params {
    entries: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` only when `value` is `Some`.
    pub fn with_opt<V: Into<ParamValue>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_text)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// True when `key` reaches the wire: a form field or a file part.
    pub fn is_sent(&self, key: &str) -> bool {
        match self.get(key) {
            Some(ParamValue::File(_)) => true,
            Some(value) => value.encode().is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Copy of `self` with `pairs` written over it; all other keys unchanged.
    pub fn overlay<'a, I>(&self, pairs: I) -> Params
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut next = self.clone();
        for (key, value) in pairs {
            next.insert(key, value);
        }
        next
    }

    /// Copy of `self` without the given keys.
    pub fn without(&self, keys: &[&str]) -> Params {
        let mut next = self.clone();
        for key in keys {
            next.entries.remove(*key);
        }
        next
    }

    /// Form fields in key order, skipping omitted flags and file parts.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter_map(|(key, value)| value.encode().map(|text| (key.clone(), text)))
            .collect()
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &FilePart)> {
        self.entries.iter().filter_map(|(key, value)| match value {
            ParamValue::File(part) => Some((key.as_str(), part)),
            _ => None,
        })
    }

    pub fn has_files(&self) -> bool {
        self.files().next().is_some()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::{FilePart, ParamValue, Params, TokenType};

    #[test]
    fn flags_encode_by_presence() {
        let params = Params::new()
            .with("bot", true)
            .with("minor", false)
            .with("title", "Sandbox");
        assert_eq!(
            params.form_pairs(),
            vec![
                ("bot".to_string(), String::new()),
                ("title".to_string(), "Sandbox".to_string()),
            ]
        );
    }

    #[test]
    fn lists_join_with_pipe() {
        let value = ParamValue::from(&["ids", "title", "timestamp"][..]);
        assert_eq!(value.encode().as_deref(), Some("ids|title|timestamp"));
    }

    #[test]
    fn lists_with_pipes_switch_to_unit_separator() {
        let value = ParamValue::List(vec!["a|b".to_string(), "c".to_string()]);
        assert_eq!(value.encode().as_deref(), Some("\u{1f}a|b\u{1f}c"));
    }

    #[test]
    fn empty_list_is_sent_as_empty_value() {
        let params = Params::new().with("protections", Vec::<String>::new());
        assert_eq!(
            params.form_pairs(),
            vec![("protections".to_string(), String::new())]
        );
    }

    #[test]
    fn overlay_leaves_original_untouched() {
        let base = Params::new().with("list", "allpages").with("aplimit", 2u32);
        let next = base.overlay([("apcontinue", "abc")]);
        assert!(!base.contains("apcontinue"));
        assert_eq!(next.text("apcontinue"), Some("abc"));
        assert_eq!(next.get("aplimit"), Some(&ParamValue::Int(2)));
        assert_eq!(next.without(&["apcontinue"]), base);
    }

    #[test]
    fn files_are_not_form_fields() {
        let params = Params::new().with("filename", "A.png").with(
            "file",
            FilePart {
                filename: "A.png".to_string(),
                contents: vec![1, 2, 3],
            },
        );
        assert_eq!(params.form_pairs().len(), 1);
        assert!(params.has_files());
    }

    #[test]
    fn oversized_u64_falls_back_to_text() {
        assert_eq!(
            ParamValue::from(u64::MAX),
            ParamValue::Text(u64::MAX.to_string())
        );
        assert_eq!(ParamValue::from(7u64), ParamValue::Int(7));
    }

    #[test]
    fn token_types_parse_their_wire_names() {
        for token in TokenType::ALL {
            assert_eq!(TokenType::parse(token.as_str()), Some(token));
        }
        assert_eq!(TokenType::Csrf.response_key(), "csrftoken");
        assert_eq!(TokenType::parse("bogus"), None);
    }
}
