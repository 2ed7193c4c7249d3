//! Purpose: `action=opensearch` request and its positional response.
//! Exports: `OpenSearch`, `OpenSearchResult`, `SearchRedirects`.
#![allow(clippy::result_large_err)]

use super::request::{ApiResult, Limit, Request};
use crate::core::error::{Error, ErrorKind};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchRedirects {
    Return,
    Resolve,
}

impl SearchRedirects {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchRedirects::Return => "return",
            SearchRedirects::Resolve => "resolve",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OpenSearch {
    pub search: String,
    pub limit: Option<Limit>,
    pub namespace: Vec<i64>,
    pub profile: Option<String>,
    pub redirects: Option<SearchRedirects>,
}

impl OpenSearch {
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            limit: None,
            namespace: Vec::new(),
            profile: None,
            redirects: None,
        }
    }

    pub fn to_request(&self) -> ApiResult<Request> {
        let namespace = (!self.namespace.is_empty()).then(|| &self.namespace[..]);
        Request::get("opensearch")
            .param("search", self.search.as_str())
            .opt("limit", self.limit)
            .opt("namespace", namespace)
            .opt("profile", self.profile.clone())
            .opt("redirects", self.redirects.map(SearchRedirects::as_str))
            .build()
    }
}

/// The `[query, titles, descriptions, urls]` tuple, with entries aligned by index.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct OpenSearchResult {
    pub query: String,
    pub titles: Vec<String>,
    pub descriptions: Vec<String>,
    pub urls: Vec<String>,
}

impl OpenSearchResult {
    pub fn from_payload(payload: Value) -> ApiResult<Self> {
        let (query, titles, descriptions, urls): (String, Vec<String>, Vec<String>, Vec<String>) =
            serde_json::from_value(payload).map_err(|err| {
                Error::new(ErrorKind::Decode)
                    .with_message("opensearch response is not a 4-tuple")
                    .with_source(err)
            })?;
        Ok(Self {
            query,
            titles,
            descriptions,
            urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{OpenSearch, OpenSearchResult};
    use crate::api::request::Limit;
    use serde_json::json;

    #[test]
    fn decodes_positional_tuple() {
        let result = OpenSearchResult::from_payload(json!([
            "rust",
            ["Rust", "Rust (language)"],
            ["", ""],
            ["https://w/Rust", "https://w/Rust_(language)"]
        ]))
        .expect("decode");
        assert_eq!(result.query, "rust");
        assert_eq!(result.titles.len(), 2);
        assert_eq!(result.urls[1], "https://w/Rust_(language)");
    }

    #[test]
    fn rejects_object_payload() {
        assert!(OpenSearchResult::from_payload(json!({"query": "x"})).is_err());
    }

    #[test]
    fn namespaces_join_with_pipes() {
        let mut search = OpenSearch::new("rust");
        search.namespace = vec![0, 14];
        search.limit = Some(Limit::Count(5));
        let pairs = search.to_request().expect("request").params().form_pairs();
        assert!(pairs.contains(&("namespace".to_string(), "0|14".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "5".to_string())));
    }
}
