//! Purpose: `meta=` query modules: tokens, siteinfo, userinfo, allmessages, filerepoinfo.
//! Exports: `TokensRequest`, `Tokens`, `SiteInfoRequest`, `SiteInfo`, `UserInfo`,
//! `AllMessages`, `Message`, `FileRepoInfoRequest`, `FileRepo`.
//! Role: Single-page meta shapes, plus `allmessages`, which pages through `amcontinue`.
#![allow(clippy::result_large_err)]

use super::request::{ApiResult, ListQuery, Request};
use crate::core::error::{Error, ErrorKind};
use crate::core::params::{ParamValue, TokenType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Decodes `payload.query.<key>`.
pub fn decode_query_section<T: DeserializeOwned>(payload: &Value, key: &str) -> ApiResult<T> {
    let section = payload
        .get("query")
        .and_then(|query| query.get(key))
        .cloned()
        .ok_or_else(|| {
            Error::new(ErrorKind::Decode).with_message(format!("response is missing query.{key}"))
        })?;
    serde_json::from_value(section).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message(format!("unexpected query.{key} shape"))
            .with_source(err)
    })
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokensRequest {
    pub types: Vec<TokenType>,
}

impl TokensRequest {
    pub fn new(types: impl IntoIterator<Item = TokenType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    pub fn to_request(&self) -> ApiResult<Request> {
        if self.types.is_empty() {
            return Err(Error::invalid_request("tokens request names no token types"));
        }
        let types: Vec<String> = self.types.iter().map(|t| t.as_str().to_string()).collect();
        Request::get("query")
            .param("meta", "tokens")
            .param("type", types)
            .build()
    }
}

/// Token values keyed by their response key, e.g. `csrftoken`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tokens(pub BTreeMap<String, String>);

impl Tokens {
    pub fn get(&self, token_type: TokenType) -> Option<&str> {
        self.0.get(&token_type.response_key()).map(String::as_str)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SiteInfoRequest {
    /// Sections to fetch; `general` when empty.
    pub prop: Vec<String>,
}

impl Default for SiteInfoRequest {
    fn default() -> Self {
        Self {
            prop: vec!["general".to_string(), "statistics".to_string()],
        }
    }
}

impl SiteInfoRequest {
    pub fn to_request(&self) -> ApiResult<Request> {
        let prop = if self.prop.is_empty() {
            vec!["general".to_string()]
        } else {
            self.prop.clone()
        };
        Request::get("query")
            .param("meta", "siteinfo")
            .param("siprop", prop)
            .build()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SiteGeneral {
    pub sitename: String,
    pub mainpage: String,
    pub base: String,
    pub generator: String,
    pub lang: String,
    pub server: String,
    pub scriptpath: String,
    pub articlepath: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikiid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxuploadsize: Option<u64>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub writeapi: bool,
    #[serde(default)]
    pub uploadsenabled: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SiteStatistics {
    pub pages: u64,
    pub articles: u64,
    pub edits: u64,
    pub images: u64,
    pub users: u64,
    pub activeusers: u64,
    pub admins: u64,
    pub jobs: u64,
}

/// Selected siteinfo sections; anything else is kept raw in `other`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SiteInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general: Option<SiteGeneral>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<SiteStatistics>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

pub fn userinfo_request() -> ApiResult<Request> {
    Request::get("query")
        .param("meta", "userinfo")
        .param("uiprop", &["groups", "rights"][..])
        .build()
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Zero for anonymous sessions.
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub anon: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rights: Vec<String>,
}

// meta=allmessages

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Customised {
    All,
    Modified,
    Unmodified,
}

impl Customised {
    pub fn as_str(self) -> &'static str {
        match self {
            Customised::All => "all",
            Customised::Modified => "modified",
            Customised::Unmodified => "unmodified",
        }
    }
}

impl From<Customised> for ParamValue {
    fn from(value: Customised) -> Self {
        ParamValue::from(value.as_str())
    }
}

/// Interface messages; `messages` empty means all of them (`*`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AllMessages {
    pub messages: Vec<String>,
    pub args: Vec<String>,
    pub filter: Option<String>,
    pub customised: Option<Customised>,
    pub lang: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub prefix: Option<String>,
    pub title: Option<String>,
    pub enableparser: bool,
    pub nocontent: bool,
    pub includelocal: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalizedname: Option<String>,
    /// Absent with `amnocontent` or for missing messages.
    #[serde(default, alias = "*", skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub customised: bool,
}

impl ListQuery for AllMessages {
    type Item = Message;

    fn shortname(&self) -> &str {
        "am"
    }

    fn result_key(&self) -> &str {
        "allmessages"
    }

    fn to_request(&self) -> ApiResult<Request> {
        let messages = if self.messages.is_empty() {
            vec!["*".to_string()]
        } else {
            self.messages.clone()
        };
        let args = (!self.args.is_empty()).then(|| self.args.clone());
        Request::get("query")
            .param("meta", "allmessages")
            .param("ammessages", messages)
            .opt("amargs", args)
            .opt("amfilter", self.filter.clone())
            .opt("amcustomised", self.customised)
            .opt("amlang", self.lang.clone())
            .opt("amfrom", self.from.clone())
            .opt("amto", self.to.clone())
            .opt("amprefix", self.prefix.clone())
            .opt("amtitle", self.title.clone())
            .flag("amenableparser", self.enableparser)
            .flag("amnocontent", self.nocontent)
            .flag("amincludelocal", self.includelocal)
            .build()
    }
}

// meta=filerepoinfo

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FileRepoInfoRequest {
    /// `friprop` values; the service default set when empty.
    pub prop: Vec<String>,
}

impl FileRepoInfoRequest {
    pub fn to_request(&self) -> ApiResult<Request> {
        let prop = (!self.prop.is_empty()).then(|| self.prop.clone());
        Request::get("query")
            .param("meta", "filerepoinfo")
            .opt("friprop", prop)
            .build()
    }
}

/// One file repository; properties outside the common three stay raw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileRepo {
    pub name: String,
    pub displayname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub local: bool,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}
