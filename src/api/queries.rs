//! Purpose: Typed shapes for list-style query modules and their item records.
//! Exports: One request struct per module, its item type, and `RawListQuery`.
//! Role: Catalog half for paged queries; every shape implements `ListQuery`.
//! Invariants: Ids and sizes are integers, titles and timestamps stay strings.
//! Invariants: "Exactly one of" alternatives are enums, so a typed shape cannot violate them.
#![allow(clippy::result_large_err)]

use super::request::{ApiResult, Direction, Limit, ListQuery, Method, Request, RequestBuilder, TimeDirection};
use crate::core::params::{ParamValue, Params};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn list_value(items: &[String]) -> Option<ParamValue> {
    if items.is_empty() {
        None
    } else {
        Some(ParamValue::List(items.to_vec()))
    }
}

fn id_list(ids: &[u64]) -> ParamValue {
    ParamValue::from(ids)
}

fn namespace_list(namespaces: &[i64]) -> Option<ParamValue> {
    if namespaces.is_empty() {
        None
    } else {
        Some(ParamValue::from(namespaces))
    }
}

fn list_query(list: &str) -> RequestBuilder {
    Request::get("query").param("list", list)
}

fn prop_query(prop: &str, pages: &PageSet) -> RequestBuilder {
    pages.apply(Request::get("query").param("prop", prop))
}

/// Pages a `prop` module works on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PageSet {
    Titles(Vec<String>),
    PageIds(Vec<u64>),
    RevIds(Vec<u64>),
}

impl PageSet {
    pub fn title(title: impl Into<String>) -> Self {
        PageSet::Titles(vec![title.into()])
    }

    fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            PageSet::Titles(titles) => builder.param("titles", titles.clone()),
            PageSet::PageIds(ids) => builder.param("pageids", id_list(ids)),
            PageSet::RevIds(ids) => builder.param("revids", id_list(ids)),
        }
    }
}

/// Any list module, described at runtime. Items stay untyped JSON.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawListQuery {
    shortname: String,
    result_key: String,
    params: Params,
}

impl RawListQuery {
    /// `list=<name>` whose items live under `query.<name>`.
    pub fn list(name: &str, shortname: &str) -> Self {
        Self {
            shortname: shortname.to_string(),
            result_key: name.to_string(),
            params: Params::new().with("action", "query").with("list", name),
        }
    }

    /// `prop=<name>` whose items live under `query.pages`.
    pub fn prop(name: &str, shortname: &str) -> Self {
        Self {
            shortname: shortname.to_string(),
            result_key: "pages".to_string(),
            params: Params::new().with("action", "query").with("prop", name),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn with_result_key(mut self, result_key: &str) -> Self {
        self.result_key = result_key.to_string();
        self
    }
}

impl ListQuery for RawListQuery {
    type Item = Value;

    fn shortname(&self) -> &str {
        &self.shortname
    }

    fn result_key(&self) -> &str {
        &self.result_key
    }

    fn to_request(&self) -> ApiResult<Request> {
        Request::from_params(Method::Get, self.params.clone())
    }
}

// list=allcategories

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AllCategories {
    pub from: Option<String>,
    pub to: Option<String>,
    pub prefix: Option<String>,
    pub dir: Option<Direction>,
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub limit: Option<Limit>,
    /// `size` and/or `hidden`.
    pub prop: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcats: Option<u64>,
    #[serde(default)]
    pub hidden: bool,
}

impl ListQuery for AllCategories {
    type Item = CategoryEntry;

    fn shortname(&self) -> &str {
        "ac"
    }

    fn result_key(&self) -> &str {
        "allcategories"
    }

    fn to_request(&self) -> ApiResult<Request> {
        list_query("allcategories")
            .opt("acfrom", self.from.clone())
            .opt("acto", self.to.clone())
            .opt("acprefix", self.prefix.clone())
            .opt("acdir", self.dir)
            .opt("acmin", self.min)
            .opt("acmax", self.max)
            .opt("aclimit", self.limit)
            .opt("acprop", list_value(&self.prop))
            .build()
    }
}

// list=allimages

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageSort {
    Name,
    Timestamp,
}

impl ImageSort {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSort::Name => "name",
            ImageSort::Timestamp => "timestamp",
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AllImages {
    pub sort: Option<ImageSort>,
    pub dir: Option<Direction>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub prefix: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub minsize: Option<u64>,
    pub maxsize: Option<u64>,
    pub user: Option<String>,
    pub limit: Option<Limit>,
    pub prop: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub name: String,
    pub ns: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptionurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptionshorturl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ListQuery for AllImages {
    type Item = ImageEntry;

    fn shortname(&self) -> &str {
        "ai"
    }

    fn result_key(&self) -> &str {
        "allimages"
    }

    fn to_request(&self) -> ApiResult<Request> {
        list_query("allimages")
            .opt("aisort", self.sort.map(ImageSort::as_str))
            .opt("aidir", self.dir)
            .opt("aifrom", self.from.clone())
            .opt("aito", self.to.clone())
            .opt("aiprefix", self.prefix.clone())
            .opt("aistart", self.start.clone())
            .opt("aiend", self.end.clone())
            .opt("aiminsize", self.minsize)
            .opt("aimaxsize", self.maxsize)
            .opt("aiuser", self.user.clone())
            .opt("ailimit", self.limit)
            .opt("aiprop", list_value(&self.prop))
            .build()
    }
}

// list=allpages

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RedirectFilter {
    #[default]
    All,
    Redirects,
    NonRedirects,
}

impl RedirectFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            RedirectFilter::All => "all",
            RedirectFilter::Redirects => "redirects",
            RedirectFilter::NonRedirects => "nonredirects",
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AllPages {
    pub from: Option<String>,
    pub to: Option<String>,
    pub prefix: Option<String>,
    pub namespace: Option<i64>,
    pub filterredir: Option<RedirectFilter>,
    pub minsize: Option<u64>,
    pub maxsize: Option<u64>,
    pub limit: Option<Limit>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub pageid: u64,
    pub ns: i64,
    pub title: String,
}

impl ListQuery for AllPages {
    type Item = PageEntry;

    fn shortname(&self) -> &str {
        "ap"
    }

    fn result_key(&self) -> &str {
        "allpages"
    }

    fn to_request(&self) -> ApiResult<Request> {
        list_query("allpages")
            .opt("apfrom", self.from.clone())
            .opt("apto", self.to.clone())
            .opt("apprefix", self.prefix.clone())
            .opt("apnamespace", self.namespace)
            .opt("apfilterredir", self.filterredir.map(RedirectFilter::as_str))
            .opt("apminsize", self.minsize)
            .opt("apmaxsize", self.maxsize)
            .opt("aplimit", self.limit)
            .build()
    }
}

// list=categorymembers

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CategoryTarget {
    /// Category title including its namespace prefix.
    Title(String),
    PageId(u64),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemberType {
    Page,
    Subcat,
    File,
}

impl MemberType {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberType::Page => "page",
            MemberType::Subcat => "subcat",
            MemberType::File => "file",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryMembers {
    pub target: CategoryTarget,
    pub namespace: Vec<i64>,
    pub member_types: Vec<MemberType>,
    pub dir: Option<Direction>,
    pub limit: Option<Limit>,
    pub prop: Vec<String>,
}

impl CategoryMembers {
    pub fn new(target: CategoryTarget) -> Self {
        Self {
            target,
            namespace: Vec::new(),
            member_types: Vec::new(),
            dir: None,
            limit: None,
            prop: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryMember {
    pub pageid: u64,
    pub ns: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortkey: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub member_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ListQuery for CategoryMembers {
    type Item = CategoryMember;

    fn shortname(&self) -> &str {
        "cm"
    }

    fn result_key(&self) -> &str {
        "categorymembers"
    }

    fn to_request(&self) -> ApiResult<Request> {
        let builder = match &self.target {
            CategoryTarget::Title(title) => list_query("categorymembers").param("cmtitle", title.as_str()),
            CategoryTarget::PageId(id) => list_query("categorymembers").param("cmpageid", *id),
        };
        let types: Vec<String> = self
            .member_types
            .iter()
            .map(|kind| kind.as_str().to_string())
            .collect();
        builder
            .opt("cmnamespace", namespace_list(&self.namespace))
            .opt("cmtype", list_value(&types))
            .opt("cmdir", self.dir)
            .opt("cmlimit", self.limit)
            .opt("cmprop", list_value(&self.prop))
            .build()
    }
}

// list=logevents

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LogEvents {
    /// Log type, e.g. `delete` or `move`.
    pub log_type: Option<String>,
    /// `type/action`, overrides `log_type`.
    pub action: Option<String>,
    pub user: Option<String>,
    pub title: Option<String>,
    pub namespace: Option<i64>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub dir: Option<TimeDirection>,
    pub limit: Option<Limit>,
    pub prop: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub logid: u64,
    pub ns: i64,
    pub title: String,
    pub pageid: u64,
    pub logpage: u64,
    #[serde(rename = "type")]
    pub log_type: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Type-specific details (`params` on the wire).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl ListQuery for LogEvents {
    type Item = LogEvent;

    fn shortname(&self) -> &str {
        "le"
    }

    fn result_key(&self) -> &str {
        "logevents"
    }

    fn to_request(&self) -> ApiResult<Request> {
        list_query("logevents")
            .opt("letype", self.log_type.clone())
            .opt("leaction", self.action.clone())
            .opt("leuser", self.user.clone())
            .opt("letitle", self.title.clone())
            .opt("lenamespace", self.namespace)
            .opt("lestart", self.start.clone())
            .opt("leend", self.end.clone())
            .opt("ledir", self.dir)
            .opt("lelimit", self.limit)
            .opt("leprop", list_value(&self.prop))
            .build()
    }
}

// list=recentchanges

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecentChanges {
    pub namespace: Vec<i64>,
    pub user: Option<String>,
    pub excludeuser: Option<String>,
    pub title: Option<String>,
    /// `edit`, `new`, `log`, `categorize`.
    pub change_types: Vec<String>,
    pub show: Vec<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub dir: Option<TimeDirection>,
    pub toponly: bool,
    pub limit: Option<Limit>,
    pub prop: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RecentChange {
    #[serde(rename = "type")]
    pub change_type: String,
    pub ns: i64,
    pub title: String,
    pub pageid: u64,
    pub revid: u64,
    pub old_revid: u64,
    pub rcid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldlen: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newlen: Option<u64>,
}

impl ListQuery for RecentChanges {
    type Item = RecentChange;

    fn shortname(&self) -> &str {
        "rc"
    }

    fn result_key(&self) -> &str {
        "recentchanges"
    }

    fn to_request(&self) -> ApiResult<Request> {
        list_query("recentchanges")
            .opt("rcnamespace", namespace_list(&self.namespace))
            .opt("rcuser", self.user.clone())
            .opt("rcexcludeuser", self.excludeuser.clone())
            .opt("rctitle", self.title.clone())
            .opt("rctype", list_value(&self.change_types))
            .opt("rcshow", list_value(&self.show))
            .opt("rcstart", self.start.clone())
            .opt("rcend", self.end.clone())
            .opt("rcdir", self.dir)
            .flag("rctoponly", self.toponly)
            .opt("rclimit", self.limit)
            .opt("rcprop", list_value(&self.prop))
            .build()
    }
}

// list=usercontribs

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContribsTarget {
    Users(Vec<String>),
    UserIds(Vec<u64>),
    Prefix(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserContribs {
    pub target: ContribsTarget,
    pub namespace: Vec<i64>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub dir: Option<TimeDirection>,
    pub show: Vec<String>,
    pub tag: Option<String>,
    pub limit: Option<Limit>,
    pub prop: Vec<String>,
}

impl UserContribs {
    pub fn new(target: ContribsTarget) -> Self {
        Self {
            target,
            namespace: Vec::new(),
            start: None,
            end: None,
            dir: None,
            show: Vec::new(),
            tag: None,
            limit: None,
            prop: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub userid: u64,
    pub user: String,
    pub pageid: u64,
    pub revid: u64,
    pub parentid: u64,
    pub ns: i64,
    pub title: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ListQuery for UserContribs {
    type Item = Contribution;

    fn shortname(&self) -> &str {
        "uc"
    }

    fn result_key(&self) -> &str {
        "usercontribs"
    }

    fn to_request(&self) -> ApiResult<Request> {
        let builder = match &self.target {
            ContribsTarget::Users(users) => list_query("usercontribs").param("ucuser", users.clone()),
            ContribsTarget::UserIds(ids) => list_query("usercontribs").param("ucuserids", id_list(ids)),
            ContribsTarget::Prefix(prefix) => list_query("usercontribs").param("ucuserprefix", prefix.as_str()),
        };
        builder
            .opt("ucnamespace", namespace_list(&self.namespace))
            .opt("ucstart", self.start.clone())
            .opt("ucend", self.end.clone())
            .opt("ucdir", self.dir)
            .opt("ucshow", list_value(&self.show))
            .opt("uctag", self.tag.clone())
            .opt("uclimit", self.limit)
            .opt("ucprop", list_value(&self.prop))
            .build()
    }
}

// list=users

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UsersTarget {
    Names(Vec<String>),
    Ids(Vec<u64>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Users {
    pub target: UsersTarget,
    pub prop: Vec<String>,
}

impl Users {
    pub fn new(target: UsersTarget) -> Self {
        Self {
            target,
            prop: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Absent for users that do not exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub missing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editcount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rights: Vec<String>,
}

impl ListQuery for Users {
    type Item = UserEntry;

    fn shortname(&self) -> &str {
        "us"
    }

    fn result_key(&self) -> &str {
        "users"
    }

    fn to_request(&self) -> ApiResult<Request> {
        let builder = match &self.target {
            UsersTarget::Names(names) => list_query("users").param("ususers", names.clone()),
            UsersTarget::Ids(ids) => list_query("users").param("ususerids", id_list(ids)),
        };
        builder.opt("usprop", list_value(&self.prop)).build()
    }
}

// prop=info

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Info {
    pub pages: PageSet,
    pub prop: Vec<String>,
    pub redirects: bool,
    pub converttitles: bool,
}

impl Info {
    pub fn new(pages: PageSet) -> Self {
        Self {
            pages,
            prop: Vec::new(),
            redirects: false,
            converttitles: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProtectionEntry {
    #[serde(rename = "type")]
    pub action: String,
    pub level: String,
    pub expiry: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Absent for missing or invalid titles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageid: Option<u64>,
    pub ns: i64,
    pub title: String,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub invalid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contentmodel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagelanguage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touched: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastrevid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(default)]
    pub redirect: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection: Option<Vec<ProtectionEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaytitle: Option<String>,
}

impl ListQuery for Info {
    type Item = PageInfo;

    fn shortname(&self) -> &str {
        "in"
    }

    fn result_key(&self) -> &str {
        "pages"
    }

    fn to_request(&self) -> ApiResult<Request> {
        prop_query("info", &self.pages)
            .opt("inprop", list_value(&self.prop))
            .flag("redirects", self.redirects)
            .flag("converttitles", self.converttitles)
            .build()
    }
}

// prop=linkshere / prop=transcludedin

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PageRef {
    pub pageid: u64,
    pub ns: i64,
    pub title: String,
    #[serde(default)]
    pub redirect: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinksHere {
    pub pages: PageSet,
    pub namespace: Vec<i64>,
    /// `redirect` or `!redirect`.
    pub show: Option<String>,
    pub limit: Option<Limit>,
}

impl LinksHere {
    pub fn new(pages: PageSet) -> Self {
        Self {
            pages,
            namespace: Vec::new(),
            show: None,
            limit: None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LinkedPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageid: Option<u64>,
    pub ns: i64,
    pub title: String,
    #[serde(default)]
    pub missing: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linkshere: Vec<PageRef>,
}

impl ListQuery for LinksHere {
    type Item = LinkedPage;

    fn shortname(&self) -> &str {
        "lh"
    }

    fn result_key(&self) -> &str {
        "pages"
    }

    fn to_request(&self) -> ApiResult<Request> {
        prop_query("linkshere", &self.pages)
            .param("lhprop", &["pageid", "title", "redirect"][..])
            .opt("lhnamespace", namespace_list(&self.namespace))
            .opt("lhshow", self.show.clone())
            .opt("lhlimit", self.limit)
            .build()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TranscludedIn {
    pub pages: PageSet,
    pub namespace: Vec<i64>,
    pub show: Option<String>,
    pub limit: Option<Limit>,
}

impl TranscludedIn {
    pub fn new(pages: PageSet) -> Self {
        Self {
            pages,
            namespace: Vec::new(),
            show: None,
            limit: None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransclusionPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageid: Option<u64>,
    pub ns: i64,
    pub title: String,
    #[serde(default)]
    pub missing: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transcludedin: Vec<PageRef>,
}

impl ListQuery for TranscludedIn {
    type Item = TransclusionPage;

    fn shortname(&self) -> &str {
        "ti"
    }

    fn result_key(&self) -> &str {
        "pages"
    }

    fn to_request(&self) -> ApiResult<Request> {
        prop_query("transcludedin", &self.pages)
            .param("tiprop", &["pageid", "title", "redirect"][..])
            .opt("tinamespace", namespace_list(&self.namespace))
            .opt("tishow", self.show.clone())
            .opt("tilimit", self.limit)
            .build()
    }
}

// prop=revisions

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Revisions {
    pub pages: PageSet,
    pub prop: Vec<String>,
    pub limit: Option<Limit>,
    pub dir: Option<TimeDirection>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub user: Option<String>,
    pub excludeuser: Option<String>,
}

impl Revisions {
    /// Latest revision content of the main slot.
    pub fn content(pages: PageSet) -> Self {
        Self {
            pages,
            prop: vec![
                "ids".to_string(),
                "timestamp".to_string(),
                "content".to_string(),
            ],
            limit: None,
            dir: None,
            start: None,
            end: None,
            user: None,
            excludeuser: None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RevisionSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contentmodel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contentformat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parentid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slots: BTreeMap<String, RevisionSlot>,
}

impl Revision {
    pub fn main_content(&self) -> Option<&str> {
        self.slots.get("main").and_then(|slot| slot.content.as_deref())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RevisionPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageid: Option<u64>,
    pub ns: i64,
    pub title: String,
    #[serde(default)]
    pub missing: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revisions: Vec<Revision>,
}

impl ListQuery for Revisions {
    type Item = RevisionPage;

    fn shortname(&self) -> &str {
        "rv"
    }

    fn result_key(&self) -> &str {
        "pages"
    }

    fn to_request(&self) -> ApiResult<Request> {
        prop_query("revisions", &self.pages)
            .param("rvslots", "main")
            .opt("rvprop", list_value(&self.prop))
            .opt("rvlimit", self.limit)
            .opt("rvdir", self.dir)
            .opt("rvstart", self.start.clone())
            .opt("rvend", self.end.clone())
            .opt("rvuser", self.user.clone())
            .opt("rvexcludeuser", self.excludeuser.clone())
            .build()
    }
}
