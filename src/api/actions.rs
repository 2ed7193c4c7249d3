//! Purpose: Request and response shapes for write and parse actions.
//! Exports: `Edit`, `Move`, `Delete`, `Protect`, `Block`, `Upload`, `Parse`, `Login`, `Purge` and their results.
//! Role: Catalog half for single-result operations; `WikiClient` dispatches them.
//! Invariants: Each response decodes from the object under its action name.
//! Invariants: Exclusive alternatives (title/pageid, from/fromid, file/url, purge targets) are enums.
#![allow(clippy::result_large_err)]

use super::request::{ApiResult, Request, RequestBuilder};
use crate::core::error::{Error, ErrorKind};
use crate::core::params::{FilePart, ParamValue, TokenType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// An action whose success payload is one object under `action_key`.
pub trait Action {
    type Output: DeserializeOwned;

    fn action_key(&self) -> &'static str;

    fn to_request(&self) -> ApiResult<Request>;
}

/// Pulls `payload[key]` and decodes it as `T`.
pub fn decode_result<T: DeserializeOwned>(payload: Value, key: &str) -> ApiResult<T> {
    let Value::Object(mut map) = payload else {
        return Err(Error::new(ErrorKind::Decode).with_message("response is not a JSON object"));
    };
    let section = map.remove(key).ok_or_else(|| {
        Error::new(ErrorKind::Decode).with_message(format!("response is missing the {key} object"))
    })?;
    serde_json::from_value(section).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message(format!("unexpected {key} result shape"))
            .with_source(err)
    })
}

/// A page addressed by title or by id.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PageTarget {
    Title(String),
    PageId(u64),
}

impl PageTarget {
    pub fn title(title: impl Into<String>) -> Self {
        PageTarget::Title(title.into())
    }

    fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            PageTarget::Title(title) => builder.param("title", title.as_str()),
            PageTarget::PageId(id) => builder.param("pageid", *id),
        }
    }
}

fn write(action: &str, token: &str) -> RequestBuilder {
    Request::post(action).token("token", TokenType::Csrf, token)
}

// action=edit

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Edit {
    pub target: PageTarget,
    pub text: String,
    pub token: String,
    pub summary: Option<String>,
    pub appendtext: Option<String>,
    pub prependtext: Option<String>,
    pub undo: Option<u64>,
    pub undoafter: Option<u64>,
    pub minor: bool,
    pub notminor: bool,
    pub bot: bool,
    pub createonly: bool,
    pub nocreate: bool,
    pub recreate: bool,
}

impl Edit {
    pub fn new(target: PageTarget, text: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            target,
            text: text.into(),
            token: token.into(),
            summary: None,
            appendtext: None,
            prependtext: None,
            undo: None,
            undoafter: None,
            minor: false,
            notminor: false,
            bot: false,
            createonly: false,
            nocreate: false,
            recreate: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EditResult {
    pub result: String,
    pub pageid: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldrevid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newrevid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newtimestamp: Option<String>,
    /// Set when the submitted text matched the current revision.
    #[serde(default)]
    pub nochange: bool,
}

impl Action for Edit {
    type Output = EditResult;

    fn action_key(&self) -> &'static str {
        "edit"
    }

    fn to_request(&self) -> ApiResult<Request> {
        self.target
            .apply(write("edit", &self.token))
            .param("text", self.text.as_str())
            .opt("summary", self.summary.clone())
            .opt("appendtext", self.appendtext.clone())
            .opt("prependtext", self.prependtext.clone())
            .opt("undo", self.undo)
            .opt("undoafter", self.undoafter)
            .flag("minor", self.minor)
            .flag("notminor", self.notminor)
            .flag("bot", self.bot)
            .flag("createonly", self.createonly)
            .flag("nocreate", self.nocreate)
            .flag("recreate", self.recreate)
            .build()
    }
}

// action=move

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MoveSource {
    Title(String),
    PageId(u64),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Move {
    pub source: MoveSource,
    pub to: String,
    pub token: String,
    pub reason: Option<String>,
    pub movetalk: bool,
    pub movesubpages: bool,
    pub noredirect: bool,
    pub ignorewarnings: bool,
}

impl Move {
    pub fn new(source: MoveSource, to: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            source,
            to: to.into(),
            token: token.into(),
            reason: None,
            movetalk: false,
            movesubpages: false,
            noredirect: false,
            ignorewarnings: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MoveResult {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talkfrom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talkto: Option<String>,
    #[serde(default)]
    pub redirectcreated: bool,
}

impl Action for Move {
    type Output = MoveResult;

    fn action_key(&self) -> &'static str {
        "move"
    }

    fn to_request(&self) -> ApiResult<Request> {
        let builder = match &self.source {
            MoveSource::Title(title) => write("move", &self.token).param("from", title.as_str()),
            MoveSource::PageId(id) => write("move", &self.token).param("fromid", *id),
        };
        builder
            .param("to", self.to.as_str())
            .opt("reason", self.reason.clone())
            .flag("movetalk", self.movetalk)
            .flag("movesubpages", self.movesubpages)
            .flag("noredirect", self.noredirect)
            .flag("ignorewarnings", self.ignorewarnings)
            .build()
    }
}

// action=delete

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Delete {
    pub target: PageTarget,
    pub token: String,
    pub reason: Option<String>,
}

impl Delete {
    pub fn new(target: PageTarget, token: impl Into<String>) -> Self {
        Self {
            target,
            token: token.into(),
            reason: None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub title: String,
    pub reason: String,
    pub logid: u64,
}

impl Action for Delete {
    type Output = DeleteResult;

    fn action_key(&self) -> &'static str {
        "delete"
    }

    fn to_request(&self) -> ApiResult<Request> {
        self.target
            .apply(write("delete", &self.token))
            .opt("reason", self.reason.clone())
            .build()
    }
}

// action=protect

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProtectionAction {
    Edit,
    Move,
    Create,
    Upload,
}

impl ProtectionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtectionAction::Edit => "edit",
            ProtectionAction::Move => "move",
            ProtectionAction::Create => "create",
            ProtectionAction::Upload => "upload",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProtectionLevel {
    All,
    Autoconfirmed,
    Sysop,
}

impl ProtectionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtectionLevel::All => "all",
            ProtectionLevel::Autoconfirmed => "autoconfirmed",
            ProtectionLevel::Sysop => "sysop",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Protection {
    pub action: ProtectionAction,
    pub level: ProtectionLevel,
}

impl Protection {
    fn encode(self) -> String {
        format!("{}={}", self.action.as_str(), self.level.as_str())
    }
}

/// Actions missing from `protections` lose their restriction; an empty list unprotects.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Protect {
    pub target: PageTarget,
    pub protections: Vec<Protection>,
    pub token: String,
    pub expiry: Option<String>,
    pub reason: Option<String>,
    pub cascade: bool,
}

impl Protect {
    pub fn new(target: PageTarget, protections: Vec<Protection>, token: impl Into<String>) -> Self {
        Self {
            target,
            protections,
            token: token.into(),
            expiry: None,
            reason: None,
            cascade: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProtectResult {
    pub title: String,
    pub reason: String,
    /// One `{action: level, expiry}` map per applied protection.
    #[serde(default)]
    pub protections: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    pub cascade: bool,
}

impl Action for Protect {
    type Output = ProtectResult;

    fn action_key(&self) -> &'static str {
        "protect"
    }

    fn to_request(&self) -> ApiResult<Request> {
        let protections: Vec<String> = self.protections.iter().map(|p| p.encode()).collect();
        self.target
            .apply(write("protect", &self.token))
            .param("protections", ParamValue::List(protections))
            .opt("expiry", self.expiry.clone())
            .opt("reason", self.reason.clone())
            .flag("cascade", self.cascade)
            .build()
    }
}

// action=block

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Block {
    pub user: String,
    pub token: String,
    /// Relative (`2 weeks`) or absolute; the service defaults to `never`.
    pub expiry: Option<String>,
    pub reason: Option<String>,
    pub anononly: bool,
    pub nocreate: bool,
    pub autoblock: bool,
    pub noemail: bool,
    pub allowusertalk: bool,
    pub reblock: bool,
}

impl Block {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
            expiry: None,
            reason: None,
            anononly: false,
            nocreate: false,
            autoblock: false,
            noemail: false,
            allowusertalk: false,
            reblock: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockResult {
    pub user: String,
    #[serde(rename = "userID")]
    pub user_id: u64,
    pub id: u64,
    pub expiry: String,
    pub reason: String,
    #[serde(default)]
    pub anononly: bool,
    #[serde(default)]
    pub nocreate: bool,
    #[serde(default)]
    pub autoblock: bool,
    #[serde(default)]
    pub noemail: bool,
    #[serde(default)]
    pub allowusertalk: bool,
}

impl Action for Block {
    type Output = BlockResult;

    fn action_key(&self) -> &'static str {
        "block"
    }

    fn to_request(&self) -> ApiResult<Request> {
        write("block", &self.token)
            .param("user", self.user.as_str())
            .opt("expiry", self.expiry.clone())
            .opt("reason", self.reason.clone())
            .flag("anononly", self.anononly)
            .flag("nocreate", self.nocreate)
            .flag("autoblock", self.autoblock)
            .flag("noemail", self.noemail)
            .flag("allowusertalk", self.allowusertalk)
            .flag("reblock", self.reblock)
            .build()
    }
}

// action=upload

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UploadSource {
    File(FilePart),
    Url(String),
}

impl UploadSource {
    /// Reads a local file into an upload part named after its file name.
    pub fn from_path(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read(path).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("failed to read upload source {}", path.display()))
                .with_source(err)
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(UploadSource::File(FilePart { filename, contents }))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Upload {
    pub filename: String,
    pub source: UploadSource,
    pub token: String,
    pub comment: Option<String>,
    pub text: Option<String>,
    pub ignorewarnings: bool,
}

impl Upload {
    pub fn new(filename: impl Into<String>, source: UploadSource, token: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source,
            token: token.into(),
            comment: None,
            text: None,
            ignorewarnings: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    /// `Success`, `Warning`, or another service outcome.
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filekey: Option<String>,
}

impl Action for Upload {
    type Output = UploadResult;

    fn action_key(&self) -> &'static str {
        "upload"
    }

    fn to_request(&self) -> ApiResult<Request> {
        let builder = write("upload", &self.token).param("filename", self.filename.as_str());
        let builder = match &self.source {
            UploadSource::File(part) => builder.param("file", part.clone()),
            UploadSource::Url(url) => builder.param("url", url.as_str()),
        };
        builder
            .opt("comment", self.comment.clone())
            .opt("text", self.text.clone())
            .flag("ignorewarnings", self.ignorewarnings)
            .build()
    }
}

// action=parse

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseInput {
    /// Parse the current revision of an existing page.
    Page(String),
    PageId(u64),
    /// Parse free text, optionally in the context of `title`.
    Text { text: String, title: Option<String> },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Parse {
    pub input: ParseInput,
    pub prop: Vec<String>,
    pub contentmodel: Option<String>,
    pub disableeditsection: bool,
    pub disablelimitreport: bool,
    pub disabletoc: bool,
    pub redirects: bool,
}

impl Parse {
    pub fn new(input: ParseInput) -> Self {
        Self {
            input,
            prop: Vec::new(),
            contentmodel: None,
            disableeditsection: false,
            disablelimitreport: false,
            disabletoc: false,
            redirects: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParseLink {
    pub ns: i64,
    pub title: String,
    #[serde(default)]
    pub exists: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParseCategory {
    pub sortkey: String,
    pub category: String,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParseSection {
    pub toclevel: u64,
    pub level: String,
    pub line: String,
    pub number: String,
    pub index: String,
    pub anchor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byteoffset: Option<u64>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub title: String,
    pub pageid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revid: Option<u64>,
    /// Rendered HTML; a plain string in version 2 responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaytitle: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<ParseCategory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<ParseLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<ParseLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub externallinks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<ParseSection>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Action for Parse {
    type Output = ParseResult;

    fn action_key(&self) -> &'static str {
        "parse"
    }

    fn to_request(&self) -> ApiResult<Request> {
        let builder = Request::get("parse");
        let builder = match &self.input {
            ParseInput::Page(page) => builder.param("page", page.as_str()),
            ParseInput::PageId(id) => builder.param("pageid", *id),
            ParseInput::Text { text, title } => builder
                .param("text", text.as_str())
                .opt("title", title.clone()),
        };
        let prop = (!self.prop.is_empty()).then(|| self.prop.clone());
        builder
            .opt("prop", prop)
            .opt("contentmodel", self.contentmodel.clone())
            .flag("disableeditsection", self.disableeditsection)
            .flag("disablelimitreport", self.disablelimitreport)
            .flag("disabletoc", self.disabletoc)
            .flag("redirects", self.redirects)
            .build()
    }
}

// action=login

#[derive(Clone, Eq, PartialEq)]
pub struct Login {
    pub name: String,
    pub password: String,
    pub token: String,
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Login")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl Login {
    pub fn new(name: impl Into<String>, password: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            token: token.into(),
        }
    }
}

/// Raw `login` object; `result` decides success.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LoginOutcome {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lguserid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lgusername: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LoginSuccess {
    pub lguserid: u64,
    pub lgusername: String,
}

impl LoginOutcome {
    /// `Ok` only for `result == "Success"`; anything else yields the failure reason.
    pub fn into_success(self) -> Result<LoginSuccess, String> {
        match (self.result.as_str(), self.lguserid, self.lgusername) {
            ("Success", Some(lguserid), Some(lgusername)) => Ok(LoginSuccess {
                lguserid,
                lgusername,
            }),
            (result, _, _) => Err(self
                .reason
                .unwrap_or_else(|| format!("login returned {result}"))),
        }
    }
}

impl Action for Login {
    type Output = LoginOutcome;

    fn action_key(&self) -> &'static str {
        "login"
    }

    fn to_request(&self) -> ApiResult<Request> {
        Request::post("login")
            .param("lgname", self.name.as_str())
            .param("lgpassword", self.password.as_str())
            .token("lgtoken", TokenType::Login, &self.token)
            .build()
    }
}

// action=purge

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PurgeTargets {
    Titles(Vec<String>),
    PageIds(Vec<u64>),
    RevIds(Vec<u64>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Purge {
    pub targets: PurgeTargets,
    pub forcelinkupdate: bool,
    pub forcerecursivelinkupdate: bool,
    pub redirects: bool,
    pub converttitles: bool,
}

impl Purge {
    pub fn new(targets: PurgeTargets) -> Self {
        Self {
            targets,
            forcelinkupdate: false,
            forcerecursivelinkupdate: false,
            redirects: false,
            converttitles: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PurgeEntry {
    pub ns: i64,
    pub title: String,
    #[serde(default)]
    pub purged: bool,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub invalid: bool,
}

impl Action for Purge {
    type Output = Vec<PurgeEntry>;

    fn action_key(&self) -> &'static str {
        "purge"
    }

    fn to_request(&self) -> ApiResult<Request> {
        let builder = Request::post("purge");
        let builder = match &self.targets {
            PurgeTargets::Titles(titles) => builder.param("titles", titles.clone()),
            PurgeTargets::PageIds(ids) => builder.param("pageids", &ids[..]),
            PurgeTargets::RevIds(ids) => builder.param("revids", &ids[..]),
        };
        builder
            .flag("forcelinkupdate", self.forcelinkupdate)
            .flag("forcerecursivelinkupdate", self.forcerecursivelinkupdate)
            .flag("redirects", self.redirects)
            .flag("converttitles", self.converttitles)
            .build()
    }
}
