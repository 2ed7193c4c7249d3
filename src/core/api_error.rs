//! Purpose: Classify wire-level `{code, info}` error payloads into typed failures.
//! Exports: `ApiError`, `RawApiError`, `ClassifyContext`, `classify`.
//! Role: Pure mapping from the service's error vocabulary onto a closed enum.
//! Invariants: Classification is total; every pair yields exactly one variant.
//! Invariants: Matching is by exact code; unknown codes keep code/info verbatim.
//! Invariants: Same input always yields a structurally equal output.
use super::error::{Error, ErrorKind};
use super::params::TokenType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error object exactly as the service sent it under the top-level `error` key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawApiError {
    pub code: String,
    #[serde(default)]
    pub info: String,
    /// Operation-specific sibling fields (`details`, `docref`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawApiError {
    pub fn new(code: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            info: info.into(),
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Extracts the error object from a full response payload.
    ///
    /// Returns `Ok(None)` when the payload carries no `error` key. An `error`
    /// key without a string `code` is a malformed payload, not an API error.
    pub fn from_payload(payload: &Value) -> Result<Option<Self>, Error> {
        let Some(error) = payload.get("error") else {
            return Ok(None);
        };
        serde_json::from_value(error.clone()).map(Some).map_err(|err| {
            Error::new(ErrorKind::Decode)
                .with_message("error payload is missing a string code")
                .with_source(err)
        })
    }

    fn detail(&self, index: usize) -> Option<&str> {
        self.extra
            .get("details")
            .and_then(Value::as_array)
            .and_then(|details| details.get(index))
            .and_then(Value::as_str)
    }
}

/// Request-side facts the classifier folds into the typed failure.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClassifyContext {
    pub title: Option<String>,
    pub target: Option<String>,
    pub token_type: Option<TokenType>,
    pub module: Option<String>,
    pub filename: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    /// Fallback for codes outside the table.
    #[error("api error {code}: {info}")]
    Unrecognized { code: String, info: String },

    #[error("article exists: {info}")]
    ArticleExists { title: Option<String>, info: String },

    #[error("bad token: {info}")]
    BadToken {
        token_type: Option<TokenType>,
        info: String,
    },

    #[error("extension disabled: {info}")]
    DisabledExtension {
        extension: Option<String>,
        info: String,
    },

    #[error("file exists with identical content: {info}")]
    FileExistsNoChange {
        filename: Option<String>,
        info: String,
    },

    #[error("file type mismatch: {info}")]
    FileTypeMismatch {
        extension: Option<String>,
        mime: Option<String>,
        info: String,
    },

    #[error("namespace does not allow moves: {info}")]
    ImmobileNamespace {
        namespace: Option<String>,
        info: String,
    },

    #[error("login failed: {reason}")]
    LoginFailed { reason: String },

    #[error("missing title: {info}")]
    MissingTitle { title: Option<String>, info: String },

    #[error("file cannot leave the file namespace: {info}")]
    NonFileNamespace { target: Option<String>, info: String },

    #[error("permission denied: {info}")]
    PermissionDenied { info: String },

    #[error("protected page: {info}")]
    ProtectedPage { title: Option<String>, info: String },

    #[error("protected title: {info}")]
    ProtectedTitle { title: Option<String>, info: String },

    #[error("self move: {info}")]
    SelfMove { title: Option<String>, info: String },

    #[error("unknown error: {info}")]
    UnknownError { info: String },
}

pub const LOGIN_FAILED_CODE: &str = "login-failed";

const FILETYPE_MISMATCH: &str = "filetype-mime-mismatch";

impl ApiError {
    /// Wire code this failure is keyed by.
    pub fn code(&self) -> &str {
        match self {
            Self::Unrecognized { code, .. } => code,
            Self::ArticleExists { .. } => "articleexists",
            Self::BadToken { .. } => "badtoken",
            Self::DisabledExtension { .. } => "moduledisabled",
            Self::FileExistsNoChange { .. } => "fileexists-no-change",
            Self::FileTypeMismatch { .. } => FILETYPE_MISMATCH,
            Self::ImmobileNamespace { .. } => "immobilenamespace",
            Self::LoginFailed { .. } => LOGIN_FAILED_CODE,
            Self::MissingTitle { .. } => "missingtitle",
            Self::NonFileNamespace { .. } => "nonfilenamespace",
            Self::PermissionDenied { .. } => "permissiondenied",
            Self::ProtectedPage { .. } => "protectedpage",
            Self::ProtectedTitle { .. } => "protectedtitle",
            Self::SelfMove { .. } => "selfmove",
            Self::UnknownError { .. } => "unknownerror",
        }
    }

    pub fn info(&self) -> &str {
        match self {
            Self::LoginFailed { reason } => reason,
            Self::Unrecognized { info, .. }
            | Self::ArticleExists { info, .. }
            | Self::BadToken { info, .. }
            | Self::DisabledExtension { info, .. }
            | Self::FileExistsNoChange { info, .. }
            | Self::FileTypeMismatch { info, .. }
            | Self::ImmobileNamespace { info, .. }
            | Self::MissingTitle { info, .. }
            | Self::NonFileNamespace { info, .. }
            | Self::PermissionDenied { info }
            | Self::ProtectedPage { info, .. }
            | Self::ProtectedTitle { info, .. }
            | Self::SelfMove { info, .. }
            | Self::UnknownError { info } => info,
        }
    }

    /// True when refreshing the token and resending could succeed.
    pub fn is_token_failure(&self) -> bool {
        matches!(self, Self::BadToken { .. })
    }
}

pub fn classify(raw: &RawApiError, ctx: &ClassifyContext) -> ApiError {
    let info = raw.info.clone();
    let title = ctx.title.clone();
    match raw.code.as_str() {
        "articleexists" => ApiError::ArticleExists { title, info },
        "badtoken" => ApiError::BadToken {
            token_type: ctx.token_type,
            info,
        },
        "moduledisabled" => ApiError::DisabledExtension {
            extension: ctx.module.clone(),
            info,
        },
        "fileexists-no-change" => ApiError::FileExistsNoChange {
            filename: ctx.filename.clone(),
            info,
        },
        FILETYPE_MISMATCH => file_type_mismatch(raw, ctx),
        "verification-error" if raw.detail(0) == Some(FILETYPE_MISMATCH) => {
            file_type_mismatch(raw, ctx)
        }
        "immobilenamespace" => ApiError::ImmobileNamespace {
            namespace: title.as_deref().and_then(namespace_prefix),
            info,
        },
        LOGIN_FAILED_CODE => ApiError::LoginFailed { reason: info },
        "missingtitle" => ApiError::MissingTitle { title, info },
        "nonfilenamespace" => ApiError::NonFileNamespace {
            target: ctx.target.clone(),
            info,
        },
        "permissiondenied" => ApiError::PermissionDenied { info },
        "protectedpage" => ApiError::ProtectedPage { title, info },
        "protectedtitle" => ApiError::ProtectedTitle { title, info },
        "selfmove" => ApiError::SelfMove { title, info },
        "unknownerror" => ApiError::UnknownError { info },
        _ => ApiError::Unrecognized {
            code: raw.code.clone(),
            info,
        },
    }
}

fn file_type_mismatch(raw: &RawApiError, ctx: &ClassifyContext) -> ApiError {
    let extension = raw.detail(1).map(str::to_string).or_else(|| {
        ctx.filename
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_string())
    });
    ApiError::FileTypeMismatch {
        extension,
        mime: raw.detail(2).map(str::to_string),
        info: raw.info.clone(),
    }
}

fn namespace_prefix(title: &str) -> Option<String> {
    title
        .split_once(':')
        .map(|(prefix, _)| prefix.trim().to_string())
        .filter(|prefix| !prefix.is_empty())
}
