//! Purpose: Decode list-query result pages and merge them into aggregates.
//! Exports: `ListPage`, `Aggregate`, `AuxSections`, `Continuation`, section records, `decode_page`.
//! Role: Pure half of the continuation engine; no transport calls happen here.
//! Invariants: Items keep the order the service emitted them, within and across pages.
//! Invariants: Auxiliary sections are unioned verbatim; duplicates are kept.
//! Invariants: A continuation handle is bound to the fingerprint of its originating request.
use super::error::{Error, ErrorKind};
use super::params::Params;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Generic continuation marker the service adds next to the module key.
pub const CONTINUE_KEY: &str = "continue";

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInfo {
    #[serde(default)]
    pub fromencoded: bool,
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InterwikiInfo {
    pub title: String,
    pub iw: String,
    /// Present when the request set `iwurl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RedirectInfo {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tofragment: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConvertedInfo {
    pub from: String,
    pub to: String,
}

/// Records describing how input titles were rewritten before matching.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AuxSections {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub normalized: Vec<NormalizedInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirects: Vec<RedirectInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interwiki: Vec<InterwikiInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub converted: Vec<ConvertedInfo>,
}

impl AuxSections {
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
            && self.redirects.is_empty()
            && self.interwiki.is_empty()
            && self.converted.is_empty()
    }

    pub fn extend(&mut self, other: AuxSections) {
        self.normalized.extend(other.normalized);
        self.redirects.extend(other.redirects);
        self.interwiki.extend(other.interwiki);
        self.converted.extend(other.converted);
    }
}

/// Resumption handle for a list query.
///
/// Holds every string field of the service's `continue` object, keyed so the
/// module's own key (`${shortname}continue`) is always present.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Continuation {
    key: String,
    token: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    extra: BTreeMap<String, String>,
    origin: String,
}

impl Continuation {
    pub fn new(key: impl Into<String>, token: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            token: token.into(),
            extra: BTreeMap::new(),
            origin: origin.into(),
        }
    }

    /// Module continuation key, e.g. `accontinue`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Fingerprint of the request that produced this handle.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Fields to overlay onto the originating request, module key first.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once((self.key.as_str(), self.token.as_str())).chain(
            self.extra
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        )
    }

    fn from_block(block: &BTreeMap<String, String>, shortname: &str, origin: &str) -> Option<Self> {
        let key = continue_key(shortname);
        let token = block.get(&key)?.clone();
        let extra = block
            .iter()
            .filter(|(name, _)| **name != key)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Some(Self {
            key,
            token,
            extra,
            origin: origin.to_string(),
        })
    }
}

pub fn continue_key(shortname: &str) -> String {
    format!("{shortname}continue")
}

/// Stable digest of a request's parameters, ignoring continuation fields.
pub fn fingerprint(params: &Params) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in params.form_pairs() {
        if key.ends_with(CONTINUE_KEY) {
            continue;
        }
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        hasher.update(value.as_bytes());
        hasher.update([0u8]);
    }
    for (key, part) in params.files() {
        hasher.update(key.as_bytes());
        hasher.update([1u8]);
        hasher.update(Sha256::digest(&part.contents));
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// One round-trip's worth of a list query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "AuxSections::is_empty")]
    pub aux: AuxSections,
    #[serde(rename = "continue", skip_serializing_if = "Option::is_none")]
    pub continuation: Option<Continuation>,
    pub batch_complete: bool,
}

/// Every page of one logical query, concatenated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Aggregate<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "AuxSections::is_empty")]
    pub aux: AuxSections,
    pub pages: usize,
}

impl<T> Default for Aggregate<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            aux: AuxSections::default(),
            pages: 0,
        }
    }
}

impl<T> Aggregate<T> {
    /// Appends a page, returning the continuation it carried.
    pub fn absorb(&mut self, page: ListPage<T>) -> Option<Continuation> {
        self.items.extend(page.items);
        self.aux.extend(page.aux);
        self.pages += 1;
        page.continuation
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    batchcomplete: bool,
    #[serde(default, rename = "continue")]
    continuation: Option<Map<String, Value>>,
    #[serde(default)]
    query: Option<Map<String, Value>>,
}

/// Decodes a success payload for the list query named `result_key`.
///
/// A payload without a `query` object is an empty page.
pub fn decode_page<T>(
    payload: Value,
    shortname: &str,
    result_key: &str,
    origin: &str,
) -> Result<ListPage<T>, Error>
where
    T: DeserializeOwned,
{
    let envelope: Envelope = serde_json::from_value(payload).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message("invalid list response envelope")
            .with_source(err)
    })?;

    let mut query = envelope.query.unwrap_or_default();
    let items = match query.remove(result_key) {
        Some(value) => serde_json::from_value(value).map_err(|err| {
            Error::new(ErrorKind::Decode)
                .with_message(format!("invalid {result_key} items"))
                .with_source(err)
        })?,
        None => Vec::new(),
    };
    let aux = AuxSections {
        normalized: section(&mut query, "normalized")?,
        redirects: section(&mut query, "redirects")?,
        interwiki: section(&mut query, "interwiki")?,
        converted: section(&mut query, "converted")?,
    };

    let block = continue_block(envelope.continuation.unwrap_or_default());
    let continuation = Continuation::from_block(&block, shortname, origin);

    Ok(ListPage {
        items,
        aux,
        continuation,
        batch_complete: envelope.batchcomplete,
    })
}

fn section<S: DeserializeOwned>(query: &mut Map<String, Value>, name: &str) -> Result<Vec<S>, Error> {
    match query.remove(name) {
        Some(value) => serde_json::from_value(value).map_err(|err| {
            Error::new(ErrorKind::Decode)
                .with_message(format!("invalid {name} section"))
                .with_source(err)
        }),
        None => Ok(Vec::new()),
    }
}

fn continue_block(raw: Map<String, Value>) -> BTreeMap<String, String> {
    raw.into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key, text)),
            Value::Number(number) => Some((key, number.to_string())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Aggregate, ListPage, decode_page, fingerprint};
    use crate::core::error::ErrorKind;
    use crate::core::params::Params;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Page {
        pageid: u64,
        ns: i64,
        title: String,
    }

    #[test]
    fn decodes_items_sections_and_continuation() {
        let payload = json!({
            "batchcomplete": true,
            "continue": {"apcontinue": "Beta", "continue": "-||"},
            "query": {
                "normalized": [{"fromencoded": false, "from": "alpha", "to": "Alpha"}],
                "allpages": [
                    {"pageid": 1, "ns": 0, "title": "Alpha"},
                    {"pageid": 2, "ns": 0, "title": "Alpine"}
                ]
            }
        });
        let page: ListPage<Page> = decode_page(payload, "ap", "allpages", "f00").expect("page");
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].title, "Alpine");
        assert_eq!(page.aux.normalized[0].to, "Alpha");
        assert!(page.batch_complete);

        let cont = page.continuation.expect("continuation");
        assert_eq!(cont.key(), "apcontinue");
        assert_eq!(cont.token(), "Beta");
        assert_eq!(cont.origin(), "f00");
        let fields: Vec<_> = cont.fields().collect();
        assert_eq!(fields, vec![("apcontinue", "Beta"), ("continue", "-||")]);
    }

    #[test]
    fn continue_object_without_module_key_ends_the_query() {
        let payload = json!({
            "continue": {"continue": "-||"},
            "query": {"allpages": []}
        });
        let page: ListPage<Page> = decode_page(payload, "ap", "allpages", "f").expect("page");
        assert!(page.continuation.is_none());
    }

    #[test]
    fn missing_query_is_an_empty_page() {
        let page: ListPage<Page> =
            decode_page(json!({"batchcomplete": true}), "ap", "allpages", "f").expect("page");
        assert!(page.items.is_empty());
        assert!(page.aux.is_empty());
    }

    #[test]
    fn string_page_ids_are_rejected() {
        let payload = json!({"query": {"allpages": [{"pageid": "1", "ns": 0, "title": "A"}]}});
        let err = decode_page::<Page>(payload, "ap", "allpages", "f").expect_err("coercion");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn aggregate_keeps_duplicate_sections() {
        let payload = json!({
            "query": {
                "redirects": [{"from": "A", "to": "B"}],
                "allpages": [{"pageid": 1, "ns": 0, "title": "B"}]
            }
        });
        let mut agg = Aggregate::default();
        agg.absorb(decode_page::<Page>(payload.clone(), "ap", "allpages", "f").expect("p1"));
        agg.absorb(decode_page::<Page>(payload, "ap", "allpages", "f").expect("p2"));
        assert_eq!(agg.items.len(), 2);
        assert_eq!(agg.aux.redirects.len(), 2);
        assert_eq!(agg.pages, 2);
    }

    #[test]
    fn fingerprint_ignores_continuation_fields() {
        let base = Params::new().with("action", "query").with("list", "allpages");
        let resumed = base.overlay([("apcontinue", "X"), ("continue", "-||")]);
        assert_eq!(fingerprint(&base), fingerprint(&resumed));

        let other = base.overlay([("apprefix", "Foo")]);
        assert_ne!(fingerprint(&base), fingerprint(&other));
    }
}
