//! Purpose: Define a stable, structured schema for non-fatal stderr notices.
//! Exports: `Notice`, `notice_json`, `interruption_notice`.
//! Role: CLI diagnostics for events that are not errors (interrupted drains).
//! Invariants: Notices are non-fatal and never alter stdout payloads.
//! Invariants: JSON schema is stable once published; fields are additive-only.
use serde_json::{Map, Value, json};
use wikiquery::api::{Continuation, Interruption};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub time: String,
    pub cmd: String,
    pub module: String,
    pub message: String,
    pub details: Map<String, Value>,
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind));
    inner.insert("time".to_string(), json!(notice.time));
    inner.insert("cmd".to_string(), json!(notice.cmd));
    inner.insert("module".to_string(), json!(notice.module));
    inner.insert("message".to_string(), json!(notice.message));
    inner.insert("details".to_string(), Value::Object(notice.details.clone()));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

/// Describes a drain that stopped before the service ran out of pages.
pub fn interruption_notice(
    time: String,
    module: &str,
    reason: Interruption,
    pages: usize,
    items: usize,
    resume: Option<&Continuation>,
) -> Notice {
    let message = match reason {
        Interruption::Cancelled => format!("drain cancelled after {pages} pages"),
        Interruption::PageLimit => format!("drain stopped at the page limit ({pages} pages)"),
        Interruption::ItemLimit => format!("drain stopped at the item limit ({items} items)"),
    };
    let mut details = Map::new();
    details.insert("pages".to_string(), json!(pages));
    details.insert("items".to_string(), json!(items));
    if let Some(resume) = resume.and_then(|handle| serde_json::to_value(handle).ok()) {
        details.insert("resume".to_string(), resume);
    }
    Notice {
        kind: "interrupted".to_string(),
        time,
        cmd: "list".to_string(),
        module: module.to_string(),
        message,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::{Notice, interruption_notice, notice_json};
    use serde_json::{Map, Value};
    use wikiquery::api::{Continuation, Interruption};

    #[test]
    fn notice_json_has_required_fields() {
        let mut details = Map::new();
        details.insert("pages".to_string(), Value::from(3));

        let notice = Notice {
            kind: "interrupted".to_string(),
            time: "2026-02-01T00:00:00Z".to_string(),
            cmd: "list".to_string(),
            module: "allpages".to_string(),
            message: "drain cancelled after 3 pages".to_string(),
            details,
        };

        let value = notice_json(&notice);
        let obj = value
            .get("notice")
            .and_then(|v| v.as_object())
            .expect("notice object");

        assert_eq!(obj.get("kind").and_then(|v| v.as_str()), Some("interrupted"));
        assert_eq!(
            obj.get("time").and_then(|v| v.as_str()),
            Some("2026-02-01T00:00:00Z")
        );
        assert_eq!(obj.get("cmd").and_then(|v| v.as_str()), Some("list"));
        assert_eq!(obj.get("module").and_then(|v| v.as_str()), Some("allpages"));
        assert!(obj.get("details").and_then(|v| v.as_object()).is_some());
    }

    #[test]
    fn interruption_notice_carries_resume_handle() {
        let resume = Continuation::new("apcontinue", "B", "f00d");
        let notice = interruption_notice(
            "2026-02-01T00:00:00Z".to_string(),
            "allpages",
            Interruption::PageLimit,
            2,
            10,
            Some(&resume),
        );
        assert_eq!(notice.message, "drain stopped at the page limit (2 pages)");
        let handle = notice.details.get("resume").expect("resume");
        assert_eq!(handle.get("token").and_then(Value::as_str), Some("B"));
    }
}
