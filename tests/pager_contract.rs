//! Purpose: Contract tests for list paging over a scripted transport.
//! Exports: None (integration test module).
//! Role: Pin round-trip counts, request overlays, ordering, cancellation, and error handling.
//! Invariants: No network; every reply comes from `ScriptedTransport`.

use serde_json::{Value, json};
use wikiquery::api::queries::{AllCategories, CategoryEntry, RawListQuery};
use wikiquery::api::{
    ApiError, CancelToken, DrainOptions, DrainOutcome, ErrorKind, Interruption, Limit, ListQuery,
    MergeMode, Paged, ScriptedTransport, WikiClient,
};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

fn categories_page(names: &[&str], token: Option<&str>) -> Value {
    let items: Vec<Value> = names.iter().map(|name| json!({"category": name})).collect();
    match token {
        Some(token) => json!({
            "continue": {"accontinue": token, "continue": "-||"},
            "query": {"allcategories": items}
        }),
        None => json!({"batchcomplete": true, "query": {"allcategories": items}}),
    }
}

fn two_page_transport() -> ScriptedTransport {
    ScriptedTransport::new()
        .push_payload(categories_page(&["Alpha", "Beta"], Some("abc")))
        .push_payload(categories_page(&["Gamma"], None))
}

fn names(items: &[CategoryEntry]) -> Vec<&str> {
    items.iter().map(|entry| entry.category.as_str()).collect()
}

fn query() -> AllCategories {
    AllCategories {
        limit: Some(Limit::Count(2)),
        ..Default::default()
    }
}

#[test]
fn drain_concatenates_pages_in_order() -> TestResult<()> {
    let client = WikiClient::new(two_page_transport());
    let outcome = client.drain(&query(), &DrainOptions::default())?;
    let DrainOutcome::Complete(aggregate) = outcome else {
        return Err("drain did not complete".into());
    };
    assert_eq!(names(&aggregate.items), vec!["Alpha", "Beta", "Gamma"]);
    assert_eq!(aggregate.pages, 2);

    let calls = client.transport().calls();
    assert_eq!(calls.len(), 2);
    let first = query().to_request()?;
    assert_eq!(calls[0], first);
    assert_eq!(
        calls[1].params(),
        &first
            .params()
            .overlay([("accontinue", "abc"), ("continue", "-||")])
    );
    assert_eq!(calls[1].params().text("accontinue"), Some("abc"));
    Ok(())
}

#[test]
fn drain_overlays_only_the_module_token() -> TestResult<()> {
    let transport = ScriptedTransport::new()
        .push_payload(json!({
            "continue": {"accontinue": "abc"},
            "query": {"allcategories": [{"category": "Alpha"}, {"category": "Beta"}]}
        }))
        .push_payload(categories_page(&["Gamma"], None));
    let client = WikiClient::new(transport);
    let aggregate = client
        .drain(&query(), &DrainOptions::default())?
        .into_aggregate();
    assert_eq!(names(&aggregate.items), vec!["Alpha", "Beta", "Gamma"]);

    let calls = client.transport().calls();
    assert_eq!(calls.len(), 2);
    let first = query().to_request()?;
    assert_eq!(calls[0], first);
    assert_eq!(calls[1].params(), &first.params().overlay([("accontinue", "abc")]));
    assert_eq!(calls[1].params().len(), first.params().len() + 1);
    Ok(())
}

#[test]
fn single_page_returns_first_page_and_handle() -> TestResult<()> {
    let client = WikiClient::new(two_page_transport());
    let paged = client.paginate(&query(), MergeMode::SinglePage, &DrainOptions::default(), None)?;
    let Paged::Page(page) = paged else {
        return Err("expected a single page".into());
    };
    assert_eq!(names(&page.items), vec!["Alpha", "Beta"]);
    let handle = page.continuation.ok_or("missing continuation")?;
    assert_eq!(handle.key(), "accontinue");
    assert_eq!(handle.token(), "abc");
    assert!(!page.batch_complete);
    assert_eq!(client.transport().call_count(), 1);
    Ok(())
}

#[test]
fn resuming_with_handle_fetches_the_rest() -> TestResult<()> {
    let client = WikiClient::new(two_page_transport());
    let first = client.list_page(&query(), None)?;
    let handle = first.continuation.ok_or("missing continuation")?;
    let second = client.list_page(&query(), Some(&handle))?;
    assert_eq!(names(&second.items), vec!["Gamma"]);
    assert!(second.continuation.is_none());
    assert!(second.batch_complete);
    assert_eq!(
        client.transport().calls()[1].params().text("accontinue"),
        Some("abc")
    );
    Ok(())
}

#[test]
fn handles_do_not_transfer_between_queries() -> TestResult<()> {
    let client = WikiClient::new(two_page_transport());
    let handle = client
        .list_page(&query(), None)?
        .continuation
        .ok_or("missing continuation")?;

    let other = AllCategories {
        prefix: Some("G".to_string()),
        ..query()
    };
    let err = client
        .list_page(&other, Some(&handle))
        .expect_err("foreign handle");
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(client.transport().call_count(), 1);
    Ok(())
}

#[test]
fn cancel_between_pages_keeps_first_page() -> TestResult<()> {
    let cancel = CancelToken::new();
    let trip = cancel.clone();
    let transport = two_page_transport().on_dispatch(move |call| {
        if call == 1 {
            trip.cancel();
        }
    });
    let client = WikiClient::new(transport);
    let outcome = client.drain(&query(), &DrainOptions::default().with_cancel(cancel))?;

    match outcome {
        DrainOutcome::Interrupted {
            partial,
            reason,
            resume,
        } => {
            assert_eq!(reason, Interruption::Cancelled);
            assert_eq!(names(&partial.items), vec!["Alpha", "Beta"]);
            assert_eq!(resume.map(|handle| handle.token().to_string()), Some("abc".to_string()));
        }
        DrainOutcome::Complete(_) => return Err("drain ignored cancellation".into()),
    }
    assert_eq!(client.transport().call_count(), 1);
    assert_eq!(client.transport().remaining(), 1);
    Ok(())
}

#[test]
fn error_mid_drain_is_terminal() {
    let transport = ScriptedTransport::new()
        .push_payload(categories_page(&["Alpha", "Beta"], Some("abc")))
        .push_error("internal_api_error_DBQueryError", "Database query error.")
        .push_payload(categories_page(&["Gamma"], None));
    let client = WikiClient::new(transport);
    let err = client
        .drain(&query(), &DrainOptions::default())
        .expect_err("second page fails");
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(
        err.api_error(),
        Some(&ApiError::Unrecognized {
            code: "internal_api_error_DBQueryError".to_string(),
            info: "Database query error.".to_string(),
        })
    );
    assert_eq!(client.transport().call_count(), 2);
    assert_eq!(client.transport().remaining(), 1);
}

#[test]
fn transport_fault_is_not_an_api_error() {
    let transport = ScriptedTransport::new()
        .push_payload(categories_page(&["Alpha"], Some("abc")))
        .push_fault(ErrorKind::Transport, "timed out");
    let client = WikiClient::new(transport);
    let err = client
        .drain(&query(), &DrainOptions::default())
        .expect_err("fault");
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.api_error().is_none());
}

#[test]
fn auxiliary_sections_union_without_dedup() -> TestResult<()> {
    let normalized = json!([{"fromencoded": false, "from": "main page", "to": "Main page"}]);
    let transport = ScriptedTransport::new()
        .push_payload(json!({
            "continue": {"rvcontinue": "20240101|5"},
            "query": {
                "normalized": normalized,
                "pages": [{"pageid": 1, "ns": 0, "title": "Main page", "revisions": [{"revid": 9}]}]
            }
        }))
        .push_payload(json!({
            "batchcomplete": true,
            "query": {
                "normalized": normalized,
                "pages": [{"pageid": 1, "ns": 0, "title": "Main page", "revisions": [{"revid": 5}]}]
            }
        }));
    let client = WikiClient::new(transport);
    let query = RawListQuery::prop("revisions", "rv").with("titles", "main page");
    let aggregate = client
        .drain(&query, &DrainOptions::default())?
        .into_aggregate();
    assert_eq!(aggregate.items.len(), 2);
    assert_eq!(aggregate.aux.normalized.len(), 2);
    assert_eq!(aggregate.aux.normalized[0], aggregate.aux.normalized[1]);
    Ok(())
}

#[test]
fn string_ids_are_decode_faults() {
    let transport = ScriptedTransport::new().push_payload(json!({
        "query": {"allpages": [{"pageid": "12", "ns": 0, "title": "A"}]}
    }));
    let client = WikiClient::new(transport);
    let err = client
        .list_page(&wikiquery::api::queries::AllPages::default(), None)
        .expect_err("string pageid");
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn every_call_uses_json_format_version_2() -> TestResult<()> {
    let client = WikiClient::new(two_page_transport());
    client.drain(&query(), &DrainOptions::default())?;
    assert!(
        client
            .transport()
            .formats()
            .iter()
            .all(|format| *format == wikiquery::api::Format::JsonV2)
    );
    Ok(())
}
