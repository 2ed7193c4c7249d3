//! Purpose: Integration tests for single-result operations and error classification.
//! Exports: None (integration test module).
//! Role: Exercise `WikiClient` operations end to end against scripted replies.
//! Invariants: Invalid request shapes never reach the transport.

use serde_json::json;
use wikiquery::api::actions::{
    Block, Edit, Move, MoveSource, PageTarget, Parse, ParseInput, Protect, Protection,
    ProtectionAction, ProtectionLevel, Purge, PurgeTargets, Upload, UploadSource,
};
use wikiquery::api::meta::{AllMessages, FileRepoInfoRequest};
use wikiquery::api::search::OpenSearch;
use wikiquery::api::{
    ApiError, DrainOptions, ErrorKind, ExclusiveGroup, Method, Params, Request, ScriptedTransport,
    TokenType, WikiClient,
};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

#[test]
fn edit_round_trip() -> TestResult<()> {
    let client = WikiClient::new(ScriptedTransport::new().push_payload(json!({
        "edit": {
            "result": "Success", "pageid": 15, "title": "Sandbox",
            "contentmodel": "wikitext", "oldrevid": 100, "newrevid": 101,
            "newtimestamp": "2026-01-02T03:04:05Z"
        }
    })));
    let mut edit = Edit::new(PageTarget::title("Sandbox"), "hello", "+\\");
    edit.summary = Some("test".to_string());
    let result = client.edit(&edit)?;
    assert_eq!(result.newrevid, Some(101));
    assert_eq!(result.newtimestamp.as_deref(), Some("2026-01-02T03:04:05Z"));

    let sent = &client.transport().calls()[0];
    assert_eq!(sent.method(), Method::Post);
    assert_eq!(sent.params().text("token"), Some("+\\"));
    assert_eq!(sent.params().text("summary"), Some("test"));
    Ok(())
}

#[test]
fn bad_token_keeps_token_type() {
    let client = WikiClient::new(
        ScriptedTransport::new().push_error("badtoken", "Invalid CSRF token."),
    );
    let err = client
        .edit(&Edit::new(PageTarget::PageId(3), "x", "stale"))
        .expect_err("bad token");
    let api = err.api_error().expect("classified");
    assert!(api.is_token_failure());
    assert_eq!(
        api,
        &ApiError::BadToken {
            token_type: Some(TokenType::Csrf),
            info: "Invalid CSRF token.".to_string(),
        }
    );
    // No retry happens inside the client.
    assert_eq!(client.transport().call_count(), 1);
}

#[test]
fn move_failures_carry_titles() {
    let client = WikiClient::new(
        ScriptedTransport::new()
            .push_error("selfmove", "The title is the same; cannot move a page over itself.")
            .push_error("immobilenamespace", "You cannot move pages in this namespace.")
            .push_error("articleexists", "A page of that name already exists."),
    );
    let same = Move::new(MoveSource::Title("A".to_string()), "A", "+\\");
    let err = client.move_page(&same).expect_err("selfmove");
    assert!(matches!(
        err.api_error(),
        Some(ApiError::SelfMove { title: Some(title), .. }) if title == "A"
    ));

    let special = Move::new(MoveSource::Title("Special:Foo".to_string()), "Bar", "+\\");
    let err = client.move_page(&special).expect_err("immobile");
    assert!(matches!(
        err.api_error(),
        Some(ApiError::ImmobileNamespace { namespace: Some(ns), .. }) if ns == "Special"
    ));

    let taken = Move::new(MoveSource::PageId(9), "Taken", "+\\");
    let err = client.move_page(&taken).expect_err("exists");
    assert!(matches!(err.api_error(), Some(ApiError::ArticleExists { .. })));
}

#[test]
fn protect_and_block_decode_results() -> TestResult<()> {
    let client = WikiClient::new(
        ScriptedTransport::new()
            .push_payload(json!({"protect": {
                "title": "Main Page", "reason": "vandalism",
                "protections": [{"edit": "sysop", "expiry": "infinite"}]
            }}))
            .push_payload(json!({"block": {
                "user": "Vandal", "userID": 77, "expiry": "infinite",
                "id": 12, "reason": "spam", "nocreate": true
            }})),
    );
    let protect = Protect::new(
        PageTarget::title("Main Page"),
        vec![Protection {
            action: ProtectionAction::Edit,
            level: ProtectionLevel::Sysop,
        }],
        "+\\",
    );
    let protected = client.protect(&protect)?;
    assert_eq!(protected.protections[0].get("edit").map(String::as_str), Some("sysop"));

    let mut block = Block::new("Vandal", "+\\");
    block.nocreate = true;
    let blocked = client.block(&block)?;
    assert_eq!(blocked.user_id, 77);
    assert!(blocked.nocreate);
    Ok(())
}

#[test]
fn upload_mime_mismatch_names_extension() {
    let client = WikiClient::new(ScriptedTransport::new().push_payload(json!({
        "error": {
            "code": "verification-error",
            "info": "File extension does not match the detected MIME type of the file.",
            "details": ["filetype-mime-mismatch", "png", "image/jpeg"]
        }
    })));
    let upload = Upload::new(
        "Photo.png",
        UploadSource::Url("https://img.example/photo".to_string()),
        "+\\",
    );
    let err = client.upload(&upload).expect_err("mismatch");
    assert_eq!(
        err.api_error(),
        Some(&ApiError::FileTypeMismatch {
            extension: Some("png".to_string()),
            mime: Some("image/jpeg".to_string()),
            info: "File extension does not match the detected MIME type of the file.".to_string(),
        })
    );
}

#[test]
fn parse_and_purge() -> TestResult<()> {
    let client = WikiClient::new(
        ScriptedTransport::new()
            .push_payload(json!({"parse": {
                "title": "Main Page", "pageid": 1, "revid": 42,
                "text": "<p>Hello</p>", "categories": []
            }}))
            .push_payload(json!({"batchcomplete": true, "purge": [
                {"ns": 0, "title": "Main Page", "purged": true},
                {"ns": 0, "title": "Nope", "missing": true}
            ]})),
    );
    let parsed = client.parse(&Parse::new(ParseInput::Page("Main Page".to_string())))?;
    assert_eq!(parsed.text.as_deref(), Some("<p>Hello</p>"));
    assert_eq!(client.transport().calls()[0].method(), Method::Get);

    let purged = client.purge(&Purge::new(PurgeTargets::Titles(vec![
        "Main Page".to_string(),
        "Nope".to_string(),
    ])))?;
    assert!(purged[0].purged);
    assert!(purged[1].missing);
    Ok(())
}

#[test]
fn opensearch_round_trip() -> TestResult<()> {
    let client = WikiClient::new(ScriptedTransport::new().push_payload(json!([
        "Rus", ["Rust"], [""], ["https://wiki.example/wiki/Rust"]
    ])));
    let result = client.search(&OpenSearch::new("Rus"))?;
    assert_eq!(result.titles, vec!["Rust".to_string()]);
    Ok(())
}

#[test]
fn invalid_shapes_never_reach_the_transport() {
    let groups: [ExclusiveGroup; 3] = [
        wikiquery::core::exclusive::DELETE_TARGET,
        wikiquery::core::exclusive::PURGE_TARGETS,
        wikiquery::core::exclusive::USERS_TARGET,
    ];
    for group in groups {
        let mut params = Params::new().with("action", group.name);
        if group.name == "users" {
            params = Params::new().with("action", "query").with("list", "users");
        }
        let none = Request::from_params(Method::Post, params.clone());
        assert_eq!(
            none.expect_err("zero keys").kind(),
            ErrorKind::InvalidRequest,
            "{} with no keys",
            group.name
        );
        let all: Params = group
            .keys
            .iter()
            .fold(params.clone(), |acc, key| acc.with(*key, "1"));
        assert_eq!(
            Request::from_params(Method::Post, all).expect_err("all keys").kind(),
            ErrorKind::InvalidRequest
        );
        let one = params.with(group.keys[0], "1");
        assert!(Request::from_params(Method::Post, one).is_ok());
    }
}

#[test]
fn false_flag_target_is_not_a_target() {
    let err = Request::post("delete")
        .param("title", false)
        .build()
        .expect_err("no target on the wire");
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

#[test]
fn multi_module_list_is_validated_before_dispatch() {
    let params = Params::new()
        .with("action", "query")
        .with("list", "usercontribs|users")
        .with("ucuser", "A")
        .with("ucuserids", 1u64)
        .with("ucuserprefix", "B")
        .with("ususers", "A");
    let err = Request::from_params(Method::Get, params).expect_err("three usercontribs targets");
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

#[test]
fn allmessages_pages_through_amcontinue() -> TestResult<()> {
    let client = WikiClient::new(
        ScriptedTransport::new()
            .push_payload(json!({
                "continue": {"amcontinue": "aboutsite", "continue": "-||"},
                "query": {"allmessages": [
                    {"name": "about", "normalizedname": "about", "content": "About"}
                ]}
            }))
            .push_payload(json!({
                "batchcomplete": true,
                "query": {"allmessages": [
                    {"name": "aboutsite", "normalizedname": "aboutsite", "content": "About {{SITENAME}}"}
                ]}
            })),
    );
    let aggregate = client
        .drain(&AllMessages::default(), &DrainOptions::default())?
        .into_aggregate();
    let names: Vec<&str> = aggregate.items.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["about", "aboutsite"]);
    assert_eq!(
        client.transport().calls()[1].params().text("amcontinue"),
        Some("aboutsite")
    );
    Ok(())
}

#[test]
fn file_repos_are_listed() -> TestResult<()> {
    let client = WikiClient::new(ScriptedTransport::new().push_payload(json!({
        "batchcomplete": true,
        "query": {"repos": [
            {"name": "local", "displayname": "Local", "url": "https://wiki.example/images", "local": true},
            {"name": "shared", "displayname": "Shared", "url": "https://shared.example/images"}
        ]}
    })));
    let repos = client.file_repos(&FileRepoInfoRequest::default())?;
    assert_eq!(repos.len(), 2);
    assert!(repos[0].local);
    assert!(!repos[1].local);
    Ok(())
}
