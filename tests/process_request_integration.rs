//! Integration tests for the full request pipeline.
//!
//! Each test drives `process_request` end-to-end against a
//! `RecordingTransport` and asserts on the complete recorded call
//! sequence, the envelope JSON, and the archived page payload.

use serde_json::Value;

use notionslot::config::{Config, FieldSpec, PropertyKind};
use notionslot::envelope::ResponseEnvelope;
use notionslot::processor::{Submission, process_request};
use notionslot::transport::{RecordingTransport, TransportCall};

fn config() -> Config {
    Config {
        notion_token: "secret_test".into(),
        notion_db_id: "db-123".into(),
        site_domain: "foo.example".into(),
        site_name: "My Foo".into(),
        notify_to: "me@foo.example".into(),
        reply_to: "hello@foo.example".into(),
        mail_from: "noreply@foo.example".into(),
        ..Config::default()
    }
}

fn submission() -> Submission {
    Submission::from([
        ("name".to_string(), "linyows".to_string()),
        ("email".to_string(), "linyows@foo.example".to_string()),
        ("message".to_string(), "Yo!".to_string()),
        ("ip".to_string(), "192.168.10.1".to_string()),
    ])
}

#[test]
fn valid_post_produces_headers_mails_archive_and_ok_envelope() {
    let mut transport = RecordingTransport::new();
    transport.http_response = r#"{"id":"page-1"}"#.to_string();
    let mut archived = Vec::new();
    let mut sink = |body: &str| archived.push(body.to_string());

    let envelope = process_request(
        config(),
        Some("POST"),
        submission(),
        &mut transport,
        Some(&mut sink),
    )
    .unwrap();

    assert_eq!(envelope.to_json().unwrap(), r#"{"ok":true,"errors":[]}"#);
    assert_eq!(archived, [r#"{"id":"page-1"}"#]);

    // 10 headers, then notify, reply, archive — nothing else.
    assert_eq!(transport.calls.len(), 13);
    assert_eq!(transport.headers().len(), 10);
    assert_eq!(
        transport.headers()[0],
        "Strict-Transport-Security: max-age=31536000; includeSubdomains; preload"
    );
    assert_eq!(
        transport.mail_recipients(),
        ["me@foo.example", "linyows@foo.example"]
    );

    let TransportCall::HttpPost { url, headers, body } = &transport.calls[12] else {
        panic!("expected the archive POST last, got {:?}", transport.calls[12]);
    };
    assert_eq!(url, "https://api.notion.com/v1/pages");
    assert!(
        headers.contains(&("Authorization".to_string(), "Bearer secret_test".to_string()))
    );
    assert!(headers.contains(&("Notion-Version".to_string(), "2022-06-28".to_string())));

    let page: Value = serde_json::from_str(body).unwrap();
    assert_eq!(page["parent"]["database_id"], "db-123");
    let keys: Vec<&String> = page["properties"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["Full name", "Email address", "IP"]);
}

#[test]
fn invalid_submission_yields_422_and_error_envelope() {
    let mut transport = RecordingTransport::new();
    let partial = Submission::from([("name".to_string(), "linyows".to_string())]);

    let envelope =
        process_request(config(), Some("POST"), partial, &mut transport, None).unwrap();

    assert_eq!(
        envelope,
        ResponseEnvelope::invalid(vec![
            "email is required".into(),
            "ip is required".into(),
            "message is required".into(),
        ])
    );
    assert_eq!(
        transport.calls.last(),
        Some(&TransportCall::SetResponseStatus(422))
    );
    assert!(transport.mail_recipients().is_empty());
}

#[test]
fn get_request_is_redirected_home_and_halted() {
    let mut transport = RecordingTransport::new();

    let envelope =
        process_request(config(), Some("GET"), submission(), &mut transport, None).unwrap();

    assert!(envelope.ok);
    assert_eq!(
        transport.calls,
        vec![
            TransportCall::SetHeader("Location: https://foo.example".into()),
            TransportCall::HaltProcess(1),
        ]
    );
}

#[test]
fn custom_field_schema_drives_validation_mail_and_archive() {
    let mut cfg = config();
    cfg.mail_to_key = "contact".into();
    cfg.fields = vec![
        FieldSpec::new("subject", true, "Subject", PropertyKind::Title),
        FieldSpec::new("contact", true, "Contact", PropertyKind::Email),
        FieldSpec::new("body", false, "Body", PropertyKind::Block),
    ];
    let data = Submission::from([
        ("subject".to_string(), "Hi".to_string()),
        ("contact".to_string(), "a@b.example".to_string()),
        ("body".to_string(), "one\\ntwo\\nthree".to_string()),
    ]);

    let mut transport = RecordingTransport::new();
    let envelope = process_request(cfg, Some("POST"), data, &mut transport, None).unwrap();
    assert!(envelope.ok);

    assert_eq!(
        transport.mail_recipients(),
        ["me@foo.example", "a@b.example"]
    );

    let TransportCall::HttpPost { body, .. } = transport.calls.last().unwrap() else {
        panic!("expected the archive POST last");
    };
    let page: Value = serde_json::from_str(body).unwrap();
    let keys: Vec<&String> = page["properties"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["Subject", "Contact"]);
    assert_eq!(page["children"].as_array().unwrap().len(), 3);
}
