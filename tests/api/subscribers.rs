use chrono::{Duration, Utc};
use linkify::{LinkFinder, LinkKind};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

use amahirwe_api::config::HandlerOptions;

use crate::helpers::{TestApp, ADMIN_TOKEN, CLIENT_URL, CREATOR_TOKEN, VISITOR_TOKEN};

#[tokio::test]
async fn subscribe_returns_200_with_only_id_name_and_email() {
    let test_app = TestApp::spawn_app().await;
    test_app.accept_emails().await;

    let response = test_app
        .post_json(
            "/subscribers",
            &json!({ "name": "Frank", "email": "frank@test.com" }),
            None,
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let subscriber = body["subscriber"].as_object().unwrap();
    let mut keys: Vec<&str> = subscriber.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["_id", "email", "name"]);
    assert_eq!(subscriber["name"], "Frank");
    assert_eq!(subscriber["email"], "frank@test.com");
}

#[tokio::test]
async fn subscribe_persists_the_new_subscriber() {
    let test_app = TestApp::spawn_app().await;
    test_app.accept_emails().await;

    test_app
        .post_json(
            "/subscribers",
            &json!({ "name": "Test", "email": "test@test.com" }),
            None,
        )
        .await;

    let subscribers = test_app.subscribers.all();
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].email.as_ref(), "test@test.com");
    assert_eq!(subscribers[0].name.as_ref(), "Test");
}

#[tokio::test]
async fn subscribe_sends_a_welcome_email_with_an_unsubscribe_link() {
    let test_app = TestApp::spawn_app().await;
    test_app.accept_emails().await;

    test_app
        .post_json(
            "/subscribers",
            &json!({ "name": "Frank", "email": "frank@test.com" }),
            None,
        )
        .await;

    let emails = test_app.sent_emails(1).await;
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "frank@test.com");
    assert_eq!(emails[0].subject, "Thank you for subscribing to amahirwe!");

    let links: Vec<_> = LinkFinder::new()
        .links(&emails[0].html)
        .filter(|link| *link.kind() == LinkKind::Url)
        .collect();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].as_str(), format!("{}/unsubscribe", CLIENT_URL));
}

#[tokio::test]
async fn subscribe_returns_400_when_a_field_is_missing() {
    let test_app = TestApp::spawn_app().await;

    // Table-driven: every body below must be refused before touching storage
    let test_cases = vec![
        (json!({}), "missing name and email"),
        (json!({ "name": "Frank" }), "missing email"),
        (json!({ "email": "frank@test.com" }), "missing name"),
        (json!({ "name": "", "email": "frank@test.com" }), "empty name"),
    ];

    for (body, description) in test_cases {
        let response = test_app.post_json("/subscribers", &body, None).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "msg": "Please fill all the fields" }));
    }

    assert_eq!(test_app.subscribers.calls(), 0);
}

#[tokio::test]
async fn subscribe_returns_400_when_a_field_is_invalid() {
    let test_app = TestApp::spawn_app().await;

    let test_cases = vec![
        (json!({ "name": "Frank", "email": "frank.test.com" }), "invalid email"),
        (json!({ "name": "   ", "email": "frank@test.com" }), "blank name"),
    ];

    for (body, description) in test_cases {
        let response = test_app.post_json("/subscribers", &body, None).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload had an {}.",
            description
        );
    }

    assert!(test_app.subscribers.all().is_empty());
}

#[tokio::test]
async fn subscribe_accepts_names_with_punctuation() {
    let test_app = TestApp::spawn_app().await;
    test_app.accept_emails().await;

    for (name, email) in [("Fr{a}nk", "frank@test.com"), ("Ada (Lovelace)", "ada@test.com")] {
        let response = test_app
            .post_json("/subscribers", &json!({ "name": name, "email": email }), None)
            .await;

        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["subscriber"]["name"], name);
    }

    assert_eq!(test_app.subscribers.all().len(), 2);
}

#[tokio::test]
async fn subscribe_returns_400_when_it_cannot_be_stored() {
    let test_app = TestApp::spawn_app().await;
    test_app.accept_emails().await;
    test_app.subscribers.fail_writes.store(true, Ordering::SeqCst);

    let response = test_app
        .post_json(
            "/subscribers",
            &json!({ "name": "Frank", "email": "frank@test.com" }),
            None,
        )
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "msg": "Something went wrong while subscribing!" }));
    assert!(test_app.subscribers.all().is_empty());
    assert!(test_app.emails_after_settling().await.is_empty());
}

#[tokio::test]
async fn subscribing_twice_returns_400_and_keeps_one_record() {
    let test_app = TestApp::spawn_app().await;
    test_app.accept_emails().await;
    let body = json!({ "name": "Frank", "email": "frank@test.com" });

    let first = test_app.post_json("/subscribers", &body, None).await;
    let second = test_app.post_json("/subscribers", &body, None).await;

    assert_eq!(200, first.status().as_u16());
    assert_eq!(400, second.status().as_u16());
    let error: Value = second.json().await.unwrap();
    assert_eq!(error, json!({ "msg": "You had already subscribed!" }));
    assert_eq!(test_app.subscribers.all().len(), 1);
}

#[tokio::test]
async fn subscribe_succeeds_even_if_the_welcome_email_fails() {
    let mut test_app = TestApp::spawn_app().await;
    test_app.reject_emails().await;

    let response = test_app
        .post_json(
            "/subscribers",
            &json!({ "name": "Frank", "email": "frank@test.com" }),
            None,
        )
        .await;

    assert_eq!(200, response.status().as_u16());
    let failed = test_app.next_dead_letter().await;
    assert_eq!(failed.recipient, "frank@test.com");
    assert_eq!(failed.subject, "Thank you for subscribing to amahirwe!");
}

#[tokio::test]
async fn list_subscribers_is_admin_only() {
    let test_app = TestApp::spawn_app().await;
    test_app
        .subscribers
        .seed("Frank", "frank@test.com", Utc::now());

    for token in [CREATOR_TOKEN, VISITOR_TOKEN] {
        let response = test_app.get("/subscribers", Some(token)).await;
        assert_eq!(403, response.status().as_u16());
    }
    assert_eq!(test_app.subscribers.calls(), 0);

    let response = test_app.get("/subscribers", None).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn list_subscribers_returns_newest_first() {
    let test_app = TestApp::spawn_app().await;
    let now = Utc::now();
    test_app
        .subscribers
        .seed("Older", "older@test.com", now - Duration::days(1));
    test_app.subscribers.seed("Newer", "newer@test.com", now);

    let response = test_app.get("/subscribers", Some(ADMIN_TOKEN)).await;

    assert_eq!(200, response.status().as_u16());
    let subscribers: Vec<Value> = response.json().await.unwrap();
    let emails: Vec<&str> = subscribers
        .iter()
        .map(|subscriber| subscriber["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec!["newer@test.com", "older@test.com"]);
}

#[tokio::test]
async fn list_subscribers_reports_a_storage_failure_like_an_empty_list() {
    let test_app = TestApp::spawn_app().await;
    test_app.subscribers.fail_reads.store(true, Ordering::SeqCst);

    let response = test_app.get("/subscribers", Some(ADMIN_TOKEN)).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "msg": "connection reset" }));
}

#[tokio::test]
async fn empty_subscriber_list_returns_400_by_default() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.get("/subscribers", Some(ADMIN_TOKEN)).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "msg": "No subscribers found" }));
}

#[tokio::test]
async fn empty_subscriber_list_returns_an_empty_array_when_legacy_error_is_off() {
    let test_app = TestApp::spawn_app_with(HandlerOptions {
        legacy_empty_list_error: false,
        reply_to_stored_address: false,
    })
    .await;

    let response = test_app.get("/subscribers", Some(ADMIN_TOKEN)).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn get_subscriber_returns_the_stored_record() {
    let test_app = TestApp::spawn_app().await;
    let subscriber = test_app
        .subscribers
        .seed("Frank", "frank@test.com", Utc::now());

    let response = test_app
        .get(&format!("/subscribers/{}", subscriber.id), Some(ADMIN_TOKEN))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["_id"], subscriber.id.to_string());
    assert_eq!(body["email"], "frank@test.com");
}

#[tokio::test]
async fn get_subscriber_always_answers_for_unknown_or_malformed_ids() {
    let test_app = TestApp::spawn_app().await;

    for id in [uuid::Uuid::new_v4().to_string(), "not-an-id".to_string()] {
        let response = test_app
            .get(&format!("/subscribers/{}", id), Some(ADMIN_TOKEN))
            .await;

        assert_eq!(400, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["msg"].as_str().unwrap().starts_with("Failed to retrieve!"));
    }
}

#[tokio::test]
async fn unsubscribe_requires_a_session() {
    let test_app = TestApp::spawn_app().await;
    test_app
        .subscribers
        .seed("Frank", "frank@test.com", Utc::now());

    let response = test_app.delete("/subscribers/frank@test.com", None).await;

    assert_eq!(401, response.status().as_u16());
    assert_eq!(test_app.subscribers.all().len(), 1);
}

#[tokio::test]
async fn unsubscribe_removes_only_that_email() {
    let test_app = TestApp::spawn_app().await;
    test_app
        .subscribers
        .seed("Frank", "frank@test.com", Utc::now());
    test_app
        .subscribers
        .seed("Aline", "aline@test.com", Utc::now());

    let response = test_app
        .delete("/subscribers/frank@test.com", Some(VISITOR_TOKEN))
        .await;

    assert_eq!(200, response.status().as_u16());
    let remaining = test_app.subscribers.all();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].email.as_ref(), "aline@test.com");
}

#[tokio::test]
async fn unsubscribing_an_unknown_email_returns_400() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .delete("/subscribers/nobody@test.com", Some(VISITOR_TOKEN))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": false, "msg": "subscriber is not found!" })
    );
}
