use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};
use waitlist::store::{NewSignup, SignupStore};

use crate::helpers::{json_body, spawn_server, TestApp, UnreachableStore, TEST_LIST_SECRET};

async fn seed_signups(app: &TestApp, count: usize) -> Result<()> {
    for i in 0..count {
        app.store
            .upsert_signup(NewSignup {
                email: format!("user{i}@example.com"),
                source: "landing-page".to_string(),
                ip_address: "unknown".to_string(),
                user_agent: "unknown".to_string(),
            })
            .await?;
    }
    Ok(())
}

#[tokio::test]
async fn api_list_without_valid_secret_is_unauthorized() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_signups(&app, 3).await?;

    let cases = [
        (None, "Missing secret"),
        (Some(""), "Empty secret"),
        (Some("wrong-secret"), "Wrong secret"),
        (Some("TEST-LIST-SECRET"), "Different case"),
    ];

    for (secret, description) in cases {
        let res = app.get_signups(secret).await?;

        assert_eq!(
            res.status(),
            StatusCode::UNAUTHORIZED,
            "Expected 401 for: {description}"
        );
        assert_eq!(json_body(res).await?, json!({ "error": "Unauthorized" }));
    }

    Ok(())
}

#[tokio::test]
async fn api_list_empty_waitlist() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.get_signups(Some(TEST_LIST_SECRET)).await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        json_body(res).await?,
        json!({ "total": 0, "signups": [] })
    );

    Ok(())
}

#[tokio::test]
async fn api_list_returns_signups_after_posting() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.post_signup(&json!({ "email": "first@example.com", "source": "blog" }))
        .await?;
    app.post_signup(&json!({ "email": "second@example.com" }))
        .await?;
    app.post_signup(&json!({ "email": "FIRST@example.com" }))
        .await?;

    let body = json_body(app.get_signups(Some(TEST_LIST_SECRET)).await?).await?;

    assert_eq!(body["total"], json!(2));
    let signups = body["signups"].as_array().expect("signups array");
    assert_eq!(signups[0]["email"], json!("second@example.com"));
    assert_eq!(signups[0]["source"], json!("landing-page"));
    assert_eq!(signups[0]["signup_count"], json!(1));
    assert_eq!(signups[1]["email"], json!("first@example.com"));
    assert_eq!(signups[1]["source"], json!("blog"));
    assert_eq!(signups[1]["signup_count"], json!(2));

    let mut keys = signups[0]
        .as_object()
        .expect("signup object")
        .keys()
        .cloned()
        .collect::<Vec<_>>();
    keys.sort();
    assert_eq!(
        keys,
        ["created_at", "email", "id", "signup_count", "source"]
    );

    Ok(())
}

#[tokio::test]
async fn api_list_is_capped_at_100_newest_first() -> Result<()> {
    let app = TestApp::spawn().await?;
    seed_signups(&app, 105).await?;

    let res = app.get_signups(Some(TEST_LIST_SECRET)).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await?;
    let signups = body["signups"].as_array().expect("signups array");

    assert_eq!(signups.len(), 100);
    assert_eq!(body["total"], json!(signups.len()));
    assert_eq!(signups[0]["email"], json!("user104@example.com"));
    assert_eq!(signups[99]["email"], json!("user5@example.com"));

    let created_at = signups
        .iter()
        .map(|s| parse_timestamp(&s["created_at"]))
        .collect::<Result<Vec<_>>>()?;
    assert!(
        created_at.windows(2).all(|pair| pair[0] >= pair[1]),
        "signups are not ordered by created_at descending"
    );

    Ok(())
}

#[tokio::test]
async fn api_list_store_failure_returns_a_500() -> Result<()> {
    let addr = spawn_server(Arc::new(UnreachableStore)).await?;

    let res = reqwest::Client::new()
        .get(format!("http://{addr}/api/waitlist"))
        .query(&[("secret", TEST_LIST_SECRET)])
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(res).await?,
        json!({ "error": "Internal server error" })
    );

    Ok(())
}

fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>> {
    let raw = value
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("created_at is not a string: {value}"))?;
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
