//! Tests whether the 'health-check' route returns an appropriate status code

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn healthcheck_ok() -> Result<()> {
    let TestApp {
        addr, http_client, ..
    } = TestApp::spawn().await?;

    let res = http_client
        .get(format!("http://{addr}/health-check"))
        .send()
        .await?;

    assert!(res.status() == StatusCode::OK, "Healthcheck FAILED!");

    Ok(())
}

#[tokio::test]
async fn invalid_path_404() -> Result<()> {
    let TestApp {
        addr, http_client, ..
    } = TestApp::spawn().await?;

    let res = http_client
        .get(format!("http://{addr}/invalidpath"))
        .send()
        .await?;

    assert!(
        res.status() == StatusCode::NOT_FOUND,
        "Invalid Path check FAILED!, expected: {}, got: {}",
        404,
        res.status().as_u16()
    );

    Ok(())
}

#[tokio::test]
async fn responses_carry_a_request_id() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.get_signups(None).await?;

    assert!(res.headers().contains_key("x-request-id"));

    Ok(())
}

#[tokio::test]
async fn error_responses_carry_a_request_id() -> Result<()> {
    let app = TestApp::spawn().await?;

    let unauthorized = app.get_signups(Some("wrong-secret")).await?;
    let bad_request = app.post_signup(&json!({ "email": "" })).await?;
    let not_allowed = app.request(Method::DELETE).await?;

    for (description, res) in [
        ("401", unauthorized),
        ("400", bad_request),
        ("405", not_allowed),
    ] {
        assert!(
            res.headers().contains_key("x-request-id"),
            "no request id on {description}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn error_responses_keep_the_client_request_id() -> Result<()> {
    let app = TestApp::spawn().await?;
    let request_id = "5b0c2f1e-8f7a-4a44-9d57-2d3c1f1b9e10";

    let res = app
        .http_client
        .get(app.waitlist_url())
        .header("x-request-id", request_id)
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok()),
        Some(request_id)
    );

    Ok(())
}
