mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{TestServer, PASSWORD};

#[tokio::test]
async fn health_reports_store_status() -> Result<()> {
    let server = TestServer::start().await?;

    let res = reqwest::get(server.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["isSuccess"], true);
    assert_eq!(body["result"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> Result<()> {
    let server = TestServer::start().await?;
    let res = reqwest::get(server.url("/api/v3/VillaAPI")).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn register_then_login_then_whoami() -> Result<()> {
    let server = TestServer::start_with_default_role("customer").await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/v1/UsersAuth/register"))
        .json(&json!({ "userName": "ada", "name": "Ada Lovelace", "password": PASSWORD, "role": "admin" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["result"]["userName"], "ada");
    assert_eq!(body["result"]["role"], "customer");
    assert!(body["result"].get("password").is_none());

    let res = client
        .post(server.url("/api/v1/UsersAuth/login"))
        .json(&json!({ "userName": "ADA", "password": PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let token = body["result"]["token"].as_str().unwrap().to_string();
    assert_eq!(body["result"]["user"]["name"], "Ada Lovelace");

    let res = client
        .get(server.url("/api/v1/UsersAuth/whoami"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["result"]["name"], "ada");
    assert_eq!(body["result"]["role"], "customer");
    Ok(())
}

#[tokio::test]
async fn login_failures_are_bad_requests() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();
    server.token_for("bob").await?;

    let res = client
        .post(server.url("/api/v1/UsersAuth/login"))
        .json(&json!({ "userName": "bob", "password": "wrong" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["isSuccess"], false);
    assert_eq!(body["errorMessages"][0], "Username or password is incorrect");
    assert!(body["result"].is_null());

    let res = client
        .post(server.url("/api/v1/UsersAuth/register"))
        .json(&json!({ "userName": "bob", "name": "Bob", "password": PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn whoami_rejects_missing_and_forged_tokens() -> Result<()> {
    let server = TestServer::start().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/api/v1/UsersAuth/whoami")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(server.url("/api/v1/UsersAuth/whoami"))
        .bearer_auth("eyJhbGciOiJIUzI1NiJ9.e30.forged")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["statusCode"], 401);
    Ok(())
}
