mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use cafe_api::store::KeyValueStore;
use common::TestServer;

#[tokio::test]
async fn unknown_number_cannot_log_in() -> Result<()> {
    let server = TestServer::start().await?;
    let (status, body) = server
        .post("/auth/login/send", None, json!({ "mobile": "9111111111" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_REGISTERED");
    Ok(())
}

#[tokio::test]
async fn login_issues_token_for_legacy_user() -> Result<()> {
    let server = TestServer::start().await?;
    // Written by the older web client: bare national number, no phoneNumber
    server
        .store
        .set(
            "users/legacy-1",
            json!({ "name": "Ravi", "surname": "K", "mobile": "9222222222", "lastLogin": 1 }),
        )
        .await?;

    let (status, sent) = server
        .post("/auth/login/send", None, json!({ "mobile": "+919222222222" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let session = sent["data"]["session_id"].as_str().unwrap().to_string();
    let code = server.last_code().await.unwrap();

    let (status, body) = server
        .post("/auth/login/verify", Some(&session), json!({ "otp": code }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["user_id"], "legacy-1");
    assert_eq!(body["data"]["user"]["name"], "Ravi");

    let last_login = server.store.get("users/legacy-1/lastLogin").await?.unwrap();
    assert!(last_login.as_i64().unwrap() > 1);
    Ok(())
}

#[tokio::test]
async fn registration_code_does_not_log_in() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, sent) = server
        .post("/auth/register/send", None, json!({ "mobile": "9000000010" }))
        .await?;
    let session = sent["data"]["session_id"].as_str().unwrap().to_string();
    let code = server.last_code().await.unwrap();

    let (status, body) = server
        .post("/auth/login/verify", Some(&session), json!({ "otp": code }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NO_PENDING_AUTH");
    Ok(())
}

#[tokio::test]
async fn whoami_and_profile_use_the_token() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.register("9000000011", "Meera").await?;

    let whoami: Value = server
        .client
        .get(server.url("/api/auth/whoami"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(whoami["data"]["phone"], "+919000000011");
    assert_eq!(whoami["data"]["profile"]["name"], "Meera");

    let res = server
        .client
        .put(server.url("/api/profile"))
        .bearer_auth(&token)
        .json(&json!({ "surname": "Iyer" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let profile: Value = server
        .client
        .get(server.url("/api/profile"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(profile["data"]["name"], "Meera");
    assert_eq!(profile["data"]["surname"], "Iyer");
    assert_eq!(profile["data"]["phoneNumber"], "+919000000011");
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server.client.get(server.url("/api/profile")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");

    let res = server
        .client
        .get(server.url("/api/auth/whoami"))
        .bearer_auth("not-a-jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
