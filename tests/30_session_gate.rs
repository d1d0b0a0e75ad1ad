mod common;

use anyhow::Result;
use reqwest::{header, Method, StatusCode};
use serde_json::{json, Value};

use opportunity_api::auth::{generate_jwt, Claims};

const SOME_USER: &str = "3d1f2a40-1b7c-4c53-9a57-0f6f7c1e2b10";
const SOME_ID: &str = "0b5e1c55-6d1a-4f6e-9b0e-2f2d0d3f0c11";

fn protected_routes() -> Vec<(Method, String, Option<Value>)> {
    let body = json!({ "id": SOME_ID, "name": "x", "value": 1.0, "status": "open", "user_id": SOME_USER });
    vec![
        (Method::GET, "/opportunities".to_string(), None),
        (Method::GET, format!("/opportunities/{}", SOME_USER), None),
        (Method::DELETE, format!("/opportunities/{}", SOME_USER), None),
        (Method::POST, format!("/opportunity/{}", SOME_USER), Some(body.clone())),
        (Method::PUT, "/opportunity".to_string(), Some(body)),
        (Method::DELETE, format!("/opportunity/{}/{}", SOME_USER, SOME_ID), None),
    ]
}

async fn assert_all_rejected(server: &common::TestServer, auth: Option<(header::HeaderName, String)>) -> Result<()> {
    for (method, path, body) in protected_routes() {
        let mut request = server.client.request(method.clone(), server.url(&path));
        if let Some((name, value)) = &auth {
            request = request.header(name.clone(), value.clone());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let res = request.send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{} {}", method, path);

        let body: Value = res.json().await?;
        assert_eq!(body["code"], "UNAUTHORIZED", "{} {}", method, path);
    }
    assert_eq!(server.store.calls(), 0, "store touched without a session");
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_session() -> Result<()> {
    let server = common::spawn_app().await?;
    assert_all_rejected(&server, None).await
}

#[tokio::test]
async fn protected_routes_reject_forged_token() -> Result<()> {
    let server = common::spawn_app().await?;
    let claims = Claims::new(SOME_USER.parse()?, "mallory".to_string(), 1);
    let forged = generate_jwt(&claims, "not-the-server-secret")?;

    assert_all_rejected(&server, Some((header::AUTHORIZATION, format!("Bearer {}", forged)))).await?;
    assert_all_rejected(&server, Some((header::COOKIE, format!("token={}", forged)))).await
}

#[tokio::test]
async fn protected_routes_reject_malformed_authorization() -> Result<()> {
    let server = common::spawn_app().await?;
    assert_all_rejected(&server, Some((header::AUTHORIZATION, "Basic YWRhOnB3".to_string()))).await
}

#[tokio::test]
async fn session_cookie_is_accepted() -> Result<()> {
    let server = common::spawn_app().await?;
    let user = common::register(&server, "ada").await?;

    let res = server
        .client
        .get(server.url("/opportunities"))
        .header(header::COOKIE, format!("userID={}; token={}", user.id, user.token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn quoted_session_cookie_is_accepted() -> Result<()> {
    let server = common::spawn_app().await?;
    let user = common::register(&server, "ada").await?;

    let res = server
        .client
        .get(server.url("/opportunities"))
        .header(header::COOKIE, format!("token=\"{}\"", user.token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn public_lookup_needs_no_session() -> Result<()> {
    let server = common::spawn_app().await?;

    let res = server.client.get(server.url(&format!("/opportunity/{}", SOME_ID))).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.store.calls(), 1);
    Ok(())
}
