mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;

use common::{authed, expired_token_for, json_request, token_for, TestApp};
use nutri_api::database::models::Role;

const NUTRITIONIST_ONLY: &str =
    "Acesso negado! Apenas nutricionistas têm permissão para realizar esta ação.";

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::offline();
    let (status, body) = app.get("/health").await?;

    // OK or SERVICE_UNAVAILABLE are both a valid liveness answer
    assert!(
        status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        status
    );
    assert!(body["status"].is_string());
    Ok(())
}

#[tokio::test]
async fn root_describes_service() -> Result<()> {
    let app = TestApp::offline();
    let (status, body) = app.get("/").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Nutri API");
    Ok(())
}

#[tokio::test]
async fn missing_authorization_header_is_rejected() -> Result<()> {
    let app = TestApp::offline();
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/recipes/delete/1/1")
        .body(Body::empty())?;

    let (status, body) = app.send(request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Acesso negado. Token não fornecido.");
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn scheme_without_token_is_rejected() -> Result<()> {
    let app = TestApp::offline();
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/recipes/delete/1/1")
        .header(header::AUTHORIZATION, "Bearer")
        .body(Body::empty())?;

    let (status, body) = app.send(request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Acesso negado. Token inválido.");
    Ok(())
}

#[tokio::test]
async fn malformed_token_is_invalid() -> Result<()> {
    let app = TestApp::offline();
    let (status, body) = app.send(authed(Method::DELETE, "/recipes/delete/1/1", "not.a.jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token inválido.");
    Ok(())
}

#[tokio::test]
async fn token_signed_with_other_secret_is_invalid() -> Result<()> {
    let app = TestApp::offline();
    let claims = nutri_api::auth::Claims::new(1, Role::Member, "X".into(), None, 3600);
    let forged = nutri_api::auth::generate_jwt(&claims, "some-other-secret")?;

    let (status, body) = app.send(authed(Method::DELETE, "/recipes/delete/1/1", &forged)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token inválido.");
    Ok(())
}

#[tokio::test]
async fn expired_token_has_its_own_message() -> Result<()> {
    let app = TestApp::offline();
    let token = expired_token_for(1, Role::Member);
    let (status, body) = app.send(authed(Method::DELETE, "/recipes/delete/1/1", &token)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expirado.");
    Ok(())
}

#[tokio::test]
async fn members_cannot_use_nutritionist_routes() -> Result<()> {
    let app = TestApp::offline();
    let token = token_for(3, Role::Member);

    let (status, body) = app.send(authed(Method::DELETE, "/articles/delete/1/3", &token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], NUTRITIONIST_ONLY);

    let (status, body) = app
        .send(authed(Method::PUT, "/users/update-nutritionist/3/3", &token))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], NUTRITIONIST_ONLY);
    Ok(())
}

#[tokio::test]
async fn acting_for_another_user_is_forbidden() -> Result<()> {
    let app = TestApp::offline();
    let token = token_for(3, Role::Member);

    let (status, _) = app.send(authed(Method::DELETE, "/recipes/delete/1/4", &token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let nutritionist = token_for(5, Role::Nutritionist);
    let (status, _) = app.send(authed(Method::DELETE, "/articles/delete/1/6", &nutritionist)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = json_request(
        Method::POST,
        "/recipes/rate",
        Some(&token),
        json!({ "nota": 4, "idUsuario": 99, "idReceita": 1 }),
    );
    let (status, _) = app.send(request).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
