mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{authed, json_request, token_for, TestApp};
use nutri_api::database::models::Role;

#[tokio::test]
async fn sort_requires_a_known_order() -> Result<()> {
    let app = TestApp::offline();

    for uri in ["/recipes/sort", "/articles/sort", "/nutritionists/sort"] {
        let (status, body) = app.get(uri).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["message"], "O parâmetro 'order' é obrigatório.");
    }

    for uri in [
        "/recipes/sort?order=random",
        "/articles/sort?order=bestRated",
        "/nutritionists/sort?order=recent",
    ] {
        let (status, body) = app.get(uri).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["message"], "Critério de ordenação inválido.");
    }
    Ok(())
}

#[tokio::test]
async fn filters_are_validated_before_querying() -> Result<()> {
    let app = TestApp::offline();

    let (status, _) = app.get("/recipes/filter?filters=%7Bnot-json").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // {"categoria":["brunch"]}
    let (status, _) = app
        .get("/recipes/filter?filters=%7B%22categoria%22%3A%5B%22brunch%22%5D%7D")
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // {"publicadoPor":["robos"]}
    let (status, _) = app
        .get("/recipes/filter?filters=%7B%22publicadoPor%22%3A%5B%22robos%22%5D%7D")
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn invalid_paging_is_rejected() -> Result<()> {
    let app = TestApp::offline();

    let (status, _) = app.get("/recipes/list?limit=0").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/articles/list?offset=-1").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn rating_outside_range_is_rejected() -> Result<()> {
    let app = TestApp::offline();
    let token = token_for(3, Role::Member);

    for nota in [0, 6, -2] {
        let request = json_request(
            Method::POST,
            "/recipes/rate",
            Some(&token),
            json!({ "nota": nota, "idUsuario": 3, "idReceita": 1 }),
        );
        let (status, body) = app.send(request).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "O rating deve estar entre 1 e 5");
    }
    Ok(())
}

#[tokio::test]
async fn rating_requires_every_field() -> Result<()> {
    let app = TestApp::offline();
    let token = token_for(3, Role::Member);
    let request = json_request(Method::POST, "/recipes/rate", Some(&token), json!({ "nota": 4 }));

    let (status, body) = app.send(request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Todos os campos são obrigatórios!");
    Ok(())
}

#[tokio::test]
async fn registration_requires_fields_per_role() -> Result<()> {
    let app = TestApp::offline();

    let request = json_request(
        Method::POST,
        "/users/register",
        None,
        json!({ "nome": "Ana", "email": "ana@example.com" }),
    );
    let (status, body) = app.send(request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Campos de usuário estão faltando.");

    let request = json_request(
        Method::POST,
        "/users/register",
        None,
        json!({ "nome": "Ana", "email": "ana@example.com", "senha": "x", "tipo": "nutricionista", "crn": "1" }),
    );
    let (status, body) = app.send(request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Campos de nutricionista estão faltando.");

    let request = json_request(
        Method::POST,
        "/users/register",
        None,
        json!({ "nome": "Ana", "email": "ana@example.com", "senha": "x", "tipo": "admin" }),
    );
    let (status, _) = app.send(request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_requires_credentials() -> Result<()> {
    let app = TestApp::offline();
    let request = json_request(Method::POST, "/users/login", None, json!({ "email": "ana@example.com" }));

    let (status, _) = app.send(request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_json_uses_error_shape() -> Result<()> {
    let app = TestApp::offline();
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/users/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{ nope"))?;

    let (status, body) = app.send(request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn non_numeric_ids_use_error_shape() -> Result<()> {
    let app = TestApp::offline();

    for uri in ["/recipes/details/abc", "/articles/details/1.5", "/users/details/ana", "/users/x/recipes/published"] {
        let (status, body) = app.get(uri).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], true, "{}", uri);
        assert!(body["message"].is_string(), "{}", uri);
    }

    let token = token_for(3, Role::Member);
    let (status, body) = app.send(authed(Method::DELETE, "/recipes/delete/abc/3", &token)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    let token = token_for(4, Role::Nutritionist);
    let (status, body) = app.send(authed(Method::DELETE, "/articles/delete/1/quatro", &token)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    Ok(())
}
